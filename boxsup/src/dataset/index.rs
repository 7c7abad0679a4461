//! 图像/标签文件配对索引.
//!
//! 图像按文件名字典序排序, 该排序即数据集的规范样本顺序, 与文件创建顺序和
//! 文件系统遍历顺序无关. 标签按其对应的图像文件名排序, 之后两者按位次配对.

use crate::consts::{IMAGE_EXT, LABEL_SUFFIX, MASK_EXT};
use crate::error::{Error, Result};
use itertools::{EitherOrBoth, Itertools};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 标签种类, 决定标签文件的扩展名和解码方式.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LabelKind {
    /// `.mat` 文件中的数值掩码, 文件名形如 `{image_stem}_label.mat`.
    #[default]
    Mask,

    /// 普通 png 标签图像.
    Image,
}

impl LabelKind {
    /// 标签文件扩展名.
    #[inline]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mask => MASK_EXT,
            Self::Image => IMAGE_EXT,
        }
    }

    /// 由标签文件名主干恢复对应的图像文件名主干. 不符合命名约定时返回 `None`.
    ///
    /// 只有 `Mask` 有命名约定 (`{image_stem}_label`); `Image` 标签总是返回 `None`.
    pub fn image_stem_of<'a>(&self, label_stem: &'a str) -> Option<&'a str> {
        match self {
            Self::Mask => label_stem.strip_suffix(LABEL_SUFFIX),
            Self::Image => None,
        }
    }
}

/// 一对已配对的图像和标签路径.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleRef {
    image: PathBuf,
    label: PathBuf,
}

impl SampleRef {
    /// 图像路径.
    #[inline]
    pub fn image(&self) -> &Path {
        &self.image
    }

    /// 标签路径.
    #[inline]
    pub fn label(&self) -> &Path {
        &self.label
    }
}

/// 有序、构造后不可变的 [`SampleRef`] 序列.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatasetIndex {
    entries: Vec<SampleRef>,
}

/// 列出 `dir` 下扩展名严格等于 `ext` 的普通文件, 按 `(key(path), 文件名)` 排序.
fn list_sorted<K>(dir: &Path, ext: &'static str, key: K) -> Result<Vec<PathBuf>>
where
    K: Fn(&Path) -> OsString,
{
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files: Vec<(OsString, OsString, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() || path.extension().map_or(true, |e| e != ext) {
            continue;
        }
        files.push((key(&path), entry.file_name(), path));
    }

    if files.is_empty() {
        return Err(Error::EmptyDirectory {
            dir: dir.to_path_buf(),
            extension: ext,
        });
    }
    files.sort_unstable();
    Ok(files.into_iter().map(|(_, _, p)| p).collect())
}

#[inline]
fn file_name(p: &Path) -> String {
    p.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}

#[inline]
fn file_stem(p: &Path) -> String {
    p.file_stem()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
}

/// 图像排序键: 文件名.
#[inline]
fn image_key(p: &Path) -> OsString {
    p.file_name().map(OsStr::to_os_string).unwrap_or_default()
}

/// 标签排序键: 它所对应的图像文件名, 即 `{image_stem}.png`.
///
/// 不符合命名约定的标签以自身主干代替 `image_stem`, 之后由配对检查报错.
fn label_key(p: &Path, kind: LabelKind) -> OsString {
    let stem = file_stem(p);
    let mut key = OsString::from(kind.image_stem_of(&stem).unwrap_or(stem.as_str()));
    key.push(".");
    key.push(IMAGE_EXT);
    key
}

/// 检查同一位次的图像和标签是否对应.
fn check_pair(image: &Path, label: &Path, kind: LabelKind) -> Result<()> {
    let image_stem = file_stem(image);
    let label_stem = file_stem(label);
    match kind.image_stem_of(&label_stem) {
        Some(s) if s == image_stem => Ok(()),
        _ => Err(Error::PairingMismatch {
            image: file_name(image),
            label: file_name(label),
        }),
    }
}

impl DatasetIndex {
    /// 扫描 `images_dir` 和 `labels_dir`, 建立配对索引.
    ///
    /// # 注意
    ///
    /// 1. 任一目录没有匹配扩展名的文件时返回 [`Error::EmptyDirectory`].
    /// 2. `validate_names` 为真时, 一侧有多余文件则返回 [`Error::Unpaired`];
    ///   对 [`LabelKind::Mask`], 同一位次的文件名不对应则返回
    ///   [`Error::PairingMismatch`]. png 标签没有命名约定, 不做文件名检查.
    /// 3. `validate_names` 为假时只按位次配对, 个数不同则返回
    ///   [`Error::CountMismatch`].
    /// 4. 任何错误都不会产生部分索引.
    pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(
        images_dir: P,
        labels_dir: Q,
        kind: LabelKind,
        validate_names: bool,
    ) -> Result<Self> {
        let images = list_sorted(images_dir.as_ref(), IMAGE_EXT, image_key)?;
        let labels = list_sorted(labels_dir.as_ref(), kind.extension(), |p| label_key(p, kind))?;
        log::debug!(
            "found {} images in {} and {} `*.{}` labels in {}",
            images.len(),
            images_dir.as_ref().display(),
            labels.len(),
            kind.extension(),
            labels_dir.as_ref().display()
        );

        let entries = if validate_names {
            Self::pair_checked(images, labels, kind)?
        } else {
            log::warn!("pairing images and labels by position only, file names are not checked");
            Self::pair_positional(images, labels)?
        };
        Ok(Self { entries })
    }

    fn pair_checked(
        images: Vec<PathBuf>,
        labels: Vec<PathBuf>,
        kind: LabelKind,
    ) -> Result<Vec<SampleRef>> {
        images
            .into_iter()
            .zip_longest(labels)
            .map(|pair| match pair {
                EitherOrBoth::Both(image, label) => {
                    if kind == LabelKind::Mask {
                        check_pair(&image, &label, kind)?;
                    }
                    Ok(SampleRef { image, label })
                }
                EitherOrBoth::Left(path) | EitherOrBoth::Right(path) => {
                    Err(Error::Unpaired { path })
                }
            })
            .collect()
    }

    fn pair_positional(images: Vec<PathBuf>, labels: Vec<PathBuf>) -> Result<Vec<SampleRef>> {
        if images.len() != labels.len() {
            return Err(Error::CountMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        Ok(images
            .into_iter()
            .zip(labels)
            .map(|(image, label)| SampleRef { image, label })
            .collect())
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空. 成功构建的索引总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 获取第 `index` 对路径.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&SampleRef> {
        self.entries.get(index)
    }

    /// 按规范顺序迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, SampleRef> {
        self.entries.iter()
    }

    /// 以切片形式访问.
    #[inline]
    pub fn as_slice(&self) -> &[SampleRef] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a DatasetIndex {
    type Item = &'a SampleRef;
    type IntoIter = std::slice::Iter<'a, SampleRef>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
