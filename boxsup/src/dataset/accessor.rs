//! BoxSup 数据集访问器.
//!
//! 构造顺序固定为: 检查目录结构 -> 加载类别表 -> 建立配对索引.
//! 任一步失败都不会产生数据集实例. 构造成功后, 每次 [`BoxSupDataset::get`]
//! 都从磁盘重新解码, 先把单通道数组复制为三通道, 再依次执行图像变换、
//! 标签变换和样本变换.

use super::iter::SampleIter;
use super::{DatasetIndex, LabelKind, SampleRef};
use crate::catalog::{classfile_path, CatalogOptions, LabelCatalog};
use crate::consts::{IMAGES_DIR, LABELS_DIR};
use crate::data::decode::{decode_image, decode_label};
use crate::error::{Error, Result};
use crate::transform::{SampleTransform, Transform, TransformError};
use crate::{PixelArray, Sample};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 数据集配置.
#[derive(Clone)]
pub struct DatasetConfig {
    label_kind: LabelKind,
    validate_names: bool,
    image_transform: Option<Arc<dyn Transform>>,
    label_transform: Option<Arc<dyn Transform>>,
    sample_transform: Option<Arc<dyn SampleTransform>>,
    catalog: CatalogOptions,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            label_kind: LabelKind::default(),
            validate_names: true,
            image_transform: None,
            label_transform: None,
            sample_transform: None,
            catalog: CatalogOptions::default(),
        }
    }
}

impl DatasetConfig {
    /// 标签种类.
    #[inline]
    pub fn label_kind(&self) -> LabelKind {
        self.label_kind
    }

    /// 是否按文件名校验配对.
    #[inline]
    pub fn validate_names(&self) -> bool {
        self.validate_names
    }

    /// 类别表读取选项.
    #[inline]
    pub fn catalog_options(&self) -> &CatalogOptions {
        &self.catalog
    }

    /// 图像变换.
    #[inline]
    pub fn image_transform(&self) -> Option<&dyn Transform> {
        self.image_transform.as_deref()
    }

    /// 标签变换.
    #[inline]
    pub fn label_transform(&self) -> Option<&dyn Transform> {
        self.label_transform.as_deref()
    }

    /// 样本变换.
    #[inline]
    pub fn sample_transform(&self) -> Option<&dyn SampleTransform> {
        self.sample_transform.as_deref()
    }
}

impl fmt::Debug for DatasetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetConfig")
            .field("label_kind", &self.label_kind)
            .field("validate_names", &self.validate_names)
            .field("image_transform", &self.image_transform.as_ref().map(|t| t.name()))
            .field("label_transform", &self.label_transform.as_ref().map(|t| t.name()))
            .field("sample_transform", &self.sample_transform.as_ref().map(|t| t.name()))
            .field("catalog", &self.catalog)
            .finish()
    }
}

/// 尚未建立索引的数据集.
///
/// ```no_run
/// use boxsup::transform::ToFloat;
/// use boxsup::{DatasetBuilder, LabelKind};
///
/// let dataset = DatasetBuilder::new("/data/boxsup", "classes_bxsp.txt")
///     .label_kind(LabelKind::Mask)
///     .image_transform(ToFloat)
///     .build()?;
/// let sample = dataset.get(0)?;
/// # Ok::<(), boxsup::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    root: PathBuf,
    classfile: String,
    config: DatasetConfig,
}

impl DatasetBuilder {
    /// 初始化. `classfile` 是 `Labels` 目录下的类别表文件名.
    pub fn new<P: AsRef<Path>, S: Into<String>>(root: P, classfile: S) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            classfile: classfile.into(),
            config: DatasetConfig::default(),
        }
    }

    /// 设置标签种类. 默认为 [`LabelKind::Mask`].
    #[inline]
    pub fn label_kind(mut self, kind: LabelKind) -> Self {
        self.config.label_kind = kind;
        self
    }

    /// 是否按文件名校验配对. 默认为真.
    #[inline]
    pub fn validate_names(mut self, validate: bool) -> Self {
        self.config.validate_names = validate;
        self
    }

    /// 设置图像变换.
    #[inline]
    pub fn image_transform<T: Transform + 'static>(mut self, t: T) -> Self {
        self.config.image_transform = Some(Arc::new(t));
        self
    }

    /// 设置标签变换.
    #[inline]
    pub fn label_transform<T: Transform + 'static>(mut self, t: T) -> Self {
        self.config.label_transform = Some(Arc::new(t));
        self
    }

    /// 设置样本变换, 它在图像变换和标签变换之后执行.
    #[inline]
    pub fn sample_transform<T: SampleTransform + 'static>(mut self, t: T) -> Self {
        self.config.sample_transform = Some(Arc::new(t));
        self
    }

    /// 设置类别表读取选项.
    #[inline]
    pub fn catalog_options(mut self, options: CatalogOptions) -> Self {
        self.config.catalog = options;
        self
    }

    /// 整体替换配置.
    #[inline]
    pub fn config(mut self, config: DatasetConfig) -> Self {
        self.config = config;
        self
    }

    /// 建立索引, 得到可访问的数据集.
    #[inline]
    pub fn build(self) -> Result<BoxSupDataset> {
        BoxSupDataset::open(self.root, self.classfile, self.config)
    }
}

/// 已建立索引的 BoxSup 数据集. 长度在构造后固定.
///
/// 访问只需要 `&self`, 不修改任何内部状态, 因此可以在线程间共享.
#[derive(Clone)]
pub struct BoxSupDataset {
    root: PathBuf,
    images_dir: PathBuf,
    labels_dir: PathBuf,
    classfile: String,
    config: DatasetConfig,
    catalog: LabelCatalog,
    index: DatasetIndex,
}

/// 检查 `root` 下是否有 `name` 子目录.
fn require_dir(root: &Path, name: &'static str) -> Result<PathBuf> {
    let dir = root.join(name);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(Error::Layout {
            root: root.to_path_buf(),
            missing: name,
        })
    }
}

#[inline]
fn transform_error(path: &Path) -> impl FnOnce(TransformError) -> Error + '_ {
    move |source| Error::Transform {
        path: path.to_path_buf(),
        source,
    }
}

#[inline]
fn apply_opt(t: Option<&dyn Transform>, p: PixelArray, path: &Path) -> Result<PixelArray> {
    match t {
        Some(t) => t.apply(&p).map_err(transform_error(path)),
        None => Ok(p),
    }
}

impl BoxSupDataset {
    /// 打开 `root` 处的数据集.
    ///
    /// # 注意
    ///
    /// 1. `root` 下缺少 `Images` 或 `Labels` 时返回 [`Error::Layout`],
    ///   此时不会扫描任何目录.
    /// 2. 类别表 `{root}/Labels/{classfile}` 的错误见 [`LabelCatalog::load_with`].
    /// 3. 配对错误见 [`DatasetIndex::build`].
    pub fn open<P: AsRef<Path>, S: Into<String>>(
        root: P,
        classfile: S,
        config: DatasetConfig,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let classfile = classfile.into();

        let images_dir = require_dir(&root, IMAGES_DIR)?;
        let labels_dir = require_dir(&root, LABELS_DIR)?;

        let catalog =
            LabelCatalog::load_with(classfile_path(&labels_dir, &classfile), &config.catalog)?;
        let index = DatasetIndex::build(
            &images_dir,
            &labels_dir,
            config.label_kind,
            config.validate_names,
        )?;

        log::info!(
            "dataset at {} ready: {} samples, {} classes",
            root.display(),
            index.len(),
            catalog.len()
        );
        Ok(Self {
            root,
            images_dir,
            labels_dir,
            classfile,
            config,
            catalog,
            index,
        })
    }

    /// 按当前配置重新扫描目录, 返回新的数据集. `self` 不受影响.
    #[inline]
    pub fn reindexed(&self) -> Result<Self> {
        Self::open(&self.root, self.classfile.as_str(), self.config.clone())
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// 是否为空. 成功构造的数据集总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// 第 `index` 个样本的文件路径. 不读取文件.
    pub fn sample_ref(&self, index: usize) -> Result<&SampleRef> {
        self.index.get(index).ok_or_else(|| Error::IndexOutOfRange {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            len: self.len(),
        })
    }

    /// 读取第 `index` 个样本.
    ///
    /// 单通道图像和标签会先被复制为三通道, 之后才执行变换.
    pub fn get(&self, index: usize) -> Result<Sample> {
        let r = self.sample_ref(index)?;
        log::trace!("loading sample {index} from {}", r.image().display());

        let image = decode_image(r.image())
            .map_err(|source| Error::Decode {
                path: r.image().to_path_buf(),
                source,
            })?
            .broadcast_gray();
        let label = decode_label(r.label(), self.config.label_kind)
            .map_err(|source| Error::Decode {
                path: r.label().to_path_buf(),
                source,
            })?
            .broadcast_gray();

        let image = apply_opt(self.config.image_transform(), image, r.image())?;
        let label = apply_opt(self.config.label_transform(), label, r.label())?;
        let sample = Sample::new(image, label);

        match self.config.sample_transform() {
            Some(t) => t.apply(&sample).map_err(transform_error(r.image())),
            None => Ok(sample),
        }
    }

    /// 同 `get()`, 但接受有符号索引. 负数索引总是越界.
    pub fn get_signed(&self, index: isize) -> Result<Sample> {
        match usize::try_from(index) {
            Ok(i) => self.get(i),
            Err(_) => Err(Error::IndexOutOfRange {
                index: index as i64,
                len: self.len(),
            }),
        }
    }

    /// 按规范顺序逐个读取所有样本.
    #[inline]
    pub fn iter(&self) -> SampleIter<'_> {
        SampleIter::new(self)
    }

    /// 配对索引.
    #[inline]
    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }

    /// 类别表.
    #[inline]
    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// 数据集根目录.
    #[inline]
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// 图像目录.
    #[inline]
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// 标签目录.
    #[inline]
    pub fn labels_dir(&self) -> &Path {
        &self.labels_dir
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        impl BoxSupDataset {
            /// 在 rayon 线程池上并行读取所有样本. 每个样本仍是一次独立的 `get()`,
            /// 不做预取.
            pub fn par_iter(&self) -> impl IndexedParallelIterator<Item = (usize, Result<Sample>)> + '_ {
                (0..self.len()).into_par_iter().map(move |i| (i, self.get(i)))
            }
        }
    }
}

impl fmt::Debug for BoxSupDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxSupDataset")
            .field("root", &self.root)
            .field("classfile", &self.classfile)
            .field("len", &self.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for BoxSupDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BoxSup dataset at {}", self.root.display())?;
        writeln!(f, "  samples: {}", self.len())?;
        writeln!(f, "  labels: {:?} (*.{})", self.config.label_kind, self.config.label_kind.extension())?;
        write!(f, "  classes: {}", self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::{BoxSupDataset, DatasetBuilder, DatasetConfig};
    use crate::testing::{self, image_dataset, init_logger, mask_dataset, CLASSFILE};
    use crate::transform::{FnTransform, OnImage, SampleCompose, ToFloat, TransformError};
    use crate::{Error, LabelKind, PixelArray, Sample};
    use ndarray::{Array3, Axis};
    use std::collections::HashSet;
    use std::fs;

    fn all_equal(p: &PixelArray, v: u8) -> bool {
        match p {
            PixelArray::U8(a) => a.iter().all(|&x| x == v),
            _ => false,
        }
    }

    fn channels_equal(p: &PixelArray) -> bool {
        let a = p.to_f32();
        let first = a.index_axis(Axis(2), 0);
        a.axis_iter(Axis(2)).all(|c| c == first)
    }

    #[test]
    fn test_dataset_is_send_sync() {
        fn check<T: Send + Sync>() {}
        check::<BoxSupDataset>();
        check::<DatasetConfig>();
    }

    /// 4 张图像 + 4 个掩码: 长度为 4, 标签来自 `mask_data` 并转换为 `u8`.
    #[test]
    fn test_four_masks() {
        init_logger();
        let root = mask_dataset(4);
        let ds = DatasetBuilder::new(root.path(), CLASSFILE).build().unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.catalog().len(), 3);

        let mut seen = HashSet::new();
        for i in 0..ds.len() {
            let s = ds.get(i).unwrap();
            assert_eq!(s.image.shape(), (4, 6, 3));
            assert_eq!(s.label.shape(), (4, 6, 3));
            assert!(all_equal(&s.label, i as u8));

            let PixelArray::U8(image) = &s.image else {
                panic!("image dtype changed")
            };
            assert_eq!(image[(0, 0, 0)], (i * 10) as u8);
            seen.insert(format!("{s:?}"));
        }
        assert_eq!(seen.len(), 4);
    }

    /// 每次访问都得到三通道数组, 且各通道相同.
    #[test]
    fn test_gray_broadcast_on_every_get() {
        let root = image_dataset(2);
        let ds = DatasetBuilder::new(root.path(), CLASSFILE)
            .label_kind(LabelKind::Image)
            .build()
            .unwrap();

        for _ in 0..2 {
            let s = ds.get(1).unwrap();
            assert_eq!(s.image.shape(), (2, 3, 3));
            assert_eq!(s.label.shape(), (2, 3, 3));
            assert!(channels_equal(&s.label));
            assert!(!channels_equal(&s.image));
        }
    }

    /// 缺少 `Labels` 时直接失败, 不会扫描 `Images`.
    #[test]
    fn test_missing_labels_dir() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Images")).unwrap();

        let err = DatasetBuilder::new(root.path(), CLASSFILE).build().unwrap_err();
        assert!(matches!(err, Error::Layout { missing: "Labels", .. }), "{err}");

        let empty = tempfile::tempdir().unwrap();
        let err = DatasetBuilder::new(empty.path(), CLASSFILE).build().unwrap_err();
        assert!(matches!(err, Error::Layout { missing: "Images", .. }), "{err}");
    }

    #[test]
    fn test_missing_classfile() {
        let root = mask_dataset(1);
        let err = DatasetBuilder::new(root.path(), "nope.txt").build().unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "{err}");
    }

    #[test]
    fn test_mismatched_mask() {
        let root = mask_dataset(2);
        let labels = root.path().join("Labels");
        fs::rename(labels.join("img_001_label.mat"), labels.join("img_007_label.mat")).unwrap();

        let err = DatasetBuilder::new(root.path(), CLASSFILE).build().unwrap_err();
        assert!(matches!(err, Error::PairingMismatch { .. }), "{err}");
    }

    #[test]
    fn test_index_out_of_range() {
        let root = mask_dataset(2);
        let ds = DatasetBuilder::new(root.path(), CLASSFILE).build().unwrap();

        let err = ds.get(ds.len()).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 2, len: 2 }), "{err}");
        let err = ds.get_signed(-1).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: -1, len: 2 }), "{err}");
        assert!(ds.get_signed(1).is_ok());
    }

    #[test]
    fn test_transform_order() {
        let root = mask_dataset(1);
        let set_label = FnTransform::new("set_label", |p: &PixelArray| {
            let (h, w, c) = p.shape();
            Ok(PixelArray::U8(Array3::from_elem((h, w, c), 9)))
        });
        // 样本变换执行时, 图像变换必须已经完成.
        let check_float = FnTransform::new("check_float", |p: &PixelArray| match p {
            PixelArray::F32(_) => Ok(p.clone()),
            _ => Err(TransformError::Failed {
                name: "check_float".into(),
                reason: "image is not float".into(),
            }),
        });

        let ds = DatasetBuilder::new(root.path(), CLASSFILE)
            .image_transform(ToFloat)
            .label_transform(set_label)
            .sample_transform(SampleCompose::default().then(OnImage(check_float)))
            .build()
            .unwrap();

        let Sample { image, label } = ds.get(0).unwrap();
        assert_eq!(image.dtype(), "f32");
        assert_eq!(image.shape(), (4, 6, 3));
        assert!(all_equal(&label, 9));
    }

    #[test]
    fn test_errors_carry_path() {
        let root = image_dataset(2);
        let broken = root.path().join("Images").join("img_001.png");
        fs::write(&broken, b"not a png").unwrap();

        let ds = DatasetBuilder::new(root.path(), CLASSFILE)
            .label_kind(LabelKind::Image)
            .build()
            .unwrap();
        assert!(ds.get(0).is_ok());
        match ds.get(1).unwrap_err() {
            Error::Decode { path, .. } => assert_eq!(path, broken),
            other => panic!("unexpected error: {other}"),
        }

        let fail = FnTransform::new("fail", |_: &PixelArray| {
            Err(TransformError::Failed {
                name: "fail".into(),
                reason: "always".into(),
            })
        });
        let ds = DatasetBuilder::new(root.path(), CLASSFILE)
            .label_kind(LabelKind::Image)
            .label_transform(fail)
            .build()
            .unwrap();
        match ds.get(0).unwrap_err() {
            Error::Transform { path, .. } => assert!(path.ends_with("Labels/img_000.png")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_iter_and_reindex() {
        let root = mask_dataset(3);
        let ds = DatasetBuilder::new(root.path(), CLASSFILE).build().unwrap();

        let it = ds.iter();
        assert_eq!(it.len(), 3);
        let order: Vec<usize> = it.map(|(i, s)| {
            assert!(s.is_ok());
            i
        }).collect();
        assert_eq!(order, vec![0, 1, 2]);

        testing::write_gray_png(&root.path().join("Images/img_003.png"), 6, 4, 0);
        testing::write_mat(
            &root.path().join("Labels/img_003_label.mat"),
            "mask_data",
            &[4, 6],
            testing::MatValues::UInt8(vec![3; 24]),
        );
        assert_eq!(ds.len(), 3);
        let fresh = ds.reindexed().unwrap();
        assert_eq!(fresh.len(), 4);
        assert!(all_equal(&fresh.get(3).unwrap().label, 3));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_iter_matches_get() {
        use rayon::prelude::*;

        let root = mask_dataset(4);
        let ds = DatasetBuilder::new(root.path(), CLASSFILE).build().unwrap();
        let mut results: Vec<(usize, Sample)> = ds
            .par_iter()
            .map(|(i, s)| (i, s.unwrap()))
            .collect();
        results.sort_by_key(|(i, _)| *i);

        assert_eq!(results.len(), 4);
        for (i, s) in results {
            assert_eq!(s, ds.get(i).unwrap());
        }
    }

    #[test]
    fn test_display() {
        let root = mask_dataset(2);
        let ds = DatasetBuilder::new(root.path(), CLASSFILE).build().unwrap();
        let text = ds.to_string();
        assert!(text.contains("samples: 2"), "{text}");
        assert!(text.contains("{0: background, 1: crater, 2: boulder}"), "{text}");
        assert!(format!("{ds:?}").contains("len: 2"));
    }
}
