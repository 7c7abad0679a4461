//! 单元测试共用的数据集构造工具.

use crate::consts::{IMAGES_DIR, LABELS_DIR};
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

/// 测试用类别表文件名.
pub(crate) const CLASSFILE: &str = "classes.csv";

/// 测试用类别表内容.
pub(crate) const CLASSES: &str = "id,name\n0,background\n1,crater\n2,boulder\n";

/// 初始化一次日志, 便于调试失败的用例.
pub(crate) fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init();
    });
}

/// 写入 `width * height` 灰度 png, 像素值为 `base + h * width + w` (按 `u8` 回绕).
pub(crate) fn write_gray_png(path: &Path, width: u32, height: u32, base: u8) {
    let img = GrayImage::from_fn(width, height, |w, h| {
        Luma([base.wrapping_add((h * width + w) as u8)])
    });
    img.save(path).unwrap();
}

/// 写入纯色 RGB png.
pub(crate) fn write_rgb_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .unwrap();
}

/// `.mat` 变量数据, 按列优先排列.
pub(crate) enum MatValues {
    Double(Vec<f64>),
    UInt8(Vec<u8>),
}

/// 写入只包含一个数值变量的 MAT v5 (小端, 不压缩) 文件.
pub(crate) fn write_mat(path: &Path, name: &str, dims: &[usize], values: MatValues) {
    const MI_INT8: u32 = 1;
    const MI_UINT8: u32 = 2;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_DOUBLE: u32 = 9;
    const MI_MATRIX: u32 = 14;
    const MX_DOUBLE_CLASS: u32 = 6;
    const MX_UINT8_CLASS: u32 = 9;

    fn element(ty: u32, data: &[u8]) -> Vec<u8> {
        let mut e = Vec::with_capacity(8 + data.len() + 7);
        e.extend_from_slice(&ty.to_le_bytes());
        e.extend_from_slice(&(data.len() as u32).to_le_bytes());
        e.extend_from_slice(data);
        while e.len() % 8 != 0 {
            e.push(0);
        }
        e
    }

    let (class, real) = match values {
        MatValues::Double(v) => {
            let bytes: Vec<u8> = v.iter().flat_map(|f| f.to_le_bytes()).collect();
            (MX_DOUBLE_CLASS, element(MI_DOUBLE, &bytes))
        }
        MatValues::UInt8(v) => (MX_UINT8_CLASS, element(MI_UINT8, &v)),
    };

    let flags: Vec<u8> = [class, 0].iter().flat_map(|x| x.to_le_bytes()).collect();
    let dims: Vec<u8> = dims.iter().flat_map(|&d| (d as i32).to_le_bytes()).collect();

    let mut body = Vec::new();
    body.extend(element(MI_UINT32, &flags));
    body.extend(element(MI_INT32, &dims));
    body.extend(element(MI_INT8, name.as_bytes()));
    body.extend(real);

    let mut file = b"MATLAB 5.0 MAT-file, written by boxsup tests".to_vec();
    file.resize(116, b' ');
    file.extend_from_slice(&[0; 8]);
    file.extend_from_slice(&0x0100u16.to_le_bytes());
    file.extend_from_slice(b"IM");
    file.extend_from_slice(&MI_MATRIX.to_le_bytes());
    file.extend_from_slice(&(body.len() as u32).to_le_bytes());
    file.extend(body);

    fs::write(path, file).unwrap();
}

/// 在 `root` 下创建 `Images` 和 `Labels` 目录, 并写入类别表.
pub(crate) fn make_layout(root: &Path) -> (PathBuf, PathBuf) {
    let images = root.join(IMAGES_DIR);
    let labels = root.join(LABELS_DIR);
    fs::create_dir_all(&images).unwrap();
    fs::create_dir_all(&labels).unwrap();
    fs::write(labels.join(CLASSFILE), CLASSES).unwrap();
    (images, labels)
}

/// 第 `i` 个样本的文件名主干.
#[inline]
pub(crate) fn stem(i: usize) -> String {
    format!("img_{i:03}")
}

/// 构造 `n` 对 "灰度 png 图像 + `.mat` 掩码" 数据集.
///
/// 图像 `i` 为 `6 x 4` 灰度图, 像素从 `i * 10` 起递增;
/// 掩码 `i` 为 `4 x 6` 的常数矩阵, 值为 `i + 0.5` (转换后为 `i`).
pub(crate) fn mask_dataset(n: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = make_layout(dir.path());
    for i in 0..n {
        write_gray_png(&images.join(format!("{}.png", stem(i))), 6, 4, (i * 10) as u8);
        write_mat(
            &labels.join(format!("{}_label.mat", stem(i))),
            "mask_data",
            &[4, 6],
            MatValues::Double(vec![i as f64 + 0.5; 24]),
        );
    }
    dir
}

/// 构造 `n` 对 "RGB png 图像 + 灰度 png 标签" 数据集, 标签与图像同名.
pub(crate) fn image_dataset(n: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = make_layout(dir.path());
    for i in 0..n {
        let name = format!("{}.png", stem(i));
        write_rgb_png(&images.join(&name), 3, 2, [i as u8, 100, 200]);
        write_gray_png(&labels.join(&name), 3, 2, i as u8);
    }
    dir
}
