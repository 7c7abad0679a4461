//! 图像与掩码文件的解码.
//!
//! 所有解码函数都返回通道在最后的 [`PixelArray`]. 灰度图以单通道 `(h, w, 1)`
//! 形式返回, 是否复制为三通道由调用方决定.

use crate::consts::MASK_FIELD;
use crate::dataset::LabelKind;
use crate::error::DecodeError;
use crate::PixelArray;
use image::{DynamicImage, GenericImageView};
use matfile::{MatFile, NumericData};
use ndarray::{Array3, ShapeBuilder, ShapeError};
use num::ToPrimitive;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 按行优先像素缓冲区构造 `(h, w, c)` 数组.
#[inline]
fn from_raw<T>(width: u32, height: u32, c: usize, raw: Vec<T>) -> Result<Array3<T>, ShapeError> {
    Array3::from_shape_vec((height as usize, width as usize, c), raw)
}

/// 将栅格图像解码为原生像素范围的数组.
///
/// 带 alpha 的灰度图会丢弃 alpha 通道; 浮点 RGB(A) 图像保留为 `F32`;
/// 其他少见的颜色类型统一转换为 8-bit RGB.
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<PixelArray, DecodeError> {
    let img = image::open(path.as_ref())?;
    let (w, h) = (img.width(), img.height());

    let pixels = match img {
        DynamicImage::ImageLuma8(b) => PixelArray::U8(from_raw(w, h, 1, b.into_raw())?),
        DynamicImage::ImageRgb8(b) => PixelArray::U8(from_raw(w, h, 3, b.into_raw())?),
        DynamicImage::ImageRgba8(b) => PixelArray::U8(from_raw(w, h, 4, b.into_raw())?),
        other @ DynamicImage::ImageLumaA8(_) => {
            PixelArray::U8(from_raw(w, h, 1, other.to_luma8().into_raw())?)
        }
        DynamicImage::ImageLuma16(b) => PixelArray::U16(from_raw(w, h, 1, b.into_raw())?),
        DynamicImage::ImageRgb16(b) => PixelArray::U16(from_raw(w, h, 3, b.into_raw())?),
        DynamicImage::ImageRgba16(b) => PixelArray::U16(from_raw(w, h, 4, b.into_raw())?),
        other @ DynamicImage::ImageLumaA16(_) => {
            PixelArray::U16(from_raw(w, h, 1, other.to_luma16().into_raw())?)
        }
        DynamicImage::ImageRgb32F(b) => PixelArray::F32(from_raw(w, h, 3, b.into_raw())?),
        DynamicImage::ImageRgba32F(b) => PixelArray::F32(from_raw(w, h, 4, b.into_raw())?),
        other => PixelArray::U8(from_raw(w, h, 3, other.to_rgb8().into_raw())?),
    };
    Ok(pixels)
}

/// 饱和地转换为 `u8`: 小于 0 的值为 0, 大于 255 的值为 255, 小数部分截断,
/// NaN 为 0.
#[inline]
fn saturate<T: ToPrimitive>(v: &T) -> u8 {
    v.to_f64().map_or(0, |f| f as u8)
}

macro_rules! real_to_u8 {
    ($data: expr, {$($variant: ident),+}) => {
        match $data {
            $(NumericData::$variant { real, .. } => real.iter().map(saturate).collect::<Vec<u8>>(),)+
            #[allow(unreachable_patterns)]
            _ => return Err(DecodeError::Mat("unsupported numeric class".to_string())),
        }
    };
}

/// 将 `.mat` 文件中的数值数组 (MATLAB 列优先) 转换为行优先的 `(h, w, c)` 数组.
/// 复数数组只取实部.
fn mask_from_mat(array: &matfile::Array) -> Result<Array3<u8>, DecodeError> {
    let values = real_to_u8!(array.data(), {
        Int8, UInt8, Int16, UInt16, Int32, UInt32, Int64, UInt64, Single, Double
    });

    let mask = match array.size().as_slice() {
        &[h, w] => Array3::from_shape_vec((h, w, 1).f(), values)?,
        &[h, w, c] => Array3::from_shape_vec((h, w, c).f(), values)?,
        other => return Err(DecodeError::UnsupportedRank(other.len())),
    };
    Ok(mask.as_standard_layout().into_owned())
}

/// 读取 `.mat` 文件中 `mask_data` 字段的掩码, 并转换为 `u8` 像素.
pub fn decode_mask<P: AsRef<Path>>(path: P) -> Result<PixelArray, DecodeError> {
    let file = File::open(path.as_ref())?;
    let mat = MatFile::parse(BufReader::new(file)).map_err(|e| DecodeError::Mat(format!("{e:?}")))?;
    let array = mat
        .find_by_name(MASK_FIELD)
        .ok_or(DecodeError::MissingField(MASK_FIELD))?;
    Ok(PixelArray::U8(mask_from_mat(array)?))
}

/// 按标签种类解码标签文件.
#[inline]
pub fn decode_label<P: AsRef<Path>>(path: P, kind: LabelKind) -> Result<PixelArray, DecodeError> {
    match kind {
        LabelKind::Mask => decode_mask(path),
        LabelKind::Image => decode_image(path),
    }
}
