//! 图像的持久化存储.

use super::show::{quantize, stack_pair};
use crate::{PixelArray, Sample};
use image::error::{ParameterError, ParameterErrorKind};
use image::{DynamicImage, ImageBuffer, ImageError, ImageResult, RgbImage};
use ndarray::Array3;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 对 [`Sample`] 而言, 图像在上、标签在下拼接成一张 8-bit RGB 图,
/// 灰度数据会被复制为三通道, 所有像素按 `[0, 1]` 归一化后量化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
///
/// 整数像素按原值保存, 浮点像素视为 `[0, 1]` 并量化为 8-bit.
/// 只支持 1 至 4 个通道.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

#[inline]
fn dimension_mismatch() -> ImageError {
    ImageError::Parameter(ParameterError::from_kind(
        ParameterErrorKind::DimensionMismatch,
    ))
}

macro_rules! to_dynamic {
    ($a: expr, {$($c: literal => $pixel: ident, $variant: ident);+}) => {{
        let (h, w, c) = $a.dim();
        let raw = $a.iter().copied().collect::<Vec<_>>();
        match c {
            $($c => ImageBuffer::<image::$pixel<_>, _>::from_raw(w as u32, h as u32, raw)
                .map(DynamicImage::$variant),)+
            _ => None,
        }
    }};
}

fn u8_to_dynamic(a: &Array3<u8>) -> Option<DynamicImage> {
    to_dynamic!(a, {
        1 => Luma, ImageLuma8;
        2 => LumaA, ImageLumaA8;
        3 => Rgb, ImageRgb8;
        4 => Rgba, ImageRgba8
    })
}

fn u16_to_dynamic(a: &Array3<u16>) -> Option<DynamicImage> {
    to_dynamic!(a, {
        1 => Luma, ImageLuma16;
        2 => LumaA, ImageLumaA16;
        3 => Rgb, ImageRgb16;
        4 => Rgba, ImageRgba16
    })
}

impl ImgWriteRaw for PixelArray {
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let img = match self {
            Self::U8(a) => u8_to_dynamic(a),
            Self::U16(a) => u16_to_dynamic(a),
            Self::F32(a) => u8_to_dynamic(&quantize(a)),
        };
        img.ok_or_else(dimension_mismatch)?.save(path)
    }
}

/// 图像在上, 标签在下.
impl ImgWriteVis for Sample {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let stacked = stack_pair(&self.image, &self.label).map_err(|_| dimension_mismatch())?;
        let (h, w, _) = stacked.dim();
        let raw = quantize(&stacked).iter().copied().collect();
        let buf = RgbImage::from_raw(w as u32, h as u32, raw).ok_or_else(dimension_mismatch)?;
        buf.save(path)
    }
}
