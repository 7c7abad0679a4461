//! 内存中的像素数组和样本.

use crate::consts::pixel::{U16_SCALE, U8_SCALE};
use crate::Shape3d;
use ndarray::{Array3, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod decode;
mod save;
pub mod show;

pub use save::{ImgWriteRaw, ImgWriteVis};

/// 通道在最后 (`(h, w, c)`) 的像素数组.
///
/// 整数变体保存文件中的原始像素值; `F32` 变体一般是归一化到 `[0, 1]`
/// 后的结果, 但本类型不强制该约束.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelArray {
    /// 8-bit 像素.
    U8(Array3<u8>),

    /// 16-bit 像素.
    U16(Array3<u16>),

    /// 浮点像素.
    F32(Array3<f32>),
}

macro_rules! each_variant {
    ($self: expr, $a: ident => $body: expr) => {
        match $self {
            PixelArray::U8($a) => $body,
            PixelArray::U16($a) => $body,
            PixelArray::F32($a) => $body,
        }
    };
}

/// 将单通道数组沿通道轴复制三次.
fn triple<T: Clone>(a: &Array3<T>) -> Array3<T> {
    let (h, w, _) = a.dim();
    Array3::from_shape_fn((h, w, 3), |(i, j, _)| a[(i, j, 0)].clone())
}

impl PixelArray {
    /// 获取形状 `(h, w, c)`.
    #[inline]
    pub fn shape(&self) -> Shape3d {
        each_variant!(self, a => a.dim())
    }

    /// 高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.shape().2
    }

    /// 是否为单通道 (即解码结果本质上是二维灰度图).
    #[inline]
    pub fn is_gray(&self) -> bool {
        self.channels() == 1
    }

    /// 元素类型名.
    pub fn dtype(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::F32(_) => "f32",
        }
    }

    /// 若为单通道, 则复制为三通道; 否则原样返回.
    ///
    /// 所有依赖通道数的变换都应在此之后执行.
    pub fn broadcast_gray(self) -> Self {
        if !self.is_gray() {
            return self;
        }
        match self {
            Self::U8(a) => Self::U8(triple(&a)),
            Self::U16(a) => Self::U16(triple(&a)),
            Self::F32(a) => Self::F32(triple(&a)),
        }
    }

    /// 转换为 `[0, 1]` 范围内的浮点数组. 整数像素按其类型最大值缩放,
    /// 浮点像素原样复制.
    pub fn to_f32(&self) -> Array3<f32> {
        match self {
            Self::U8(a) => a.mapv(|p| p as f32 / U8_SCALE),
            Self::U16(a) => a.mapv(|p| p as f32 / U16_SCALE),
            Self::F32(a) => a.clone(),
        }
    }

    /// 同 `to_f32()`, 但浮点变体不会复制.
    pub fn into_f32(self) -> Array3<f32> {
        match self {
            Self::F32(a) => a,
            other => other.to_f32(),
        }
    }

    /// 获取第 `c` 个通道的浮点副本, 形状为 `(h, w, 1)`. `c` 越界时返回 `None`.
    pub fn channel_f32(&self, c: usize) -> Option<Array3<f32>> {
        if c >= self.channels() {
            return None;
        }
        let f = self.to_f32();
        Some(f.index_axis(Axis(2), c).insert_axis(Axis(2)).to_owned())
    }
}

impl From<Array3<u8>> for PixelArray {
    #[inline]
    fn from(a: Array3<u8>) -> Self {
        Self::U8(a)
    }
}

impl From<Array3<u16>> for PixelArray {
    #[inline]
    fn from(a: Array3<u16>) -> Self {
        Self::U16(a)
    }
}

impl From<Array3<f32>> for PixelArray {
    #[inline]
    fn from(a: Array3<f32>) -> Self {
        Self::F32(a)
    }
}

/// 一次访问得到的 "图像 + 标签" 样本.
///
/// 每次访问都会创建新的样本, 数据集本身不持有任何已产出样本的引用.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// 图像.
    pub image: PixelArray,

    /// 标签 (掩码或标签图像).
    pub label: PixelArray,
}

impl Sample {
    /// 初始化.
    #[inline]
    pub fn new(image: PixelArray, label: PixelArray) -> Self {
        Self { image, label }
    }

    /// 拆分为 `(image, label)`.
    #[inline]
    pub fn into_parts(self) -> (PixelArray, PixelArray) {
        (self.image, self.label)
    }

    /// 转换为通道在前 (`(c, h, w)`) 的 `[0, 1]` 浮点数组对, 便于直接喂给网络.
    ///
    /// 单通道数组会先被复制为三通道.
    pub fn into_chw(self) -> (Array3<f32>, Array3<f32>) {
        fn chw(p: PixelArray) -> Array3<f32> {
            p.broadcast_gray()
                .into_f32()
                .permuted_axes([2, 0, 1])
                .as_standard_layout()
                .into_owned()
        }
        (chw(self.image), chw(self.label))
    }
}
