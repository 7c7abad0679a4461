//! 像素数组变换及其组合.
//!
//! 变换是纯函数: 接受输入数组的引用, 返回新的数组, 不修改输入.
//! [`Compose`] 按顺序串联多个变换, 第 `i` 个变换的输出是第 `i + 1` 个变换的输入.

use crate::{PixelArray, Shape3d};
use std::sync::Arc;
use thiserror::Error;

pub mod denoise;
mod sample;

pub use denoise::{Denoise, DenoiseFilter, Gaussian};
pub use sample::{OnImage, OnLabel, SampleCompose, SampleTransform};

/// 变换错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// 变换参数不合法.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// 参数名.
        name: &'static str,
        /// 原因.
        reason: String,
    },

    /// 变换改变了不允许改变的形状.
    #[error("shape changed from {expected:?} to {found:?}")]
    ShapeChanged {
        /// 输入形状.
        expected: Shape3d,
        /// 输出形状.
        found: Shape3d,
    },

    /// 其他失败.
    #[error("{name} failed: {reason}")]
    Failed {
        /// 变换名.
        name: String,
        /// 原因.
        reason: String,
    },
}

/// 检查参数. 所有带参数的变换都在构造时通过它做一次校验.
pub(crate) fn ensure<F: FnOnce() -> String>(
    name: &'static str,
    ok: bool,
    reason: F,
) -> Result<(), TransformError> {
    if ok {
        Ok(())
    } else {
        Err(TransformError::InvalidParameter {
            name,
            reason: reason(),
        })
    }
}

/// 像素数组变换.
pub trait Transform: Send + Sync {
    /// 对 `input` 执行变换, 返回新的数组.
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError>;

    /// 变换名, 用于日志和调试输出.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    #[inline]
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError> {
        (**self).apply(input)
    }

    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: Transform + ?Sized> Transform for Arc<T> {
    #[inline]
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError> {
        (**self).apply(input)
    }

    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 恒等变换.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    #[inline]
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError> {
        Ok(input.clone())
    }

    fn name(&self) -> &str {
        "Identity"
    }
}

/// 转换为 `[0, 1]` 浮点数组. 整数像素按其类型最大值缩放.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToFloat;

impl Transform for ToFloat {
    #[inline]
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError> {
        Ok(PixelArray::F32(input.to_f32()))
    }

    fn name(&self) -> &str {
        "ToFloat"
    }
}

/// 签名固定的变换函数.
pub type TransformFn = fn(&PixelArray) -> Result<PixelArray, TransformError>;

/// 把函数或闭包包装为 [`Transform`].
#[derive(Clone)]
pub struct FnTransform<F> {
    f: F,
    name: &'static str,
}

impl<F> FnTransform<F>
where
    F: Fn(&PixelArray) -> Result<PixelArray, TransformError> + Send + Sync,
{
    /// 初始化.
    #[inline]
    pub fn new(name: &'static str, f: F) -> Self {
        Self { f, name }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&PixelArray) -> Result<PixelArray, TransformError> + Send + Sync,
{
    #[inline]
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError> {
        (self.f)(input)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// 按顺序串联的变换. 空的 `Compose` 等价于恒等变换.
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    /// 初始化.
    #[inline]
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// 在末尾追加一个变换.
    #[inline]
    pub fn push<T: Transform + 'static>(&mut self, t: T) {
        self.transforms.push(Box::new(t));
    }

    /// 同 `push()`, 但以链式调用的方式使用.
    #[inline]
    pub fn then<T: Transform + 'static>(mut self, t: T) -> Self {
        self.push(t);
        self
    }

    /// 变换个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for Compose {
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError> {
        let Some((first, rest)) = self.transforms.split_first() else {
            return Ok(input.clone());
        };
        let mut cur = first.apply(input)?;
        for t in rest {
            cur = t.apply(&cur)?;
        }
        Ok(cur)
    }

    fn name(&self) -> &str {
        "Compose"
    }
}

impl std::fmt::Debug for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.transforms.iter().map(|t| t.name()))
            .finish()
    }
}
