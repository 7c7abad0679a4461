//! 作用于整个样本的变换.

use super::{Transform, TransformError};
use crate::Sample;

/// 样本变换, 同时看到图像和标签.
pub trait SampleTransform: Send + Sync {
    /// 对 `sample` 执行变换, 返回新的样本.
    fn apply(&self, sample: &Sample) -> Result<Sample, TransformError>;

    /// 变换名, 用于日志和调试输出.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// 只变换图像, 标签原样保留.
#[derive(Debug, Clone, Default)]
pub struct OnImage<T>(pub T);

impl<T: Transform> SampleTransform for OnImage<T> {
    fn apply(&self, sample: &Sample) -> Result<Sample, TransformError> {
        Ok(Sample::new(self.0.apply(&sample.image)?, sample.label.clone()))
    }

    fn name(&self) -> &str {
        self.0.name()
    }
}

/// 只变换标签, 图像原样保留.
#[derive(Debug, Clone, Default)]
pub struct OnLabel<T>(pub T);

impl<T: Transform> SampleTransform for OnLabel<T> {
    fn apply(&self, sample: &Sample) -> Result<Sample, TransformError> {
        Ok(Sample::new(sample.image.clone(), self.0.apply(&sample.label)?))
    }

    fn name(&self) -> &str {
        self.0.name()
    }
}

/// 按顺序串联的样本变换. 为空时等价于恒等变换.
#[derive(Default)]
pub struct SampleCompose {
    transforms: Vec<Box<dyn SampleTransform>>,
}

impl SampleCompose {
    /// 初始化.
    #[inline]
    pub fn new(transforms: Vec<Box<dyn SampleTransform>>) -> Self {
        Self { transforms }
    }

    /// 在末尾追加一个变换, 以链式调用的方式使用.
    #[inline]
    pub fn then<T: SampleTransform + 'static>(mut self, t: T) -> Self {
        self.transforms.push(Box::new(t));
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

impl SampleTransform for SampleCompose {
    fn apply(&self, sample: &Sample) -> Result<Sample, TransformError> {
        let Some((first, rest)) = self.transforms.split_first() else {
            return Ok(sample.clone());
        };
        let mut cur = first.apply(sample)?;
        for t in rest {
            cur = t.apply(&cur)?;
        }
        Ok(cur)
    }

    fn name(&self) -> &str {
        "SampleCompose"
    }
}

impl std::fmt::Debug for SampleCompose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.transforms.iter().map(|t| t.name()))
            .finish()
    }
}
