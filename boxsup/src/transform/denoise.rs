//! 去噪变换.
//!
//! [`Denoise`] 负责把任意像素数组归一化到 `[0, 1]` 浮点, 并按 `multichannel`
//! 决定滤波器是逐通道运行还是一次看到整个数组; 具体算法由 [`DenoiseFilter`] 提供.

use super::{ensure, Transform, TransformError};
use crate::PixelArray;
use ndarray::{s, Array3, ArrayView3, Axis};

/// 去噪滤波器.
pub trait DenoiseFilter: Send + Sync {
    /// 对 `[0, 1]` 浮点数组去噪, 返回同形状的新数组.
    fn filter(&self, image: ArrayView3<'_, f32>) -> Result<Array3<f32>, TransformError>;
}

/// 通道感知的去噪变换. 输出总是 `F32`.
#[derive(Debug, Clone)]
pub struct Denoise<F> {
    filter: F,
    multichannel: bool,
}

impl<F: DenoiseFilter> Denoise<F> {
    /// 初始化.
    ///
    /// `multichannel` 为真时滤波器逐通道运行, 每次看到形状为 `(h, w, 1)` 的数组;
    /// 否则滤波器看到整个 `(h, w, c)` 数组, 通道轴也参与滤波.
    #[inline]
    pub fn new(filter: F, multichannel: bool) -> Self {
        Self {
            filter,
            multichannel,
        }
    }

    /// 是否逐通道滤波.
    #[inline]
    pub fn multichannel(&self) -> bool {
        self.multichannel
    }

    /// 滤波器.
    #[inline]
    pub fn filter(&self) -> &F {
        &self.filter
    }

    fn run(&self, image: ArrayView3<'_, f32>) -> Result<Array3<f32>, TransformError> {
        let out = self.filter.filter(image)?;
        if out.dim() != image.dim() {
            return Err(TransformError::ShapeChanged {
                expected: image.dim(),
                found: out.dim(),
            });
        }
        Ok(out)
    }
}

impl<F: DenoiseFilter> Transform for Denoise<F> {
    fn apply(&self, input: &PixelArray) -> Result<PixelArray, TransformError> {
        let image = input.to_f32();
        if !self.multichannel {
            return Ok(PixelArray::F32(self.run(image.view())?));
        }

        let mut out = Array3::zeros(image.raw_dim());
        for c in 0..image.len_of(Axis(2)) {
            let plane = self.run(image.slice(s![.., .., c..c + 1]))?;
            out.slice_mut(s![.., .., c..c + 1]).assign(&plane);
        }
        Ok(PixelArray::F32(out))
    }

    fn name(&self) -> &str {
        "Denoise"
    }
}

/// 高斯平滑. 三个轴使用同一个可分离核, 边界按最近像素延拓.
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    sigma: f32,
    radius: usize,
    kernel: Vec<f32>,
}

impl Gaussian {
    /// 核半径上限.
    pub const MAX_RADIUS: usize = 64;

    /// 初始化. `sigma` 必须为正有限数, `radius` 必须在 `1..=MAX_RADIUS` 内.
    pub fn new(sigma: f32, radius: usize) -> Result<Self, TransformError> {
        ensure("sigma", sigma.is_finite() && sigma > 0.0, || {
            format!("expected a positive finite number, found {sigma}")
        })?;
        ensure("radius", (1..=Self::MAX_RADIUS).contains(&radius), || {
            format!("expected 1..={}, found {radius}", Self::MAX_RADIUS)
        })?;

        let weights: Vec<f32> = (0..=2 * radius)
            .map(|t| {
                let d = t as f32 - radius as f32;
                (-0.5 * d * d / (sigma * sigma)).exp()
            })
            .collect();
        let sum: f32 = weights.iter().sum();
        Ok(Self {
            sigma,
            radius,
            kernel: weights.into_iter().map(|w| w / sum).collect(),
        })
    }

    /// 使用 `ceil(3 * sigma)` 作为核半径.
    pub fn with_sigma(sigma: f32) -> Result<Self, TransformError> {
        let radius = if sigma.is_finite() && sigma > 0.0 {
            ((3.0 * sigma).ceil() as usize).clamp(1, Self::MAX_RADIUS)
        } else {
            1
        };
        Self::new(sigma, radius)
    }

    /// 标准差.
    #[inline]
    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// 核半径.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// 沿 `axis` 做一维卷积.
    fn convolve(&self, a: &Array3<f32>, axis: usize) -> Array3<f32> {
        let n = a.len_of(Axis(axis));
        let r = self.radius;
        let mut out = Array3::zeros(a.raw_dim());
        for ((i, j, k), o) in out.indexed_iter_mut() {
            let pos = [i, j, k][axis];
            let mut acc = 0.0;
            for (t, w) in self.kernel.iter().enumerate() {
                let mut src = [i, j, k];
                src[axis] = (pos + t).saturating_sub(r).min(n - 1);
                acc += w * a[src];
            }
            *o = acc;
        }
        out
    }
}

impl DenoiseFilter for Gaussian {
    fn filter(&self, image: ArrayView3<'_, f32>) -> Result<Array3<f32>, TransformError> {
        let mut cur = image.to_owned();
        for axis in 0..3 {
            cur = self.convolve(&cur, axis);
        }
        Ok(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::{Denoise, DenoiseFilter, Gaussian};
    use crate::transform::{Transform, TransformError};
    use crate::PixelArray;
    use ndarray::{Array3, ArrayView3, Axis};

    const EPS: f32 = 1e-5;

    /// 两个通道分别为常数 0 和 1 的图像.
    fn two_planes() -> PixelArray {
        PixelArray::F32(Array3::from_shape_fn((5, 5, 2), |(_, _, c)| c as f32))
    }

    #[test]
    fn test_gaussian_params() {
        assert!(Gaussian::new(1.0, 2).is_ok());
        assert!(matches!(
            Gaussian::new(0.0, 2),
            Err(TransformError::InvalidParameter { name: "sigma", .. })
        ));
        assert!(matches!(
            Gaussian::new(f32::NAN, 2),
            Err(TransformError::InvalidParameter { name: "sigma", .. })
        ));
        assert!(matches!(
            Gaussian::new(1.0, 0),
            Err(TransformError::InvalidParameter { name: "radius", .. })
        ));
        assert_eq!(Gaussian::with_sigma(1.2).unwrap().radius(), 4);
    }

    #[test]
    fn test_gaussian_keeps_constant() {
        let g = Gaussian::new(1.5, 3).unwrap();
        let a = Array3::from_elem((4, 7, 3), 0.25f32);
        let out = g.filter(a.view()).unwrap();
        assert!(out.iter().all(|v| (v - 0.25).abs() < EPS));
    }

    #[test]
    fn test_gaussian_smooths_impulse() {
        let g = Gaussian::new(1.0, 2).unwrap();
        let mut a = Array3::<f32>::zeros((5, 5, 1));
        a[(2, 2, 0)] = 1.0;
        let out = g.filter(a.view()).unwrap();

        assert!(out[(2, 2, 0)] < 1.0);
        assert!(out[(2, 3, 0)] > 0.0);
        assert!((out[(2, 1, 0)] - out[(2, 3, 0)]).abs() < EPS);
        assert!((out.sum() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_denoise_multichannel() {
        let input = two_planes();

        let per_channel = Denoise::new(Gaussian::new(1.0, 1).unwrap(), true);
        let PixelArray::F32(out) = per_channel.apply(&input).unwrap() else {
            unreachable!()
        };
        assert!(out.index_axis(Axis(2), 0).iter().all(|v| v.abs() < EPS));
        assert!(out.index_axis(Axis(2), 1).iter().all(|v| (v - 1.0).abs() < EPS));

        // 通道轴参与滤波, 两个通道的值互相混合.
        let joint = Denoise::new(Gaussian::new(1.0, 1).unwrap(), false);
        let PixelArray::F32(out) = joint.apply(&input).unwrap() else {
            unreachable!()
        };
        assert!(out.iter().all(|&v| v > EPS && v < 1.0 - EPS));
    }

    #[test]
    fn test_denoise_normalizes_integers() {
        let input = PixelArray::U8(Array3::from_elem((3, 3, 3), 255));
        let out = Denoise::new(Gaussian::new(0.8, 1).unwrap(), true)
            .apply(&input)
            .unwrap();
        assert_eq!(out.dtype(), "f32");
        assert!(out.to_f32().iter().all(|v| (v - 1.0).abs() < EPS));
    }

    struct Shrink;

    impl DenoiseFilter for Shrink {
        fn filter(&self, _: ArrayView3<'_, f32>) -> Result<Array3<f32>, TransformError> {
            Ok(Array3::zeros((1, 1, 1)))
        }
    }

    #[test]
    fn test_denoise_rejects_shape_change() {
        let err = Denoise::new(Shrink, false).apply(&two_planes()).unwrap_err();
        assert!(matches!(err, TransformError::ShapeChanged { .. }), "{err}");
    }
}
