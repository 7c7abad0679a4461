//! 可视化辅助: 把图像和标签上下拼接成一张图.
//!
//! 该模块只负责准备像素, 不负责打开窗口; 需要落盘时使用
//! [`ImgWriteVis`](crate::ImgWriteVis).

use crate::consts::pixel::U8_SCALE;
use crate::PixelArray;
use ndarray::{concatenate, s, Array3, Axis, ShapeError};

/// 转换为三通道 `[0, 1]` 浮点数组.
///
/// 单通道复制为三通道; 双通道 (灰度 + alpha) 只取灰度; 四通道丢弃 alpha.
pub fn to_rgb_f32(p: &PixelArray) -> Array3<f32> {
    let f = p.to_f32();
    match p.channels() {
        0 | 3 => f,
        1 | 2 => {
            let (h, w, _) = f.dim();
            Array3::from_shape_fn((h, w, 3), |(i, j, _)| f[(i, j, 0)])
        }
        _ => f.slice(s![.., .., ..3]).to_owned(),
    }
}

/// 将 `image` 放在上方, `label` 放在下方, 拼接成 `(h_image + h_label, w, 3)` 的浮点图.
///
/// 两者宽度不同时返回错误.
pub fn stack_pair(image: &PixelArray, label: &PixelArray) -> Result<Array3<f32>, ShapeError> {
    let top = to_rgb_f32(image);
    let bottom = to_rgb_f32(label);
    concatenate(Axis(0), &[top.view(), bottom.view()])
}

/// 将 `[0, 1]` 浮点数组量化为 `u8`. 超出范围的值被截断, NaN 为 0.
pub fn quantize(a: &Array3<f32>) -> Array3<u8> {
    a.mapv(|v| (v.clamp(0.0, 1.0) * U8_SCALE).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::{quantize, stack_pair, to_rgb_f32};
    use crate::PixelArray;
    use ndarray::Array3;

    #[test]
    fn test_to_rgb_drops_alpha() {
        let rgba = Array3::from_shape_fn((1, 2, 4), |(_, _, c)| (c * 50) as u8);
        let rgb = to_rgb_f32(&PixelArray::U8(rgba));
        assert_eq!(rgb.dim(), (1, 2, 3));
        assert!((rgb[(0, 1, 2)] - 100.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_stack_pair() {
        let image = PixelArray::U8(Array3::from_elem((2, 3, 1), 255));
        let label = PixelArray::F32(Array3::from_elem((4, 3, 3), 0.5));
        let stacked = stack_pair(&image, &label).unwrap();

        assert_eq!(stacked.dim(), (6, 3, 3));
        assert_eq!(stacked[(1, 2, 2)], 1.0);
        assert_eq!(stacked[(2, 0, 0)], 0.5);
    }

    #[test]
    fn test_stack_pair_width_mismatch() {
        let image = PixelArray::U8(Array3::zeros((2, 3, 3)));
        let label = PixelArray::U8(Array3::zeros((2, 4, 3)));
        assert!(stack_pair(&image, &label).is_err());
    }

    #[test]
    fn test_quantize() {
        let a = Array3::from_shape_vec((1, 4, 1), vec![-1.0, 0.5, 2.0, f32::NAN]).unwrap();
        let q = quantize(&a);
        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec![0, 128, 255, 0]);
    }
}
