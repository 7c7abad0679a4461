#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为 BoxSup 弱监督语义分割流程提供 "图像 + 标签" 数据集的索引、
//! 按需解码和预处理变换.
//!
//! 数据集根目录必须形如:
//!
//! ```text
//! root/
//!   Images/
//!     img_001.png
//!     img_002.png
//!   Labels/
//!     classes_bxsp.txt
//!     img_001_label.mat   (或 img_001.png)
//!     img_002_label.mat   (或 img_002.png)
//! ```
//!
//! # 注意
//!
//! 1. 配对关系只在构造时建立一次, 之后数据集的长度不会变化.
//! 2. 每次访问都会重新读取并解码文件, crate 内部不做任何缓存和预取.
//! 3. 所有可能失败的操作都返回 [`Result`], 不会 panic.
//!
//! # 模块
//!
//! ### 类别表 ✅
//!
//! 从 CSV 文件读取 `类别 id -> 类别名` 映射. 实现位于 `boxsup/src/catalog.rs`.
//!
//! ### 文件配对索引 ✅
//!
//! 排序、按位次配对、按文件名校验. 实现位于 `boxsup/src/dataset/index.rs`.
//!
//! ### 数据集访问器 ✅
//!
//! 长度查询和随机访问, 访问时解码并执行变换.
//! 实现位于 `boxsup/src/dataset/accessor.rs`.
//!
//! ### 变换流水线 ✅
//!
//! 纯函数式的像素数组变换及其组合. 实现位于 `boxsup/src/transform`.
//!
//! ### 可视化 ✅
//!
//! 将图像和标签上下拼接, 便于肉眼检查. 实现位于 `boxsup/src/data/show.rs`.

/// 三维形状 `(h, w, c)`, 通道在最后.
pub type Shape3d = (usize, usize, usize);

pub mod catalog;
pub mod consts;
pub mod data;
pub mod dataset;
mod error;
pub mod prelude;
pub mod transform;

pub use catalog::{CatalogOptions, ClassId, HeaderMode, LabelCatalog};
pub use data::{ImgWriteRaw, ImgWriteVis, PixelArray, Sample};
pub use dataset::{BoxSupDataset, DatasetBuilder, DatasetConfig, DatasetIndex, LabelKind, SampleRef};
pub use error::{DecodeError, Error, Result};
pub use transform::{Transform, TransformError};

#[cfg(test)]
pub(crate) mod testing;
