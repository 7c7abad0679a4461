//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Shape3d;

pub use crate::catalog::{CatalogOptions, ClassId, HeaderMode, LabelCatalog};
pub use crate::data::show::stack_pair;
pub use crate::data::{ImgWriteRaw, ImgWriteVis, PixelArray, Sample};

pub use crate::consts::{DEFAULT_CLASSFILE, IMAGES_DIR, LABELS_DIR};

pub use crate::dataset::{home_dataset_dir, home_dataset_dir_with};
pub use crate::dataset::{BoxSupDataset, DatasetBuilder, DatasetConfig, LabelKind};

pub use crate::transform::{
    Compose, Denoise, FnTransform, Gaussian, Identity, OnImage, OnLabel, SampleCompose,
    SampleTransform, ToFloat, Transform, TransformError,
};
