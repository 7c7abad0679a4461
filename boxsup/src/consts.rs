//! 通用常量.

/// 数据集根目录下, 存放图像的子目录名.
pub const IMAGES_DIR: &str = "Images";

/// 数据集根目录下, 存放标签 (及类别表) 的子目录名.
pub const LABELS_DIR: &str = "Labels";

/// 图像文件扩展名.
pub const IMAGE_EXT: &str = "png";

/// 掩码标签文件扩展名.
pub const MASK_EXT: &str = "mat";

/// `.mat` 掩码文件中保存掩码数组的字段名.
pub const MASK_FIELD: &str = "mask_data";

/// 掩码标签文件名在扩展名之前的固定后缀, 即 `{image_stem}_label.mat`.
pub const LABEL_SUFFIX: &str = "_label";

/// 默认的类别表文件名.
pub const DEFAULT_CLASSFILE: &str = "classes_bxsp.txt";

/// 环境变量名.
pub mod env {
    /// 数据集根目录.
    pub const ROOT_DIR: &str = "BOXSUP_ROOT_DIR";

    /// 类别表文件名 (相对于 `Labels` 目录).
    pub const CLASSFILE: &str = "BOXSUP_CLASSFILE";
}

/// 像素取值范围.
pub mod pixel {
    /// `u8` 像素归一化到 `[0, 1]` 时的除数.
    pub const U8_SCALE: f32 = u8::MAX as f32;

    /// `u16` 像素归一化到 `[0, 1]` 时的除数.
    pub const U16_SCALE: f32 = u16::MAX as f32;
}
