//! 错误类型.

use crate::transform::TransformError;
use std::path::PathBuf;
use thiserror::Error;

/// 本 crate 的 `Result` 别名.
pub type Result<T> = std::result::Result<T, Error>;

/// 构造数据集或访问样本时的错误.
///
/// 构造阶段的错误 (`Layout` 至 `Format`) 对当前数据集实例是致命的;
/// 访问阶段的错误 (`IndexOutOfRange` 至 `Transform`) 只影响本次访问,
/// 并总是附带出错的文件路径.
#[derive(Debug, Error)]
pub enum Error {
    /// 根目录下缺少 `Images` 或 `Labels` 子目录.
    #[error("root directory {root} has no `{missing}` subdirectory")]
    Layout {
        /// 数据集根目录.
        root: PathBuf,
        /// 缺失的子目录名.
        missing: &'static str,
    },

    /// 目录下没有任何匹配扩展名的文件.
    #[error("no `*.{extension}` files in {dir}")]
    EmptyDirectory {
        /// 被扫描的目录.
        dir: PathBuf,
        /// 期望的扩展名.
        extension: &'static str,
    },

    /// 宽松配对模式下, 图像和标签个数不一致.
    #[error("{images} images but {labels} labels, cannot pair by position")]
    CountMismatch {
        /// 图像个数.
        images: usize,
        /// 标签个数.
        labels: usize,
    },

    /// 同一位次上的图像和标签文件名不对应.
    #[error("image `{image}` does not correspond to label `{label}`")]
    PairingMismatch {
        /// 图像文件名.
        image: String,
        /// 标签文件名.
        label: String,
    },

    /// 一侧目录的文件已经用完, 另一侧仍有文件没有对应项.
    #[error("{path} has no counterpart")]
    Unpaired {
        /// 多出来的文件.
        path: PathBuf,
    },

    /// 类别表文件不存在.
    #[error("class file {path} not found")]
    NotFound {
        /// 类别表路径.
        path: PathBuf,
    },

    /// 类别表内容无法解析为 `(id, name)` 行.
    #[error("malformed class file {path} at line {line}: {reason}")]
    Format {
        /// 类别表路径.
        path: PathBuf,
        /// 出错行号, 从 1 开始. 0 表示整个文件.
        line: u64,
        /// 原因.
        reason: String,
    },

    /// 索引越界.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange {
        /// 请求的索引.
        index: i64,
        /// 数据集长度.
        len: usize,
    },

    /// 解码图像或掩码失败.
    #[error("cannot decode {path}: {source}")]
    Decode {
        /// 出错文件.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: DecodeError,
    },

    /// 变换失败.
    #[error("transform failed on {path}: {source}")]
    Transform {
        /// 被变换数据的来源文件.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: TransformError,
    },

    /// 其他底层 I/O 错误.
    #[error("io error at {path}: {source}")]
    Io {
        /// 出错路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: std::io::Error,
    },
}

/// 文件解码错误.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// 栅格图像解码错误.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// 读取文件错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// `.mat` 容器解析错误.
    #[error("invalid mat file: {0}")]
    Mat(String),

    /// `.mat` 文件中没有给定名称的变量.
    #[error("no `{0}` variable in mat file")]
    MissingField(&'static str),

    /// 掩码数组维数不是 2 或 3.
    #[error("mask must be 2-D or 3-D, found {0} dimensions")]
    UnsupportedRank(usize),

    /// 数据长度与声明的形状不符.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
