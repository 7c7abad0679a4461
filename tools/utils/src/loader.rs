//! 对 `boxsup::dataset` 的更一层封装. 提供更直接的数据集加载方式.

use boxsup::consts::{env as keys, DEFAULT_CLASSFILE};
use boxsup::DatasetBuilder;
use std::env;
use std::path::PathBuf;

/// 获取 BoxSup 数据集根目录.
///
/// 1. 若环境变量 `$BOXSUP_ROOT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/boxsup`;
/// 3. 无法确定用户主目录时返回 `None`.
pub fn root_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(keys::ROOT_DIR) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => boxsup::dataset::home_dataset_dir_with(["boxsup"]),
    }
}

/// 获取类别表文件名.
///
/// 1. 若环境变量 `$BOXSUP_CLASSFILE` 非空, 则返回其值;
/// 2. 否则, 返回 `classes_bxsp.txt`.
pub fn classfile_from_env_or_default() -> String {
    match env::var(keys::CLASSFILE) {
        Ok(f) if !f.is_empty() => f,
        _ => DEFAULT_CLASSFILE.to_string(),
    }
}

/// 以 `$BOXSUP_ROOT_DIR` (或 `$HOME/dataset/boxsup`) 为根目录、
/// `$BOXSUP_CLASSFILE` (或 `classes_bxsp.txt`) 为类别表创建数据集构造器.
///
/// 无法确定根目录时使用空路径, 构造时会得到 [`boxsup::Error::Layout`].
pub fn builder_from_env_or_home() -> DatasetBuilder {
    let root = root_dir_from_env_or_home().unwrap_or_default();
    DatasetBuilder::new(root, classfile_from_env_or_default())
}
