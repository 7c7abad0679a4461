//! 类别表: 从 CSV 文件读取 `类别 id -> 类别名` 映射.
//!
//! 文件至少两列 `(id, name)`, 多余的列被忽略. 表头可选, 默认自动识别.

use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 类别标识. 能解析为整数的 id 为 `Index`, 否则为 `Name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClassId {
    /// 整数 id.
    Index(i64),

    /// 字符串 id.
    Name(String),
}

impl ClassId {
    /// 从单元格文本解析.
    pub fn parse(cell: &str) -> Self {
        match cell.parse::<i64>() {
            Ok(i) => Self::Index(i),
            Err(_) => Self::Name(cell.to_string()),
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

/// 表头处理方式.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeaderMode {
    /// 首行 id 不是整数, 且第二行 id 是整数或首格是常见列名时, 首行视为表头.
    #[default]
    Auto,

    /// 首行总是表头.
    Present,

    /// 没有表头.
    Absent,
}

/// 类别表读取选项.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogOptions {
    /// 分隔符.
    pub delimiter: u8,

    /// 表头处理方式.
    pub header: HeaderMode,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: HeaderMode::Auto,
        }
    }
}

/// 有序的 `类别 id -> 类别名` 映射. 加载后只读.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelCatalog {
    header: Option<Vec<String>>,
    entries: Vec<(ClassId, String)>,
}

/// 带行号的原始行.
type Row = (u64, StringRecord);

fn format_error(path: &Path, line: u64, reason: impl Into<String>) -> Error {
    Error::Format {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

#[inline]
fn is_integer(cell: Option<&str>) -> bool {
    cell.is_some_and(|c| c.parse::<i64>().is_ok())
}

/// 常见的 id 列名.
const HEADER_NAMES: [&str; 7] = ["id", "class", "class_id", "label", "index", "key", "name"];

#[inline]
fn is_header_name(cell: Option<&str>) -> bool {
    cell.is_some_and(|c| HEADER_NAMES.iter().any(|h| h.eq_ignore_ascii_case(c)))
}

impl LabelCatalog {
    /// 使用默认选项加载.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, &CatalogOptions::default())
    }

    /// 按 `options` 加载.
    ///
    /// 文件不存在时返回 [`Error::NotFound`]; 行少于两列、id 或类别名为空、
    /// id 重复、没有任何数据行时返回 [`Error::Format`].
    pub fn load_with<P: AsRef<Path>>(path: P, options: &CatalogOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(options.delimiter)
            .flexible(true)
            .trim(Trim::All)
            .comment(Some(b'#'))
            .from_path(path)
            .map_err(|e| Self::csv_error(path, e))?;

        let mut rows: Vec<Row> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Self::csv_error(path, e))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line());
            rows.push((line, record));
        }

        let has_header = match options.header {
            HeaderMode::Present => true,
            HeaderMode::Absent => false,
            HeaderMode::Auto => match rows.as_slice() {
                [(_, first), rest @ ..] => {
                    let id = first.get(0);
                    !is_integer(id)
                        && (is_header_name(id)
                            || rest.first().is_some_and(|(_, r)| is_integer(r.get(0))))
                }
                [] => false,
            },
        };

        let mut rows = rows.into_iter();
        let header = if has_header {
            rows.next()
                .map(|(_, r)| r.iter().map(str::to_string).collect())
        } else {
            None
        };

        let catalog = Self::from_rows(path, header, rows)?;
        log::debug!(
            "loaded {} classes from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    fn from_rows<I: Iterator<Item = Row>>(
        path: &Path,
        header: Option<Vec<String>>,
        rows: I,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (line, record) in rows {
            let (Some(id), Some(name)) = (record.get(0), record.get(1)) else {
                return Err(format_error(
                    path,
                    line,
                    format!("expected at least 2 columns, found {}", record.len()),
                ));
            };
            if id.is_empty() || name.is_empty() {
                return Err(format_error(path, line, "empty class id or name"));
            }
            let id = ClassId::parse(id);
            if !seen.insert(id.clone()) {
                return Err(format_error(path, line, format!("duplicate class id `{id}`")));
            }
            entries.push((id, name.to_string()));
        }

        if entries.is_empty() {
            return Err(format_error(path, 0, "no class rows"));
        }
        Ok(Self { header, entries })
    }

    fn csv_error(path: &Path, e: csv::Error) -> Error {
        let line = e.position().map_or(0, |p| p.line());
        if e.is_io_error() {
            match e.into_kind() {
                csv::ErrorKind::Io(source) => Error::Io {
                    path: path.to_path_buf(),
                    source,
                },
                other => format_error(path, line, format!("{other:?}")),
            }
        } else {
            format_error(path, line, e.to_string())
        }
    }

    /// 类别个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空. 成功加载的类别表总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 表头 (若有).
    #[inline]
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// 按 id 查询类别名.
    pub fn get(&self, id: &ClassId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, v)| v.as_str())
    }

    /// 按整数 id 查询类别名.
    #[inline]
    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.get(&ClassId::Index(id))
    }

    /// 按文件中的位次 (不含表头) 获取 `(id, name)`.
    #[inline]
    pub fn entry(&self, position: usize) -> Option<(&ClassId, &str)> {
        self.entries.get(position).map(|(k, v)| (k, v.as_str()))
    }

    /// 按类别名反查 id. 若有重名, 返回第一个.
    pub fn id_of(&self, name: &str) -> Option<&ClassId> {
        self.entries
            .iter()
            .find(|(_, v)| v == name)
            .map(|(k, _)| k)
    }

    /// 按文件顺序迭代 `(id, name)`.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&ClassId, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// 按文件顺序迭代类别名.
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for LabelCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{body}}}")
    }
}

/// 类别表路径, 即 `{labels_dir}/{classfile}`.
#[inline]
pub(crate) fn classfile_path(labels_dir: &Path, classfile: &str) -> PathBuf {
    labels_dir.join(classfile)
}
