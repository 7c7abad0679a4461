//! 迭代器风格的样本读取.

use super::BoxSupDataset;
use crate::error::Result;
use crate::Sample;
use std::ops::Range;

/// 按规范顺序读取样本的迭代器, 由 [`BoxSupDataset::iter`] 创建.
///
/// 每一项为 `(索引, 读取结果)`. 单个样本读取失败不会终止迭代.
#[derive(Debug, Clone)]
pub struct SampleIter<'a> {
    dataset: &'a BoxSupDataset,
    range: Range<usize>,
}

impl<'a> SampleIter<'a> {
    #[inline]
    pub(super) fn new(dataset: &'a BoxSupDataset) -> Self {
        Self {
            dataset,
            range: 0..dataset.len(),
        }
    }
}

impl Iterator for SampleIter<'_> {
    type Item = (usize, Result<Sample>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.range.next()?;
        Some((idx, self.dataset.get(idx)))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl DoubleEndedIterator for SampleIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let idx = self.range.next_back()?;
        Some((idx, self.dataset.get(idx)))
    }
}

impl ExactSizeIterator for SampleIter<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.range.len()
    }
}

impl std::iter::FusedIterator for SampleIter<'_> {}

impl<'a> IntoIterator for &'a BoxSupDataset {
    type Item = (usize, Result<Sample>);
    type IntoIter = SampleIter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
