use crate::csr_export::{export_csr_arrays, CsrArrays};
use crate::error::{SparseError, SparseResult};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Common interface of the sparsity graph forms.
pub trait SparsityGraph {
    /// Number of rows, i.e. the largest row index that may hold entries plus one.
    fn size(&self) -> usize;

    /// Total number of `(row, col)` entries.
    fn nnz(&self) -> usize;

    /// The columns of the given row in ascending order. Empty for rows without entries.
    fn row_entries(&self, row: usize) -> Vec<usize>;

    /// Rows holding at least one entry, in ascending order.
    fn stored_rows(&self) -> Vec<usize>;

    fn export_csr_arrays(&self) -> CsrArrays;

    /// Flat representation `[row_count, (row, row_entry_count, col × row_entry_count)...]`.
    fn export_single_vector_representation(&self) -> Vec<usize>;
}

/// A sparsity graph with arbitrary, possibly non-contiguous row indices.
///
/// The graph has set semantics: inserting an entry that is already present has no effect.
/// Insertion takes `&mut self`; use
/// [`SparseContiguousRowGraph`](crate::SparseContiguousRowGraph) for concurrent insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseGraph {
    rows: BTreeMap<usize, FxHashSet<usize>>,
}

impl SparseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, row: usize, col: usize) {
        self.rows.entry(row).or_default().insert(col);
    }

    pub fn add_entries(&mut self, row: usize, cols: &[usize]) {
        self.rows.entry(row).or_default().extend(cols.iter().copied());
    }

    /// Inserts every pair in the cartesian product `rows × cols`.
    pub fn add_entries_block(&mut self, rows: &[usize], cols: &[usize]) {
        for &row in rows {
            self.add_entries(row, cols);
        }
    }

    /// Inserts all entries of `other` (set union).
    pub fn merge(&mut self, other: &impl SparsityGraph) {
        for row in other.stored_rows() {
            self.add_entries(row, &other.row_entries(row));
        }
    }

    pub fn has(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(&row)
            .map_or(false, |cols| cols.contains(&col))
    }

    /// Largest inserted row index plus one.
    pub fn size(&self) -> usize {
        self.rows
            .keys()
            .next_back()
            .map_or(0, |last_row| last_row + 1)
    }

    /// Number of rows that hold at least one entry.
    pub fn num_stored_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn nnz(&self) -> usize {
        self.rows.values().map(|cols| cols.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn row(&self, row: usize) -> Option<&FxHashSet<usize>> {
        self.rows.get(&row)
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.rows.get(&row).map_or(0, |cols| cols.len())
    }

    pub fn row_entries(&self, row: usize) -> Vec<usize> {
        self.rows.get(&row).map_or_else(Vec::new, sorted)
    }

    /// Iterates over stored rows in ascending row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FxHashSet<usize>)> {
        self.rows.iter().map(|(row, cols)| (*row, cols))
    }

    pub fn export_csr_arrays(&self) -> CsrArrays {
        export_csr_arrays(
            self.size(),
            |row| self.row_len(row),
            |row, out| {
                if let Some(cols) = self.rows.get(&row) {
                    for (target, col) in out.iter_mut().zip(cols) {
                        *target = *col;
                    }
                }
            },
        )
    }

    pub fn export_single_vector_representation(&self) -> Vec<usize> {
        write_single_vector_representation(
            self.rows.len(),
            self.rows.iter().map(|(row, cols)| (*row, sorted(cols))),
        )
    }

    /// Merges the rows recorded in `data` into this graph.
    ///
    /// Existing entries are kept, so reloading is idempotent and commutes with other
    /// insertions. The input is validated completely before anything is inserted.
    pub fn add_from_single_vector_representation(&mut self, data: &[usize]) -> SparseResult<()> {
        for (row, cols) in parse_single_vector_representation(data)? {
            self.add_entries(row, cols);
        }
        Ok(())
    }

    pub fn from_single_vector_representation(data: &[usize]) -> SparseResult<Self> {
        let mut graph = Self::new();
        graph.add_from_single_vector_representation(data)?;
        Ok(graph)
    }
}

impl SparsityGraph for SparseGraph {
    fn size(&self) -> usize {
        self.size()
    }

    fn nnz(&self) -> usize {
        self.nnz()
    }

    fn row_entries(&self, row: usize) -> Vec<usize> {
        self.row_entries(row)
    }

    fn stored_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .filter(|(_, cols)| !cols.is_empty())
            .map(|(row, _)| *row)
            .collect()
    }

    fn export_csr_arrays(&self) -> CsrArrays {
        self.export_csr_arrays()
    }

    fn export_single_vector_representation(&self) -> Vec<usize> {
        self.export_single_vector_representation()
    }
}

pub(crate) fn sorted(cols: &FxHashSet<usize>) -> Vec<usize> {
    let mut cols: Vec<usize> = cols.iter().copied().collect();
    cols.sort_unstable();
    cols
}

pub(crate) fn write_single_vector_representation(
    row_count: usize,
    rows: impl Iterator<Item = (usize, Vec<usize>)>,
) -> Vec<usize> {
    let mut data = vec![row_count];
    for (row, cols) in rows {
        data.push(row);
        data.push(cols.len());
        data.extend_from_slice(&cols);
    }
    data
}

pub(crate) fn parse_single_vector_representation(data: &[usize]) -> SparseResult<Vec<(usize, &[usize])>> {
    let invalid = |message: String| SparseError::InvalidSingleVectorRepresentation(message);

    let (&row_count, mut rest) = data
        .split_first()
        .ok_or_else(|| invalid("missing row count".to_string()))?;

    let mut rows = Vec::with_capacity(row_count.min(rest.len() / 2));
    for i in 0..row_count {
        let (row, count) = match rest {
            [row, count, ..] => (*row, *count),
            _ => return Err(invalid(format!("header of record {i} is truncated"))),
        };
        let cols = rest[2..].get(..count).ok_or_else(|| {
            invalid(format!(
                "record {i} (row {row}) declares {count} entries, but the data ends early"
            ))
        })?;
        rows.push((row, cols));
        rest = &rest[2 + count..];
    }

    if !rest.is_empty() {
        return Err(invalid(format!("{} trailing values after {row_count} records", rest.len())));
    }

    Ok(rows)
}
