//! Contiguous storage for the corpus vectors.

use crate::error::{GroveDbError, Result};
use crate::types::ItemId;

/// N vectors of a fixed dimension D, stored row-major in one allocation.
///
/// Row `i` belongs to `ItemId(i)`. The table is append-only while it is
/// being filled and read-only once a forest has been built over it.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorTable {
    dim: usize,
    data: Vec<f32>,
}

impl VectorTable {
    /// Create an empty table for vectors of dimension `dim`.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(GroveDbError::invalid_parameter(
                "vector dimension must be at least 1",
            ));
        }
        Ok(Self {
            dim,
            data: Vec::new(),
        })
    }

    /// Collect a table from in-memory rows.
    ///
    /// The first row fixes the dimension; every later row must match it.
    pub fn from_rows<I, V>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        let mut rows = rows.into_iter();
        let first = rows.next().ok_or(GroveDbError::EmptyCorpus)?;
        let mut table = Self::new(first.as_ref().len())?;
        table.push(first.as_ref())?;
        for row in rows {
            table.push(row.as_ref())?;
        }
        Ok(table)
    }

    /// Drain a fallible vector source exactly once.
    ///
    /// Errors from the source are returned unchanged; nothing is kept.
    pub fn from_source<I>(source: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Vec<f32>>>,
    {
        let mut source = source.into_iter();
        let first = source.next().ok_or(GroveDbError::EmptyCorpus)??;
        let mut table = Self::new(first.len())?;
        table.push(&first)?;
        for row in source {
            table.push(&row?)?;
        }
        Ok(table)
    }

    /// Rebuild a table from raw row-major data. `data.len()` must be a
    /// multiple of `dim`.
    pub(crate) fn from_raw(dim: usize, data: Vec<f32>) -> Self {
        debug_assert!(dim > 0 && data.len() % dim == 0);
        Self { dim, data }
    }

    /// Append a row, returning its id.
    pub fn push(&mut self, row: &[f32]) -> Result<ItemId> {
        if row.len() != self.dim {
            return Err(GroveDbError::dimension_mismatch(self.dim, row.len()));
        }
        let id = u32::try_from(self.len()).map_err(|_| {
            GroveDbError::invalid_parameter("vector table is limited to u32::MAX items")
        })?;
        self.data.extend_from_slice(row);
        Ok(ItemId(id))
    }

    /// Vector dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Return true if the table holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row of an id known to be in range.
    ///
    /// # Panics
    /// Panics if `id` is out of range.
    #[inline]
    pub fn row(&self, id: ItemId) -> &[f32] {
        let start = id.index() * self.dim;
        &self.data[start..start + self.dim]
    }

    /// Row of an id, if it exists.
    pub fn get(&self, id: ItemId) -> Option<&[f32]> {
        (id.index() < self.len()).then(|| self.row(id))
    }

    /// Iterate rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &[f32])> + '_ {
        self.data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (ItemId(i as u32), row))
    }

    /// All ids in the table.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> {
        (0..self.len() as u32).map(ItemId)
    }

    /// Raw row-major data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Heap bytes used by the vectors.
    pub fn memory_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}
