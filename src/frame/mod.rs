// src/frame/mod.rs

pub mod join;
pub mod ops;

use arrow::{
    array::{ArrayRef, AsArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
    row::{RowConverter, Rows, SortField},
};

use crate::error::{FeedError, Result};

pub use join::{JoinKeys, JoinKind};

/// A named, fully materialised row-set.
///
/// The name is only used to label errors and log lines; two frames with the
/// same batch but different names are interchangeable.
#[derive(Debug, Clone)]
pub struct Frame {
    name: String,
    batch: RecordBatch,
}

impl Frame {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch: self.batch,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.batch
            .schema()
            .index_of(column)
            .map_err(|_| FeedError::MissingColumn {
                relation: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn column(&self, column: &str) -> Result<&ArrayRef> {
        let idx = self.column_index(column)?;
        Ok(self.batch.column(idx))
    }

    /// Values of `column` rendered as text, nulls as `None`.
    pub fn column_strings(&self, column: &str) -> Result<Vec<Option<String>>> {
        let values = cast(self.column(column)?, &DataType::Utf8)?;
        Ok(values
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Encode the given columns row-wise so composite keys can be hashed and compared.
    /// Nulls encode identically, so two null keys are equal.
    pub(crate) fn key_rows(&self, columns: &[&str]) -> Result<Rows> {
        let arrays = columns
            .iter()
            .map(|c| self.column(c).cloned())
            .collect::<Result<Vec<_>>>()?;
        let converter = RowConverter::new(
            arrays
                .iter()
                .map(|a| SortField::new(a.data_type().clone()))
                .collect(),
        )?;
        Ok(converter.convert_columns(&arrays)?)
    }
}
