// src/frame/ops.rs

use arrow::{
    array::{AsArray, BooleanArray},
    compute::{cast, filter_record_batch},
    datatypes::DataType,
};
use std::collections::HashSet;

use super::Frame;
use crate::error::Result;

impl Frame {
    /// Keep only `columns`, in the order given.
    pub fn project(&self, columns: &[&str]) -> Result<Frame> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(Frame::new(self.name(), self.batch.project(&indices)?))
    }

    /// Remove `columns`; every one of them must exist.
    pub fn drop_columns(&self, columns: &[&str]) -> Result<Frame> {
        let dropped = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<HashSet<_>>>()?;
        let keep: Vec<usize> = (0..self.num_columns())
            .filter(|i| !dropped.contains(i))
            .collect();
        Ok(Frame::new(self.name(), self.batch.project(&keep)?))
    }

    /// Drop every row whose values on `subset` repeat an earlier row's.
    pub fn dedup(&self, subset: &[&str]) -> Result<Frame> {
        let rows = self.key_rows(subset)?;
        let mut seen = HashSet::with_capacity(rows.num_rows());
        let keep: Vec<bool> = rows.iter().map(|row| seen.insert(row)).collect();
        let batch = filter_record_batch(&self.batch, &BooleanArray::from(keep))?;
        Ok(Frame::new(self.name(), batch))
    }

    /// Rows whose `column` equals `value` exactly. Nulls never match.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<Frame> {
        let values = cast(self.column(column)?, &DataType::Utf8)?;
        let mask: BooleanArray = values
            .as_string::<i32>()
            .iter()
            .map(|v| Some(v == Some(value)))
            .collect();
        let batch = filter_record_batch(&self.batch, &mask)?;
        Ok(Frame::new(self.name(), batch))
    }
}
