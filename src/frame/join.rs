// src/frame/join.rs

use arrow::{
    array::{ArrayRef, UInt32Array},
    compute::take,
    datatypes::{Field, Schema},
    record_batch::RecordBatch,
    row::{Row, RowConverter, SortField},
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::debug;

use super::Frame;
use crate::error::{FeedError, Result};

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep only rows with a match on both sides.
    Inner,
    /// Keep every left row; unmatched ones get nulls on the right.
    Left,
}

/// Key columns of a single-column equi-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKeys<'a> {
    /// Same column name on both sides; the output carries it once.
    On(&'a str),
    /// Differently named columns; both are kept in the output.
    Pair { left: &'a str, right: &'a str },
}

impl<'a> JoinKeys<'a> {
    pub fn left(&self) -> &'a str {
        match *self {
            JoinKeys::On(k) => k,
            JoinKeys::Pair { left, .. } => left,
        }
    }

    pub fn right(&self) -> &'a str {
        match *self {
            JoinKeys::On(k) => k,
            JoinKeys::Pair { right, .. } => right,
        }
    }
}

impl Frame {
    /// Hash join `self` (left) with `right`.
    ///
    /// Output order follows the left rows; each left row expands to its matches in
    /// right-row order. Non-key column names present on both sides are suffixed
    /// `_x` (left) and `_y` (right).
    pub fn join(&self, right: &Frame, keys: JoinKeys<'_>, kind: JoinKind) -> Result<Frame> {
        let left_keys = [self.column(keys.left())?.clone()];
        let right_keys = [right.column(keys.right())?.clone()];
        let converter = RowConverter::new(vec![SortField::new(left_keys[0].data_type().clone())])?;
        let left_rows = converter.convert_columns(&left_keys)?;
        let right_rows = converter.convert_columns(&right_keys)?;

        let mut index: HashMap<Row<'_>, Vec<u32>> = HashMap::with_capacity(right_rows.num_rows());
        for (i, row) in right_rows.iter().enumerate() {
            index.entry(row).or_default().push(take_index(i, right)?);
        }

        let mut left_take: Vec<u32> = Vec::with_capacity(left_rows.num_rows());
        let mut right_take: Vec<Option<u32>> = Vec::with_capacity(left_rows.num_rows());
        for (i, row) in left_rows.iter().enumerate() {
            let i = take_index(i, self)?;
            match index.get(&row) {
                Some(matches) => {
                    for &j in matches {
                        left_take.push(i);
                        right_take.push(Some(j));
                    }
                }
                None if kind == JoinKind::Left => {
                    left_take.push(i);
                    right_take.push(None);
                }
                None => {}
            }
        }
        let left_take = UInt32Array::from(left_take);
        let right_take = UInt32Array::from(right_take);

        let shared_key = match keys {
            JoinKeys::On(k) => Some(k),
            JoinKeys::Pair { .. } => None,
        };
        let left_names = self.column_names();
        let right_names: Vec<String> = right
            .column_names()
            .into_iter()
            .filter(|n| Some(n.as_str()) != shared_key)
            .collect();
        let right_set: HashSet<&str> = right_names.iter().map(String::as_str).collect();
        let overlap: HashSet<&str> = left_names
            .iter()
            .map(String::as_str)
            .filter(|n| Some(*n) != shared_key && right_set.contains(n))
            .collect();

        let mut fields = Vec::with_capacity(left_names.len() + right_names.len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
        for (name, array) in left_names.iter().zip(self.batch.columns()) {
            fields.push(Field::new(
                suffixed(name, &overlap, LEFT_SUFFIX),
                array.data_type().clone(),
                true,
            ));
            columns.push(take(array.as_ref(), &left_take, None)?);
        }
        for name in &right_names {
            let array = right.column(name)?;
            fields.push(Field::new(
                suffixed(name, &overlap, RIGHT_SUFFIX),
                array.data_type().clone(),
                true,
            ));
            columns.push(take(array.as_ref(), &right_take, None)?);
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        debug!(
            left = %self.name(),
            right = %right.name(),
            rows = batch.num_rows(),
            ?kind,
            "joined"
        );
        Ok(Frame::new(format!("{}+{}", self.name(), right.name()), batch))
    }
}

/// Row `i` of `frame` as a `take` index.
fn take_index(i: usize, frame: &Frame) -> Result<u32> {
    u32::try_from(i).map_err(|_| FeedError::TooManyRows {
        relation: frame.name().to_string(),
        rows: frame.num_rows(),
    })
}

fn suffixed(name: &str, overlap: &HashSet<&str>, suffix: &str) -> String {
    if overlap.contains(name) {
        format!("{name}{suffix}")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::frame::testing::{frame, strings};

    #[test]
    fn inner_join_on_pair_keeps_both_keys_and_drops_unmatched() {
        let agreements = frame(
            "AgreementFeed",
            &["acceptor_account_id", "origin_offer_id"],
            &[&["1", "10"], &["2", "11"], &["9", "12"]],
        );
        let accounts = frame("AccountFeed_V1", &["account_id", "name"], &[&["1", "ann"], &["2", "bo"]]);

        let joined = agreements
            .join(
                &accounts,
                JoinKeys::Pair {
                    left: "acceptor_account_id",
                    right: "account_id",
                },
                JoinKind::Inner,
            )
            .unwrap();

        assert_eq!(
            joined.column_names(),
            vec!["acceptor_account_id", "origin_offer_id", "account_id", "name"]
        );
        assert_eq!(strings(&joined, "origin_offer_id"), vec!["10", "11"]);
        assert_eq!(strings(&joined, "name"), vec!["ann", "bo"]);
    }

    #[test]
    fn shared_key_appears_once_and_overlaps_get_suffixes() {
        let products = frame("p", &["product_id", "title", "code"], &[&["100", "Widget", "W"]]);
        let offers = frame("op", &["offer_id", "product_id", "code"], &[&["10", "100", "O"]]);

        let joined = products
            .join(&offers, JoinKeys::On("product_id"), JoinKind::Inner)
            .unwrap();
        assert_eq!(
            joined.column_names(),
            vec!["product_id", "title", "code_x", "offer_id", "code_y"]
        );
        assert_eq!(strings(&joined, "code_x"), vec!["W"]);
        assert_eq!(strings(&joined, "code_y"), vec!["O"]);
    }

    #[test]
    fn one_to_many_expands_in_left_then_right_order() {
        let left = frame("l", &["k", "l"], &[&["a", "1"], &["b", "2"], &["a", "3"]]);
        let right = frame("r", &["k", "r"], &[&["a", "x"], &["a", "y"], &["b", "z"]]);

        let joined = left.join(&right, JoinKeys::On("k"), JoinKind::Inner).unwrap();
        assert_eq!(strings(&joined, "l"), vec!["1", "1", "2", "3", "3"]);
        assert_eq!(strings(&joined, "r"), vec!["x", "y", "z", "x", "y"]);
    }

    #[test]
    fn left_join_fills_nulls() {
        let left = frame("l", &["k"], &[&["a"], &["b"]]);
        let right = frame("r", &["k", "v"], &[&["a", "1"]]);

        let joined = left.join(&right, JoinKeys::On("k"), JoinKind::Left).unwrap();
        assert_eq!(
            joined.column_strings("v").unwrap(),
            vec![Some("1".to_string()), None]
        );
    }

    #[test]
    fn empty_side_yields_empty_result_with_full_schema() {
        let left = frame("l", &["k", "a"], &[]);
        let right = frame("r", &["k", "b"], &[&["1", "x"]]);

        let joined = left.join(&right, JoinKeys::On("k"), JoinKind::Inner).unwrap();
        assert_eq!(joined.num_rows(), 0);
        assert_eq!(joined.column_names(), vec!["k", "a", "b"]);
    }

    #[test]
    fn missing_key_column_is_reported() {
        let left = frame("left_side", &["k"], &[&["a"]]);
        let right = frame("r", &["other"], &[&["a"]]);
        let err = left
            .join(&right, JoinKeys::On("k"), JoinKind::Inner)
            .unwrap_err();
        assert!(matches!(err, FeedError::MissingColumn { ref relation, .. } if relation == "r"));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn row_positions_past_u32_are_rejected() {
        let f = frame("AgreementFeed", &["k"], &[&["a"]]);
        assert_eq!(take_index(7, &f).unwrap(), 7);
        assert_eq!(take_index(u32::MAX as usize, &f).unwrap(), u32::MAX);
        let err = take_index(u32::MAX as usize + 1, &f).unwrap_err();
        assert!(matches!(err, FeedError::TooManyRows { ref relation, .. } if relation == "AgreementFeed"));
    }
}
