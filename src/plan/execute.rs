// src/plan/execute.rs

use std::{collections::HashMap, path::Path};
use tracing::{debug, info, instrument};

use super::{feed_plan, Step, RESULT};
use crate::error::{FeedError, Result};
use crate::feeds::load_feeds;
use crate::frame::Frame;

/// Named relations visible to the plan: the loaded feeds plus every step output so far.
pub type Relations = HashMap<String, Frame>;

/// Run `plan` in order, adding each step's output to `relations`.
pub fn execute(plan: &[Step<'_>], relations: &mut Relations) -> Result<()> {
    for step in plan {
        let frame = match *step {
            Step::Join { spec, .. } => {
                let left = lookup(relations, spec.left)?;
                let right = lookup(relations, spec.right)?;
                left.join(right, spec.keys, spec.kind)?
            }
            Step::Project { input, columns, .. } => lookup(relations, input)?.project(columns)?,
            Step::Dedup { input, subset, .. } => lookup(relations, input)?.dedup(subset)?,
            Step::Drop { input, columns, .. } => {
                lookup(relations, input)?.drop_columns(columns)?
            }
            Step::FilterEq {
                input,
                column,
                value,
                ..
            } => lookup(relations, input)?.filter_eq(column, value)?,
        };
        let output = step.output();
        debug!(step = output, rows = frame.num_rows(), "plan step done");
        relations.insert(output.to_string(), frame.renamed(output));
    }
    Ok(())
}

fn lookup<'r>(relations: &'r Relations, name: &str) -> Result<&'r Frame> {
    relations
        .get(name)
        .ok_or_else(|| FeedError::UnknownRelation(name.to_string()))
}

/// Load the feeds under `base` and return every (product, account) purchase of
/// `product` with the account's mailing address. No match is an empty frame, not an error.
#[instrument(level = "info", skip(base), fields(base = %base.display()))]
pub fn resolve_purchasers(base: &Path, product: &str) -> Result<Frame> {
    let mut relations = load_feeds(base)?;
    execute(&feed_plan(product), &mut relations)?;
    let result = relations
        .remove(RESULT)
        .ok_or_else(|| FeedError::UnknownRelation(RESULT.to_string()))?;
    info!(rows = result.num_rows(), "resolved purchasers");
    Ok(result)
}
