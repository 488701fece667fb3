// src/plan/mod.rs
//
// The purchaser lookup is a fixed query plan over the six feeds. It lives here as
// an ordered list of steps so it can be inspected and tested without any data.

pub mod execute;

use crate::feeds::{
    ACCOUNT_FEED, ADDRESS_FEED, AGREEMENT_FEED, OFFER_FEED, OFFER_PRODUCT_FEED, PRODUCT_FEED,
};
use crate::frame::{JoinKeys, JoinKind};

pub use execute::{execute, resolve_purchasers, Relations};

/// Name of the relation holding the final answer.
pub const RESULT: &str = "result";

/// Columns carried out of the agreement/offer join.
pub const INTERMEDIATE_COLUMNS: [&str; 3] = ["title", "aws_account_id", "mailing_address_id"];
/// At most one output row per (product, account).
pub const RESULT_DEDUP_KEY: [&str; 2] = ["title", "aws_account_id"];
/// Join keys removed from the output.
pub const RESULT_DROPPED: [&str; 2] = ["address_id", "mailing_address_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec<'a> {
    pub left: &'a str,
    pub right: &'a str,
    pub keys: JoinKeys<'a>,
    pub kind: JoinKind,
}

/// One relational step; every step reads named relations and writes `output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    Join {
        output: &'a str,
        spec: JoinSpec<'a>,
    },
    Project {
        output: &'a str,
        input: &'a str,
        columns: &'a [&'a str],
    },
    Dedup {
        output: &'a str,
        input: &'a str,
        subset: &'a [&'a str],
    },
    Drop {
        output: &'a str,
        input: &'a str,
        columns: &'a [&'a str],
    },
    FilterEq {
        output: &'a str,
        input: &'a str,
        column: &'a str,
        value: &'a str,
    },
}

impl<'a> Step<'a> {
    pub fn output(&self) -> &'a str {
        match *self {
            Step::Join { output, .. }
            | Step::Project { output, .. }
            | Step::Dedup { output, .. }
            | Step::Drop { output, .. }
            | Step::FilterEq { output, .. } => output,
        }
    }

    /// Relations this step reads.
    pub fn inputs(&self) -> Vec<&'a str> {
        match *self {
            Step::Join { spec, .. } => vec![spec.left, spec.right],
            Step::Project { input, .. }
            | Step::Dedup { input, .. }
            | Step::Drop { input, .. }
            | Step::FilterEq { input, .. } => vec![input],
        }
    }
}

fn inner<'a>(left: &'a str, right: &'a str, keys: JoinKeys<'a>) -> JoinSpec<'a> {
    JoinSpec {
        left,
        right,
        keys,
        kind: JoinKind::Inner,
    }
}

/// The purchaser plan for `product`. Order and keys are fixed; inner joins throughout.
pub fn feed_plan(product: &str) -> Vec<Step<'_>> {
    vec![
        Step::Join {
            output: "acct_ag",
            spec: inner(
                AGREEMENT_FEED,
                ACCOUNT_FEED,
                JoinKeys::Pair {
                    left: "acceptor_account_id",
                    right: "account_id",
                },
            ),
        },
        Step::Join {
            output: "prod_off_prod",
            spec: inner(PRODUCT_FEED, OFFER_PRODUCT_FEED, JoinKeys::On("product_id")),
        },
        Step::Join {
            output: "prod_off",
            spec: inner("prod_off_prod", OFFER_FEED, JoinKeys::On("offer_id")),
        },
        Step::Join {
            output: "offer_agreements",
            spec: inner(
                "prod_off",
                "acct_ag",
                JoinKeys::Pair {
                    left: "offer_id",
                    right: "origin_offer_id",
                },
            ),
        },
        Step::Project {
            output: "intermediate",
            input: "offer_agreements",
            columns: &INTERMEDIATE_COLUMNS,
        },
        Step::Join {
            output: "addressed",
            spec: inner(
                "intermediate",
                ADDRESS_FEED,
                JoinKeys::Pair {
                    left: "mailing_address_id",
                    right: "address_id",
                },
            ),
        },
        // TODO: confirm with the feed owners that dedup belongs only here and not after the earlier joins.
        Step::Dedup {
            output: "deduped",
            input: "addressed",
            subset: &RESULT_DEDUP_KEY,
        },
        Step::Drop {
            output: "trimmed",
            input: "deduped",
            columns: &RESULT_DROPPED,
        },
        Step::FilterEq {
            output: RESULT,
            input: "trimmed",
            column: "title",
            value: product,
        },
    ]
}
