//! Equi-join operators
//!
//! The planner picks the algorithm; this module only instantiates it.

mod block_nested;
mod condition;
mod sort_merge;

pub use block_nested::BlockNestedLoopJoin;
pub use condition::{JoinCondition, JoinKeys};
pub use sort_merge::SortMergeJoin;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::executor::{BoxedOperator, ExecContext, ExecResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinAlgorithm {
    BlockNested,
    SortMerge,
}

impl JoinAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinAlgorithm::BlockNested => "block_nested",
            JoinAlgorithm::SortMerge => "sort_merge",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "block_nested" => Some(JoinAlgorithm::BlockNested),
            "sort_merge" => Some(JoinAlgorithm::SortMerge),
            _ => None,
        }
    }

    /// Builds the join with the context's buffer budget
    pub fn build(
        self,
        left: BoxedOperator,
        right: BoxedOperator,
        condition: &JoinCondition,
        ctx: &ExecContext,
    ) -> ExecResult<BoxedOperator> {
        self.build_with_budget(left, right, condition, ctx.buffer_pages(), ctx)
    }

    pub fn build_with_budget(
        self,
        left: BoxedOperator,
        right: BoxedOperator,
        condition: &JoinCondition,
        buffer_pages: usize,
        ctx: &ExecContext,
    ) -> ExecResult<BoxedOperator> {
        Ok(match self {
            JoinAlgorithm::BlockNested => Box::new(BlockNestedLoopJoin::new(
                left,
                right,
                condition,
                buffer_pages,
                ctx,
            )?),
            JoinAlgorithm::SortMerge => Box::new(SortMergeJoin::new(
                left,
                right,
                condition,
                buffer_pages,
                ctx,
            )?),
        })
    }
}

impl fmt::Display for JoinAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
