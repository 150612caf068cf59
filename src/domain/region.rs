//! Region hierarchy node values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::metrics::MonthlyMetrics;
use crate::domain::tree::TreeNode;

/// Name of the root region.
pub const WORLD: &str = "World";

/// Value stored at each level of the World → Continent → Country → Metrics tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegionNode {
    World,
    Continent(String),
    Country(String),
    Metrics(MonthlyMetrics),
}

impl RegionNode {
    /// Region name; `None` for a metrics leaf.
    pub fn name(&self) -> Option<&str> {
        match self {
            RegionNode::World => Some(WORLD),
            RegionNode::Continent(name) | RegionNode::Country(name) => Some(name),
            RegionNode::Metrics(_) => None,
        }
    }

    pub fn metrics(&self) -> Option<&MonthlyMetrics> {
        match self {
            RegionNode::Metrics(metrics) => Some(metrics),
            _ => None,
        }
    }
}

impl fmt::Display for RegionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionNode::Metrics(metrics) => {
                let first = metrics.keys().next();
                let last = metrics.keys().next_back();
                match (first, last) {
                    (Some(first), Some(last)) => {
                        write!(f, "{} months ({} .. {})", metrics.len(), first, last)
                    }
                    _ => f.write_str("0 months"),
                }
            }
            other => f.write_str(other.name().unwrap_or_default()),
        }
    }
}

/// A World (or continent) tree produced by the builder.
pub type RegionTree = TreeNode<RegionNode>;
