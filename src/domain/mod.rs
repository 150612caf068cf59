//! Domain layer: the generic tree, region values and the aggregation engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod month;
pub mod query;
pub mod region;
pub mod tree;
pub mod tree_traits;

pub use builder::{build, WorldTreeBuilder};
pub use entities::DailyRecord;
pub use error::{DomainError, DomainResult};
pub use metrics::{Metric, MetricView, MetricsRecord, MonthlyMetrics};
pub use month::MonthKey;
pub use query::{RegionQuery, Snapshot};
pub use region::{RegionNode, RegionTree, WORLD};
pub use tree::TreeNode;
pub use tree_traits::TreeNodeConvert;
