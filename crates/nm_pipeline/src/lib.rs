pub mod artifacts;
pub mod budget;
pub mod cluster;
pub mod context;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod score;
pub mod tables;

pub use artifacts::{build_artifacts, time_ago, BuildOptions};
pub use budget::{Budget, BudgetManager, SummaryOutcome, SummaryReport};
pub use cluster::{relink, ClusterEngine, Clustering};
pub use context::{ClusterSettings, RunContext, RunInputs, Settings, SummarySettings};
pub use merge::{merge, MergeReport};
pub use normalize::{SimilarityMetric, TitleNormalizer};
pub use pipeline::{Pipeline, RunOutcome, RunStatus};
pub use score::Scorer;
pub use tables::ScoringTables;

pub mod prelude {
    pub use super::context::{RunContext, RunInputs, Settings};
    pub use super::pipeline::{Pipeline, RunOutcome, RunStatus};
    pub use nm_core::{Error, Result};
}
