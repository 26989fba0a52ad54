mod baseline;
mod gate;
mod publish;
mod report;

pub use baseline::{BaselineOutcome, BaselineSource, RemoteBaseline, RemoteBaselineRequest};
pub use gate::{CommandStatus, GateConfig, GateResult, MetricThreshold};
pub use publish::{CommentMode, CommentOutcome, CommentTarget, PublishedArtifact};
pub use report::{Diff, MetricDelta, Report, ReportLink, ReportSummary, Scenario};
