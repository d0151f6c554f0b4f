pub mod report;
pub mod store;

pub use report::ReportFormat;
pub use store::{MethodCount, MethodRegistry, MetricsSnapshot, MetricsStore};
