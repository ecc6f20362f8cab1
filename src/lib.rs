//! @ai:module:intent RKLLM benchmark harness library
//! @ai:module:layer application
//! @ai:module:public_api config, error, launcher, probe, record, report, session, store, template

pub mod config;
pub mod error;
pub mod launcher;
pub mod probe;
pub mod record;
pub mod report;
pub mod session;
pub mod store;
pub mod template;

pub use config::{BenchmarkConfig, RunConfiguration};
pub use error::{Error, Result};
pub use launcher::{InferenceLauncher, LaunchOutcome};
pub use probe::{EnvironmentProbe, MemoryUsage, SystemProbe};
pub use record::{BenchmarkRecord, GenerationReport, Sample};
pub use report::{ModelSummary, ReportReader};
pub use session::{
    BenchmarkSession, InferenceCommand, LaunchedSession, PreparedInvocation, SessionOutcome,
};
pub use store::RecordStore;
pub use template::{TemplateRegistry, TemplateRule};
