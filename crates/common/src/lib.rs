pub mod config;
pub mod error;
pub mod report;
pub mod source;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use report::{Report, ReportTemplate, SessionSummary};
pub use source::{CandleSource, Notifier};
pub use types::*;
