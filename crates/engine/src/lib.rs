pub mod control;
pub mod otc;
pub mod reporter;
pub mod resolver;
pub mod scheduler;
pub mod session;

pub use otc::OtcClient;
pub use reporter::{ReportDispatcher, Reporter};
pub use resolver::{Confirmation, OutcomeResolver, ResolverState};
pub use scheduler::{alignment_sleep, ScanExit, ScanSettings, Scheduler};
pub use session::{Session, SessionHandle};
