use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

use common::{Notifier, Report, ReportTemplate};

/// Sending half of the report queue. Cheap to clone.
///
/// Reports are rendered and delivered by [`ReportDispatcher`] on its own task
/// so a slow notifier never stalls candle polling. Sending never waits: when
/// the queue is full the report is logged and dropped.
#[derive(Clone)]
pub struct Reporter {
    tx: mpsc::Sender<Report>,
}

impl Reporter {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Report>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn send(&self, report: Report) {
        match self.tx.try_send(report) {
            Ok(()) => {}
            Err(TrySendError::Full(report)) => {
                warn!(kind = report_kind(&report), "Report queue full, report dropped");
            }
            Err(TrySendError::Closed(report)) => {
                warn!(kind = report_kind(&report), "Report channel closed, report dropped");
            }
        }
    }
}

/// Renders queued reports and hands them to the notifier.
///
/// Runs until every [`Reporter`] is dropped and the queue is drained.
pub struct ReportDispatcher {
    rx: mpsc::Receiver<Report>,
    notifier: Arc<dyn Notifier>,
    template: ReportTemplate,
}

impl ReportDispatcher {
    pub fn new(rx: mpsc::Receiver<Report>, notifier: Arc<dyn Notifier>, template: ReportTemplate) -> Self {
        Self {
            rx,
            notifier,
            template,
        }
    }

    /// Run the dispatch loop. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!("ReportDispatcher running");
        while let Some(report) = self.rx.recv().await {
            let text = self.template.render(&report);
            info!(kind = report_kind(&report), "\n{text}");

            if let Err(e) = self.notifier.emit(&text).await {
                error!(kind = report_kind(&report), error = %e, "Report delivery failed");
            }
        }
        info!("ReportDispatcher: queue drained");
    }
}

fn report_kind(report: &Report) -> &'static str {
    match report {
        Report::SignalAnnounced(_) => "signal",
        Report::OutcomeResolved { .. } => "result",
        Report::Summary(_) => "summary",
    }
}
