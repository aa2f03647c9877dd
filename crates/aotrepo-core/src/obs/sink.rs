//! Contribution sink boundary.
//!
//! The decider reports each terminal through `record`; only this module
//! bridges decisions to report state and `tracing` output.

use crate::{
    decide::{DegradeReason, UnsupportedReason},
    error::{ErrorClass, ErrorOrigin},
    obs::report::{self, ContributionReport},
};
use std::{cell::RefCell, rc::Rc};
use tracing::{debug, error, warn};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn ContributionSink>>> = RefCell::new(None);
}

///
/// ContributionEvent
/// One terminal decision for one repository method.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContributionEvent {
    Generated {
        repository: String,
        method: String,
    },
    MetadataOnly {
        repository: String,
        method: String,
        reason: DegradeReason,
    },
    Unsupported {
        repository: String,
        method: String,
        reason: UnsupportedReason,
    },
    Failed {
        repository: String,
        method: String,
        class: ErrorClass,
        origin: ErrorOrigin,
    },
}

impl ContributionEvent {
    #[must_use]
    pub fn repository(&self) -> &str {
        match self {
            Self::Generated { repository, .. }
            | Self::MetadataOnly { repository, .. }
            | Self::Unsupported { repository, .. }
            | Self::Failed { repository, .. } => repository,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Generated { method, .. }
            | Self::MetadataOnly { method, .. }
            | Self::Unsupported { method, .. }
            | Self::Failed { method, .. } => method,
        }
    }
}

///
/// ContributionSink
///

pub trait ContributionSink {
    fn record(&self, event: &ContributionEvent);
}

/// ReportSink
/// Default sink: thread-local counters plus `tracing` output.

pub(crate) struct ReportSink;

impl ContributionSink for ReportSink {
    fn record(&self, event: &ContributionEvent) {
        let repository = event.repository();
        let method = event.method();

        match event {
            ContributionEvent::Generated { .. } => {
                debug!(repository, method, "generated method body");
                report::bump(repository, |c| c.generated = c.generated.saturating_add(1));
            }

            ContributionEvent::MetadataOnly { reason, .. } => {
                debug!(repository, method, %reason, "registered metadata only");
                report::bump(repository, |c| match reason {
                    DegradeReason::StoredProcedure => {
                        c.metadata_only_procedure = c.metadata_only_procedure.saturating_add(1);
                    }
                    DegradeReason::ScrollQuery => {
                        c.metadata_only_scroll = c.metadata_only_scroll.saturating_add(1);
                    }
                    DegradeReason::DynamicProjection => {
                        c.metadata_only_dynamic_projection =
                            c.metadata_only_dynamic_projection.saturating_add(1);
                    }
                    DegradeReason::ModifyingReturn => {
                        c.metadata_only_modifying_return =
                            c.metadata_only_modifying_return.saturating_add(1);
                    }
                });
            }

            ContributionEvent::Unsupported { reason, .. } => {
                warn!(repository, method, %reason, "skipping method contribution");
                report::bump(repository, |c| c.unsupported = c.unsupported.saturating_add(1));
            }

            ContributionEvent::Failed { class, origin, .. } => {
                error!(repository, method, %class, %origin, "method contribution failed");
                report::bump(repository, |c| c.failed = c.failed.saturating_add(1));
            }
        }
    }
}

pub(crate) const REPORT_SINK: ReportSink = ReportSink;

pub(crate) fn record(event: &ContributionEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match sink {
        Some(sink) => sink.record(event),
        None => REPORT_SINK.record(event),
    }
}

/// Snapshot the contribution counters of the current thread.
#[must_use]
pub fn contribution_report() -> ContributionReport {
    report::with_state(Clone::clone)
}

/// Reset all contribution counters of the current thread.
pub fn contribution_reset_all() {
    report::reset_all();
}

/// Run a closure with a temporary sink override on the current thread.
pub fn with_contribution_sink<T>(sink: Rc<dyn ContributionSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn ContributionSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
