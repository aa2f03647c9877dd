//! Observability: contribution counters and sink abstractions.
//!
//! Decision logic records `ContributionEvent`s through the sink boundary
//! only; it never touches report state directly.

pub(crate) mod report;
pub(crate) mod sink;

// re-exports
pub use report::{ContributionCounters, ContributionReport};
pub use sink::{
    ContributionEvent, ContributionSink, contribution_report, contribution_reset_all,
    with_contribution_sink,
};
