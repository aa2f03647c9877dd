use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap};

///
/// ContributionCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ContributionCounters {
    pub generated: u64,

    // Metadata-only, by reason
    pub metadata_only_procedure: u64,
    pub metadata_only_scroll: u64,
    pub metadata_only_dynamic_projection: u64,
    pub metadata_only_modifying_return: u64,

    pub unsupported: u64,
    pub failed: u64,
}

impl ContributionCounters {
    #[must_use]
    pub const fn metadata_only(&self) -> u64 {
        self.metadata_only_procedure
            .saturating_add(self.metadata_only_scroll)
            .saturating_add(self.metadata_only_dynamic_projection)
            .saturating_add(self.metadata_only_modifying_return)
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.generated
            .saturating_add(self.metadata_only())
            .saturating_add(self.unsupported)
            .saturating_add(self.failed)
    }
}

///
/// ContributionReport
/// Point-in-time copy of the counters on the current thread.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ContributionReport {
    pub totals: ContributionCounters,
    pub repositories: BTreeMap<String, ContributionCounters>,
}

thread_local! {
    static REPORT_STATE: RefCell<ContributionReport> = RefCell::new(ContributionReport::default());
}

pub(crate) fn with_state<R>(f: impl FnOnce(&ContributionReport) -> R) -> R {
    REPORT_STATE.with(|r| f(&r.borrow()))
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut ContributionReport) -> R) -> R {
    REPORT_STATE.with(|r| f(&mut r.borrow_mut()))
}

/// Apply one counter update to the totals and the repository's entry.
pub(crate) fn bump(repository: &str, update: impl Fn(&mut ContributionCounters)) {
    with_state_mut(|r| {
        update(&mut r.totals);
        update(r.repositories.entry(repository.to_string()).or_default());
    });
}

pub(crate) fn reset_all() {
    with_state_mut(|r| *r = ContributionReport::default());
}
