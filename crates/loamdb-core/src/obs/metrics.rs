//! Process-local counters behind the metrics sink.

use std::cell::Cell;

thread_local! {
    static PLANS: Cell<u64> = const { Cell::new(0) };
    static GROUPS_PLANNED: Cell<u64> = const { Cell::new(0) };
    static GROUPS_RESOLVED: Cell<u64> = const { Cell::new(0) };
    static ROWS_REDUCED: Cell<u64> = const { Cell::new(0) };
}

///
/// EventReport
///
/// Point-in-time counter snapshot for observability surfaces and tests.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EventReport {
    pub plans: u64,
    pub groups_planned: u64,
    pub groups_resolved: u64,
    pub rows_reduced: u64,
}

pub(super) fn record_plan(groups: u64) {
    PLANS.with(|cell| cell.set(cell.get() + 1));
    GROUPS_PLANNED.with(|cell| cell.set(cell.get() + groups));
}

pub(super) fn record_resolve(rows: u64) {
    GROUPS_RESOLVED.with(|cell| cell.set(cell.get() + 1));
    ROWS_REDUCED.with(|cell| cell.set(cell.get() + rows));
}

pub(super) fn report() -> EventReport {
    EventReport {
        plans: PLANS.with(Cell::get),
        groups_planned: GROUPS_PLANNED.with(Cell::get),
        groups_resolved: GROUPS_RESOLVED.with(Cell::get),
        rows_reduced: ROWS_REDUCED.with(Cell::get),
    }
}

pub(super) fn reset() {
    PLANS.with(|cell| cell.set(0));
    GROUPS_PLANNED.with(|cell| cell.set(0));
    GROUPS_RESOLVED.with(|cell| cell.set(0));
    ROWS_REDUCED.with(|cell| cell.set(0));
}
