//! Progress hooks and live status

use crate::query::Query;
use crate::query_set::QuerySet;
use crate::scenario::Scenario;
use crate::suite::Suite;
use std::sync::{Arc, Mutex, MutexGuard};

/// Observer of a run. All hooks fire on the execution thread.
pub trait ProgressMonitor: Send + Sync {
    fn run_started(&self) {}
    fn run_finished(&self) {}
    fn scenario_started(&self, _scenario: &Scenario) {}
    fn scenario_finished(&self, _scenario: &Scenario) {}
    fn suite_started(&self, _suite: &Suite) {}
    fn suite_finished(&self, _suite: &Suite) {}
    fn query_set_started(&self, _set: &QuerySet) {}
    fn query_set_finished(&self, _set: &QuerySet) {}
    fn query_started(&self, _query: &Query) {}
    fn query_finished(&self, _query: &Query) {}
    fn meta_query_set_started(&self, _set: &QuerySet) {}
    fn meta_query_set_finished(&self, _set: &QuerySet) {}
    fn meta_query_started(&self, _query: &Query) {}
    fn meta_query_finished(&self, _query: &Query) {}
}

/// Fans every hook out to the registered monitors, in registration order
#[derive(Default, Clone)]
pub struct ProgressMonitors {
    monitors: Vec<Arc<dyn ProgressMonitor>>,
}

impl ProgressMonitors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, monitor: Arc<dyn ProgressMonitor>) {
        self.monitors.push(monitor);
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// `query_set_started` or `meta_query_set_started`, depending on the set
    pub fn set_started(&self, set: &QuerySet) {
        if set.is_meta() {
            self.meta_query_set_started(set);
        } else {
            self.query_set_started(set);
        }
    }

    pub fn set_finished(&self, set: &QuerySet) {
        if set.is_meta() {
            self.meta_query_set_finished(set);
        } else {
            self.query_set_finished(set);
        }
    }
}

macro_rules! fan_out {
    ($($hook:ident($($arg:ident: $ty:ty),*);)*) => {
        impl ProgressMonitor for ProgressMonitors {
            $(
                fn $hook(&self, $($arg: $ty),*) {
                    for monitor in &self.monitors {
                        monitor.$hook($($arg),*);
                    }
                }
            )*
        }
    };
}

fan_out! {
    run_started();
    run_finished();
    scenario_started(scenario: &Scenario);
    scenario_finished(scenario: &Scenario);
    suite_started(suite: &Suite);
    suite_finished(suite: &Suite);
    query_set_started(set: &QuerySet);
    query_set_finished(set: &QuerySet);
    query_started(query: &Query);
    query_finished(query: &Query);
    meta_query_set_started(set: &QuerySet);
    meta_query_set_finished(set: &QuerySet);
    meta_query_started(query: &Query);
    meta_query_finished(query: &Query);
}

/// Snapshot of a run in progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatus {
    pub running: bool,
    pub scenario: Option<String>,
    pub suite: Option<String>,
    pub query_set: Option<String>,
    pub query: Option<String>,
    pub scenarios_finished: usize,
    /// Main queries of the scenarios started so far
    pub all: usize,
    pub executed: usize,
    pub pass: usize,
    pub fail: usize,
}

/// Aggregates live counters; safe to read from another thread
#[derive(Debug, Clone, Default)]
pub struct StatusMonitor {
    status: Arc<Mutex<RunStatus>>,
}

impl StatusMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RunStatus {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RunStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressMonitor for StatusMonitor {
    fn run_started(&self) {
        *self.lock() = RunStatus {
            running: true,
            ..RunStatus::default()
        };
    }

    fn run_finished(&self) {
        let mut status = self.lock();
        status.running = false;
        status.scenario = None;
        status.suite = None;
        status.query_set = None;
        status.query = None;
    }

    fn scenario_started(&self, scenario: &Scenario) {
        let mut status = self.lock();
        status.scenario = Some(scenario.id().to_string());
        status.all += scenario.number_of_queries();
    }

    fn scenario_finished(&self, _scenario: &Scenario) {
        let mut status = self.lock();
        status.scenario = None;
        status.scenarios_finished += 1;
    }

    fn suite_started(&self, suite: &Suite) {
        self.lock().suite = Some(suite.id.clone());
    }

    fn suite_finished(&self, _suite: &Suite) {
        self.lock().suite = None;
    }

    fn query_set_started(&self, set: &QuerySet) {
        self.lock().query_set = Some(set.id.clone());
    }

    fn query_set_finished(&self, _set: &QuerySet) {
        self.lock().query_set = None;
    }

    fn query_started(&self, query: &Query) {
        self.lock().query = Some(query.id.clone());
    }

    fn query_finished(&self, query: &Query) {
        let mut status = self.lock();
        status.query = None;
        status.executed += 1;
        if query.is_passed() {
            status.pass += 1;
        } else {
            status.fail += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl ProgressMonitor for Counting {
        fn query_finished(&self, _query: &Query) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_fan_out_reaches_every_monitor() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let mut monitors = ProgressMonitors::new();
        monitors.add(a.clone());
        monitors.add(b.clone());

        let query = Query::new("q", "s", "SELECT 1");
        monitors.query_finished(&query);
        monitors.query_finished(&query);
        assert_eq!(a.0.load(Ordering::SeqCst), 2);
        assert_eq!(b.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_status_counts_queries() {
        let status = StatusMonitor::new();
        status.run_started();
        let query = Query::new("q", "s", "SELECT 1");
        status.query_started(&query);
        assert_eq!(status.snapshot().query.as_deref(), Some("q"));
        status.query_finished(&query);

        let snapshot = status.snapshot();
        assert!(snapshot.running);
        assert_eq!(snapshot.executed, 1);
        assert_eq!(snapshot.fail, 1);
        assert_eq!(snapshot.query, None);

        status.run_finished();
        assert!(!status.snapshot().running);
    }
}
