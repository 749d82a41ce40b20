//! Suite execution: guard hooks around an ordered list of query-sets

use crate::context::ExecutionContext;
use crate::error::{ExecutionError, ExecutionResult};
use crate::progress::ProgressMonitor;
use crate::query::Query;
use crate::query_set::QuerySet;
use chrono::{DateTime, Utc};
use sp_core::{Counts, SuiteReport};
use std::collections::BTreeMap;
use std::time::Instant;

/// Guard kind named in the error of queries skipped by a before-suite failure
pub const BEFORE_SUITE: &str = "Before suite";
/// Guard kind named in the error of queries skipped by a before-set failure
pub const BEFORE_SET: &str = "Before set";

/// Names of the meta-query-sets a suite runs around its query-sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteHooks {
    pub before_suite: Option<String>,
    pub after_suite: Option<String>,
    pub before_each: Option<String>,
    pub after_each: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Suite {
    pub id: String,
    /// Meta-query-sets by name; hooks refer to these
    meta: BTreeMap<String, QuerySet>,
    hooks: SuiteHooks,
    query_sets: Vec<QuerySet>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Suite {
    pub fn new(id: impl Into<String>, hooks: SuiteHooks) -> Self {
        Self {
            id: id.into(),
            meta: BTreeMap::new(),
            hooks,
            query_sets: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn add_meta_query_set(&mut self, set: QuerySet) {
        self.meta.insert(set.id.clone(), set);
    }

    pub fn add_query_set(&mut self, set: QuerySet) {
        self.query_sets.push(set);
    }

    pub fn hooks(&self) -> &SuiteHooks {
        &self.hooks
    }

    pub fn query_sets(&self) -> &[QuerySet] {
        &self.query_sets
    }

    pub fn meta_query_set(&self, name: &str) -> Option<&QuerySet> {
        self.meta.get(name)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn counts(&self) -> Counts {
        let mut counts = Counts::default();
        for set in &self.query_sets {
            counts.add(&set.counts());
        }
        counts
    }

    pub fn number_of_queries(&self) -> usize {
        self.query_sets.iter().map(|s| s.queries().len()).sum()
    }

    pub fn failed_queries(&self) -> impl Iterator<Item = &Query> {
        self.query_sets.iter().flat_map(QuerySet::failed_queries)
    }

    pub fn executed_queries(&self) -> impl Iterator<Item = &Query> {
        self.query_sets
            .iter()
            .flat_map(|s| s.queries().iter())
            .filter(|q| q.is_executed())
    }

    /// Run the suite: before-suite, then each query-set between its
    /// before/after hooks, then after-suite.
    ///
    /// Once `deadline` has passed, the remaining query-sets are skipped and
    /// `MaxTimeExceeded` is returned after the after-suite hook ran.
    pub fn run(
        &mut self,
        ctx: &ExecutionContext<'_>,
        deadline: Option<Instant>,
    ) -> ExecutionResult<()> {
        log::info!("Starting suite {}", self.id);
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        ctx.monitors.suite_started(self);

        let result = self.run_hooks_and_sets(ctx, deadline);

        self.finished_at = Some(Utc::now());
        ctx.monitors.suite_finished(self);
        result
    }

    fn run_hooks_and_sets(
        &mut self,
        ctx: &ExecutionContext<'_>,
        deadline: Option<Instant>,
    ) -> ExecutionResult<()> {
        let Suite {
            id,
            meta,
            hooks,
            query_sets,
            ..
        } = self;

        let before_suite_failure = match &hooks.before_suite {
            Some(name) => run_guard(meta, name, id, ctx)?,
            None => None,
        };

        let mut outcome = Ok(());
        if let Some(cause) = before_suite_failure {
            log::warn!("Before-suite of {} failed: {}", id, cause);
            for set in query_sets.iter_mut() {
                set.before_failed(&cause, BEFORE_SUITE, ctx);
            }
        } else {
            for set in query_sets.iter_mut() {
                let before = set.before().or(hooks.before_each.as_deref()).map(str::to_string);
                let guard_failure = match before {
                    Some(name) => run_guard(meta, &name, &set.id, ctx)?,
                    None => None,
                };
                match guard_failure {
                    Some(cause) => {
                        log::warn!("Before-set of {} - {} failed: {}", id, set.id, cause);
                        set.before_failed(&cause, BEFORE_SET, ctx);
                    }
                    None => set.run_queries(ctx)?,
                }

                let after = set.after().or(hooks.after_each.as_deref()).map(str::to_string);
                if let Some(name) = after {
                    if let Some(cause) = run_guard(meta, &name, &set.id, ctx)? {
                        log::warn!("After-set of {} - {} failed: {}", id, set.id, cause);
                    }
                }

                if deadline.is_some_and(|d| Instant::now() >= d) {
                    log::error!("Suite {}: max time exceeded after query-set {}", id, set.id);
                    outcome = Err(ExecutionError::MaxTimeExceeded);
                    break;
                }
            }
        }

        if let Some(name) = &hooks.after_suite {
            if let Some(cause) = run_guard(meta, name, id, ctx)? {
                log::warn!("After-suite of {} failed: {}", id, cause);
            }
        }
        outcome
    }

    pub fn to_report(&self) -> SuiteReport {
        SuiteReport {
            id: self.id.clone(),
            counts: self.counts(),
            query_sets: self.query_sets.iter().map(QuerySet::to_report).collect(),
        }
    }
}

impl PartialEq for Suite {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Suite {}

impl PartialOrd for Suite {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Suite {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

/// Run the meta-query-set `name` guarding `main_id`; returns the failure
/// cause when it failed or did not complete.
fn run_guard(
    meta: &mut BTreeMap<String, QuerySet>,
    name: &str,
    main_id: &str,
    ctx: &ExecutionContext<'_>,
) -> ExecutionResult<Option<String>> {
    let Some(set) = meta.get_mut(name) else {
        return Ok(Some(format!("Meta-query-set '{}' is not defined", name)));
    };
    set.set_main_id(main_id);
    set.run_queries(ctx)?;
    Ok(set.guard_failure())
}

#[cfg(test)]
#[path = "suite_test.rs"]
mod tests;
