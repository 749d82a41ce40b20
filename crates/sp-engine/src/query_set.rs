//! Ordered group of queries sharing a fast-fail policy

use crate::context::ExecutionContext;
use crate::error::{ExecutionError, ExecutionResult};
use crate::progress::ProgressMonitor;
use crate::query::Query;
use sp_core::{Counts, QuerySetReport};

#[derive(Debug, Clone)]
pub struct QuerySet {
    pub id: String,
    pub suite_id: String,
    queries: Vec<Query>,
    fast_fail: bool,
    is_meta: bool,
    before: Option<String>,
    after: Option<String>,
    /// For meta sets: id of the entity currently being guarded
    main_id: Option<String>,
}

impl QuerySet {
    /// A main query-set, judged by the scenario's result strategy
    pub fn new(id: impl Into<String>, suite_id: impl Into<String>, fast_fail: bool) -> Self {
        Self {
            id: id.into(),
            suite_id: suite_id.into(),
            queries: Vec::new(),
            fast_fail,
            is_meta: false,
            before: None,
            after: None,
            main_id: None,
        }
    }

    /// A meta-query-set; always fast-fail
    pub fn meta(id: impl Into<String>, suite_id: impl Into<String>) -> Self {
        Self {
            is_meta: true,
            ..Self::new(id, suite_id, true)
        }
    }

    /// Meta-query-set run before this one instead of the suite's before-each
    pub fn with_before(mut self, name: Option<String>) -> Self {
        self.before = name;
        self
    }

    pub fn with_after(mut self, name: Option<String>) -> Self {
        self.after = name;
        self
    }

    pub fn push(&mut self, query: Query) {
        self.queries.push(query);
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn is_meta(&self) -> bool {
        self.is_meta
    }

    pub fn fast_fail(&self) -> bool {
        self.fast_fail
    }

    pub fn main_id(&self) -> Option<&str> {
        self.main_id.as_deref()
    }

    /// Record which entity this meta set guards. Ignored for main sets.
    pub fn set_main_id(&mut self, main_id: &str) {
        if self.is_meta {
            self.main_id = Some(main_id.to_string());
        } else {
            log::warn!("Query-set {} is not a meta-query-set; main id ignored", self.id);
        }
    }

    pub fn reset(&mut self) {
        for query in &mut self.queries {
            query.reset();
        }
    }

    pub fn counts(&self) -> Counts {
        Counts::new(
            self.queries.len(),
            self.queries.iter().filter(|q| q.is_executed()).count(),
            self.queries.iter().filter(|q| q.is_passed()).count(),
            self.queries.iter().filter(|q| q.is_failed()).count(),
        )
    }

    pub fn failed_queries(&self) -> impl Iterator<Item = &Query> {
        self.queries.iter().filter(|q| q.is_failed())
    }

    /// Run every query in order.
    ///
    /// Stops after the first failure when fast-fail is on. Connection-level
    /// failures and cancellation abort the set and are returned.
    pub fn run_queries(&mut self, ctx: &ExecutionContext<'_>) -> ExecutionResult<()> {
        self.reset();
        ctx.monitors.set_started(self);
        let result = self.run_each(ctx);
        ctx.monitors.set_finished(self);
        result
    }

    fn run_each(&mut self, ctx: &ExecutionContext<'_>) -> ExecutionResult<()> {
        let meta_of = self
            .is_meta
            .then(|| self.main_id.clone().unwrap_or_else(|| self.id.clone()));

        for query in &mut self.queries {
            query.run(ctx, meta_of.as_deref());
            let passed = query.is_passed();
            if !passed {
                log::warn!(
                    "Query {} - {} failed: {}",
                    query.suite_id,
                    query.id,
                    query
                        .result()
                        .and_then(|r| r.first_failure())
                        .unwrap_or_default()
                );
                if let Some(err) = query.execution_error() {
                    return Err(err);
                }
            }
            if ctx.cancel.is_cancelled() {
                return Err(ExecutionError::Interrupted);
            }
            if !passed && self.fast_fail {
                log::debug!("Fast-fail: skipping the rest of query-set {}", self.id);
                break;
            }
        }
        Ok(())
    }

    /// Fail every query without running it because the guard `kind`
    /// failed with `cause`, and write their error artifacts.
    pub fn before_failed(&mut self, cause: &str, kind: &str, ctx: &ExecutionContext<'_>) {
        if self.is_meta {
            return;
        }
        self.reset();
        ctx.monitors.query_set_started(self);
        for query in &mut self.queries {
            query.before_set_failed(cause, kind, ctx.monitors);
        }
        ctx.meta_strategy
            .write_errors_for_main_query_set(self, ctx.result_strategy);
        ctx.monitors.query_set_finished(self);
    }

    /// Why this meta set counts as failed, if it does.
    ///
    /// A failed query yields its failure; otherwise a set that did not run
    /// all of its queries is incomplete.
    pub fn guard_failure(&self) -> Option<String> {
        if let Some(query) = self.queries.iter().find(|q| q.is_failed()) {
            let detail = query
                .result()
                .and_then(|r| {
                    r.exception
                        .as_ref()
                        .map(|e| e.describe())
                        .or_else(|| r.errors.first().cloned())
                })
                .unwrap_or_default();
            return Some(format!("{} - {}: {}", self.id, query.id, detail));
        }
        let counts = self.counts();
        (counts.executed < counts.all).then(|| {
            format!(
                "Meta-query-set '{}' is incomplete: {} of {} queries executed",
                self.id, counts.executed, counts.all
            )
        })
    }

    pub fn to_report(&self) -> QuerySetReport {
        QuerySetReport {
            id: self.id.clone(),
            counts: self.counts(),
            queries: self.queries.iter().map(Query::to_report).collect(),
        }
    }
}
