//! Name-keyed registry of connection strategies

use crate::duckdb::DuckDbStrategy;
use crate::error::{DbError, DbResult};
use crate::traits::ConnectionStrategy;
use std::collections::BTreeMap;

type StrategyFactory = Box<dyn Fn() -> Box<dyn ConnectionStrategy> + Send + Sync>;

/// Maps lower-cased strategy names to constructors
pub struct ConnectionRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl ConnectionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the built-in strategies
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DuckDbStrategy::NAME, || Box::new(DuckDbStrategy::new()));
        registry
    }

    /// Register (or replace) a strategy under `name`
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ConnectionStrategy> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_lowercase(), Box::new(factory));
    }

    /// Create a fresh strategy instance; lookup ignores case
    pub fn create(&self, name: &str) -> DbResult<Box<dyn ConnectionStrategy>> {
        self.factories
            .get(&name.to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| DbError::UnknownStrategy {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
