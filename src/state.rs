//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{
    cache::CacheBackend, config::Config, db::ContestStore, formats::FormatRegistry,
    tasks::TaskRunner,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Contest persistence
    store: Arc<dyn ContestStore>,

    /// Aggregate cache
    cache: Arc<dyn CacheBackend>,

    /// Registered contest formats
    formats: FormatRegistry,

    /// Background jobs
    tasks: TaskRunner,

    /// Application configuration
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        store: Arc<dyn ContestStore>,
        cache: Arc<dyn CacheBackend>,
        formats: FormatRegistry,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                cache,
                formats,
                tasks: TaskRunner::new(),
                config,
            }),
        }
    }

    pub fn store(&self) -> &dyn ContestStore {
        self.inner.store.as_ref()
    }

    pub fn cache(&self) -> &dyn CacheBackend {
        self.inner.cache.as_ref()
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.inner.formats
    }

    pub fn tasks(&self) -> &TaskRunner {
        &self.inner.tasks
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
