//! Application state management.

use std::sync::Arc;

use invp_core::{InvoiceStore, InvpConfig, Pipeline};

use crate::error::{AppError, Result};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: InvpConfig,
    pipeline: Pipeline,
}

impl AppState {
    pub fn new(config: InvpConfig, pipeline: Pipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// State with the default pipeline for `config`, store included.
    pub fn from_config(config: InvpConfig) -> invp_core::Result<Self> {
        let pipeline = Pipeline::open(&config)?;
        Ok(Self::new(config, pipeline))
    }

    pub fn config(&self) -> &InvpConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// The invoice store, or an internal error when none is attached.
    pub fn store(&self) -> Result<&Arc<InvoiceStore>> {
        self.inner
            .pipeline
            .store()
            .ok_or_else(|| AppError::Internal("Invoice store not configured".to_string()))
    }
}
