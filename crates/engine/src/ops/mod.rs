use std::{fmt, sync::Arc};

use crate::{
    DisabledUploader, DocumentStore, LedgerError, ReceiptUploader, ResultLedger,
};

mod balances;
mod transactions;
mod wallets;

/// Attempts a conditional wallet write gets after the first one loses a race.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

pub struct Engine {
    store: Arc<dyn DocumentStore>,
    uploader: Arc<dyn ReceiptUploader>,
    max_conflict_retries: u32,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Removes an attachment whose document write failed.
    async fn discard_upload(&self, reference: &str) {
        match self.uploader.discard(reference).await {
            Ok(()) => tracing::warn!("removed upload \"{reference}\" after a failed write"),
            Err(err) => tracing::error!("upload \"{reference}\" left orphaned: {err}"),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("max_conflict_retries", &self.max_conflict_retries)
            .finish_non_exhaustive()
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn DocumentStore>>,
    uploader: Option<Arc<dyn ReceiptUploader>>,
    max_conflict_retries: Option<u32>,
}

impl EngineBuilder {
    /// Pass the required document store
    pub fn store(mut self, store: impl DocumentStore + 'static) -> EngineBuilder {
        self.store = Some(Arc::new(store));
        self
    }

    /// Pass the uploader used for receipts and wallet icons
    pub fn uploader(mut self, uploader: impl ReceiptUploader + 'static) -> EngineBuilder {
        self.uploader = Some(Arc::new(uploader));
        self
    }

    pub fn max_conflict_retries(mut self, retries: u32) -> EngineBuilder {
        self.max_conflict_retries = Some(retries);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultLedger<Engine> {
        let store = self
            .store
            .ok_or_else(|| LedgerError::Validation("engine requires a document store".to_string()))?;

        Ok(Engine {
            store,
            uploader: self
                .uploader
                .unwrap_or_else(|| Arc::new(DisabledUploader)),
            max_conflict_retries: self
                .max_conflict_retries
                .unwrap_or(DEFAULT_MAX_CONFLICT_RETRIES),
        })
    }
}
