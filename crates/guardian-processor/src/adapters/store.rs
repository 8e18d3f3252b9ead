//! In-memory attestation store

use crate::domain::{Digest, Vaa};
use crate::error::{ProcessorError, ProcessorResult};
use crate::ports::outbound::AttestationStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Signed VAAs held in memory, keyed by digest.
///
/// Stores the marshalled bytes, as a durable backend would.
#[derive(Default)]
pub struct InMemoryAttestationStore {
    vaas: RwLock<HashMap<Digest, Vec<u8>>>,
    writes: AtomicUsize,
}

impl InMemoryAttestationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored VAA for `digest`.
    pub fn get(&self, digest: &Digest) -> ProcessorResult<Option<Vaa>> {
        self.vaas
            .read()
            .get(digest)
            .map(|bytes| Vaa::unmarshal(bytes))
            .transpose()
            .map_err(|e| ProcessorError::StorageError {
                reason: e.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.vaas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaas.read().is_empty()
    }

    /// Number of `store_signed_vaa` calls, including overwrites.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AttestationStore for InMemoryAttestationStore {
    async fn store_signed_vaa(&self, vaa: &Vaa) -> ProcessorResult<()> {
        let bytes = vaa.marshal()?;
        self.vaas.write().insert(vaa.digest(), bytes);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn has_signed_vaa(&self, digest: &Digest) -> ProcessorResult<bool> {
        Ok(self.vaas.read().contains_key(digest))
    }
}
