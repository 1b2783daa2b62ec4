// crates/ksi-core/src/runtime/publications.rs
// ============================================================================
// Module: In-Memory Publications Handler
// Description: Publications handler backed by a file held in memory.
// Purpose: Serve a preloaded publications file to verification runs.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Suitable for tests and for deployments that fetch and validate the
//! publications file elsewhere. The file can be swapped while verifiers hold
//! the handler; each request sees a consistent snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::PublicationsFile;
use crate::interfaces::ProtocolError;
use crate::interfaces::PublicationsHandler;

// ============================================================================
// SECTION: In-Memory Handler
// ============================================================================

/// In-memory publications handler.
#[derive(Debug, Clone)]
pub struct InMemoryPublicationsHandler {
    /// Current file protected by a mutex.
    file: Arc<Mutex<PublicationsFile>>,
}

impl InMemoryPublicationsHandler {
    /// Creates a handler serving `file`.
    #[must_use]
    pub fn new(file: PublicationsFile) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }

    /// Replaces the served file.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the store lock is poisoned.
    pub fn replace(&self, file: PublicationsFile) -> Result<(), ProtocolError> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| ProtocolError::Publications("publications store lock poisoned".to_string()))?;
        *guard = file;
        Ok(())
    }
}

impl PublicationsHandler for InMemoryPublicationsHandler {
    fn publications_file(&self) -> Result<PublicationsFile, ProtocolError> {
        self.file
            .lock()
            .map(|file| file.clone())
            .map_err(|_| ProtocolError::Publications("publications store lock poisoned".to_string()))
    }
}
