//! sync::locks
//!
//! Keyed read/write locking for reconciler operations.
//!
//! # Architecture
//!
//! Two kinds of keys exist: a small fixed set of class-level locks (one per
//! [`ObjectClass`]) allocated eagerly at construction, and per-project
//! locks created lazily on first reference and retained for the life of
//! the registry. Handles are `Arc<tokio::sync::RwLock<()>>`: writers get
//! mutual exclusion, readers interleave, and guards release on every exit
//! path including unwinding.
//!
//! # Invariants
//!
//! - At most one lock instance exists per key; concurrent first access to
//!   the same project name resolves to exactly one handle
//! - The internal map lock is held only for the get-or-create step, never
//!   across an `.await` or a caller's critical section
//! - Handles are never removed; removal under concurrent access would
//!   reintroduce the duplicate-allocation race this registry exists to
//!   prevent
//!
//! # Example
//!
//! ```
//! use coxswain::sync::LockRegistry;
//!
//! # tokio_test::block_on(async {
//! let registry = LockRegistry::new();
//!
//! let handle = registry.project("payments");
//! let _guard = handle.write().await;
//! // ... exclusive critical section for project "payments" ...
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::RwLock;

use crate::sync::ObjectClass;

/// A shared handle to one keyed read/write lock.
pub type LockHandle = Arc<RwLock<()>>;

/// Registry of class-level and per-project locks.
///
/// Owned by the [`crate::sync::Reconciler`]; tests construct isolated
/// registries per case.
#[derive(Debug)]
pub struct LockRegistry {
    class_locks: ClassLocks,
    project_locks: Mutex<HashMap<String, LockHandle>>,
}

#[derive(Debug)]
struct ClassLocks {
    project: LockHandle,
    repository: LockHandle,
    repository_credentials: LockHandle,
    certificate: LockHandle,
    gpg_key: LockHandle,
    account: LockHandle,
    token: LockHandle,
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LockRegistry {
    /// Create a registry with fresh class locks and an empty project map.
    pub fn new() -> Self {
        Self {
            class_locks: ClassLocks {
                project: Arc::new(RwLock::new(())),
                repository: Arc::new(RwLock::new(())),
                repository_credentials: Arc::new(RwLock::new(())),
                certificate: Arc::new(RwLock::new(())),
                gpg_key: Arc::new(RwLock::new(())),
                account: Arc::new(RwLock::new(())),
                token: Arc::new(RwLock::new(())),
            },
            project_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the class-level lock handle.
    ///
    /// Note that project operations serialize on [`LockRegistry::project`]
    /// handles instead, so that two different projects never block each
    /// other; the Project class handle exists for completeness of the
    /// contract.
    pub fn class(&self, class: ObjectClass) -> LockHandle {
        let locks = &self.class_locks;
        match class {
            ObjectClass::Project => &locks.project,
            ObjectClass::Repository => &locks.repository,
            ObjectClass::RepositoryCredentials => &locks.repository_credentials,
            ObjectClass::Certificate => &locks.certificate,
            ObjectClass::GpgKey => &locks.gpg_key,
            ObjectClass::Account => &locks.account,
            ObjectClass::Token => &locks.token,
        }
        .clone()
    }

    /// Get (or create) the lock handle for one project name.
    pub fn project(&self, name: &str) -> LockHandle {
        // The map stays valid even if another thread panicked mid-insert;
        // recover the guard instead of propagating the poison.
        let mut map = self
            .project_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Number of distinct project names seen so far.
    pub fn project_lock_count(&self) -> usize {
        self.project_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
