//! sync::reconciler
//!
//! The orchestrating component: per-class create/read/update/delete
//! operations over the remote client, the lock registry and the retry
//! executor.
//!
//! # Architecture
//!
//! Every mutating operation follows the same lifecycle:
//!
//! 1. **Acquire** - take the class-level write lock, or the per-project
//!    write lock for project-keyed operations; reads take read locks
//! 2. **Pre-check** - enforce uniqueness locally where the remote's own
//!    rejection is not distinguishable (certificates)
//! 3. **Dispatch** - issue the remote call; repository creation goes
//!    through the retry executor, everything else is single-attempt
//! 4. **Reconcile drift** - fold remote-managed sub-fields into the
//!    outgoing payload (project role tokens) and echo version stamps
//! 5. **Race handling** - wait out a reported deletion grace period before
//!    recreating a project name that is still draining
//! 6. **Release** - guards drop on every exit path
//!
//! The per-class operations live in sibling modules (`project`,
//! `repository`, `credentials`, `certificate`, `gpg`, `account`); this
//! module holds the shared state and configuration.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use coxswain::remote::mock::MockRemote;
//! use coxswain::remote::RepositorySpec;
//! use coxswain::sync::Reconciler;
//!
//! # tokio_test::block_on(async {
//! let remote = MockRemote::new();
//! let reconciler = Reconciler::new(Arc::new(remote.clone()));
//!
//! let repo = reconciler
//!     .create_repository(
//!         RepositorySpec {
//!             url: "https://git.example.com/platform/infra.git".to_string(),
//!             ..Default::default()
//!         },
//!         false,
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(repo.url, "https://git.example.com/platform/infra.git");
//! # });
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::remote::RemoteApi;
use crate::sync::locks::LockRegistry;

/// Default wall-clock budget for retried repository creation.
pub const DEFAULT_RETRY_BUDGET: Duration = Duration::from_secs(30);

/// Reconciles desired object descriptors against the remote system.
///
/// The reconciler owns its [`LockRegistry`], so independent instances (one
/// per test case, or one per embedding process) never contend with each
/// other. All object state lives in the remote system; nothing observed is
/// retained here between calls.
pub struct Reconciler {
    pub(super) remote: Arc<dyn RemoteApi>,
    pub(super) locks: LockRegistry,
    pub(super) retry_budget: Duration,
}

impl Reconciler {
    /// Create a reconciler over the given remote client with a fresh lock
    /// registry and the default retry budget.
    pub fn new(remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            remote,
            locks: LockRegistry::new(),
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    /// Replace the wall-clock budget used for retried creation calls.
    pub fn with_retry_budget(mut self, budget: Duration) -> Self {
        self.retry_budget = budget;
        self
    }

    /// The configured retry budget.
    pub fn retry_budget(&self) -> Duration {
        self.retry_budget
    }

    /// The lock registry serializing this reconciler's operations.
    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }
}
