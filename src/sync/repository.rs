//! sync::repository
//!
//! Repository operations, keyed by the repository class lock.
//!
//! # Design
//!
//! Repository creation is the one call in this core that is known to fail
//! transiently: when a repository and its host certificate are registered
//! in quick succession, the remote may not yet recognize the host's trust
//! material and rejects the registration with
//! [`RemoteError`](crate::remote::RemoteError)`::UnknownHostKey` until the
//! certificate has settled. Creation is therefore dispatched through
//! [`RetryPolicy`] with a fixed wall-clock budget; the call is idempotent
//! (the remote rejects duplicates itself), so back-to-back re-invocation
//! is safe. All other repository operations are single-attempt.

use tracing::{debug, warn};

use crate::remote::{RepositorySpec, RepositoryState};
use crate::sync::errors::{Action, SyncError};
use crate::sync::retry::{RetryOutcome, RetryPolicy};
use crate::sync::{ObjectClass, Reconciler};

impl Reconciler {
    /// Register a repository.
    ///
    /// With `upsert`, an existing registration for the same URL is adopted
    /// and replaced instead of rejected.
    ///
    /// # Errors
    ///
    /// [`SyncError::Timeout`] if the retry budget elapses while the remote
    /// keeps reporting unrecognized host-trust material; every other
    /// failure is terminal on first occurrence.
    pub async fn create_repository(
        &self,
        spec: RepositorySpec,
        upsert: bool,
    ) -> Result<RepositoryState, SyncError> {
        let handle = self.locks.class(ObjectClass::Repository);
        let _guard = handle.write().await;

        let url = spec.url.clone();
        debug!(repository = %url, upsert, "registering repository");
        let policy = RetryPolicy::new(self.retry_budget);
        let outcome = policy
            .run(|| {
                let spec = spec.clone();
                async move { self.remote.create_repository(spec, upsert).await }
            })
            .await;

        match outcome {
            RetryOutcome::Success(state) => Ok(state),
            RetryOutcome::TerminalFailure(err) => Err(SyncError::remote(
                Action::Create,
                ObjectClass::Repository,
                &url,
                err,
            )),
            RetryOutcome::RetryableFailure(last) => {
                warn!(repository = %url, budget = ?self.retry_budget, "host trust never settled within the retry budget");
                Err(SyncError::Timeout {
                    action: Action::Create,
                    class: ObjectClass::Repository,
                    identity: url,
                    budget: self.retry_budget,
                    last,
                })
            }
        }
    }

    /// Read a repository registration; `Ok(None)` if it does not exist.
    pub async fn read_repository(&self, url: &str) -> Result<Option<RepositoryState>, SyncError> {
        let handle = self.locks.class(ObjectClass::Repository);
        let _guard = handle.read().await;

        match self.remote.get_repository(url).await {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(SyncError::remote(
                Action::Read,
                ObjectClass::Repository,
                url,
                err,
            )),
        }
    }

    /// List all repository registrations.
    pub async fn list_repositories(&self) -> Result<Vec<RepositoryState>, SyncError> {
        let handle = self.locks.class(ObjectClass::Repository);
        let _guard = handle.read().await;

        self.remote
            .list_repositories()
            .await
            .map_err(|err| SyncError::remote(Action::Read, ObjectClass::Repository, "*", err))
    }

    /// Replace a repository registration.
    ///
    /// # Errors
    ///
    /// Updating an absent registration is an error.
    pub async fn update_repository(
        &self,
        spec: RepositorySpec,
    ) -> Result<RepositoryState, SyncError> {
        let handle = self.locks.class(ObjectClass::Repository);
        let _guard = handle.write().await;

        let url = spec.url.clone();
        debug!(repository = %url, "updating repository");
        self.remote
            .update_repository(spec)
            .await
            .map_err(|err| SyncError::remote(Action::Update, ObjectClass::Repository, &url, err))
    }

    /// Remove a repository registration; removing an absent one succeeds.
    pub async fn delete_repository(&self, url: &str) -> Result<(), SyncError> {
        let handle = self.locks.class(ObjectClass::Repository);
        let _guard = handle.write().await;

        debug!(repository = %url, "deleting repository");
        match self.remote.delete_repository(url).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(SyncError::remote(
                Action::Delete,
                ObjectClass::Repository,
                url,
                err,
            )),
        }
    }
}
