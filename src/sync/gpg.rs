//! sync::gpg
//!
//! GPG public-key operations, keyed by the gpg-key class lock.
//!
//! Keys are immutable remote objects: the remote derives the key id and
//! fingerprint from the submitted material, so there is no update
//! operation and the key id is only known after creation.

use tracing::debug;

use crate::remote::{GpgKeySpec, GpgKeyState};
use crate::sync::errors::{Action, SyncError};
use crate::sync::{ObjectClass, Reconciler};

impl Reconciler {
    /// Register a GPG public key; the returned state carries the
    /// remote-assigned key id.
    pub async fn create_gpg_key(&self, spec: GpgKeySpec) -> Result<GpgKeyState, SyncError> {
        let handle = self.locks.class(ObjectClass::GpgKey);
        let _guard = handle.write().await;

        debug!("registering gpg key");
        self.remote
            .create_gpg_key(spec)
            .await
            .map_err(|err| SyncError::remote(Action::Create, ObjectClass::GpgKey, "(new)", err))
    }

    /// Read a GPG key registration; `Ok(None)` if it does not exist.
    pub async fn read_gpg_key(&self, key_id: &str) -> Result<Option<GpgKeyState>, SyncError> {
        let handle = self.locks.class(ObjectClass::GpgKey);
        let _guard = handle.read().await;

        match self.remote.get_gpg_key(key_id).await {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(SyncError::remote(
                Action::Read,
                ObjectClass::GpgKey,
                key_id,
                err,
            )),
        }
    }

    /// List all GPG key registrations.
    pub async fn list_gpg_keys(&self) -> Result<Vec<GpgKeyState>, SyncError> {
        let handle = self.locks.class(ObjectClass::GpgKey);
        let _guard = handle.read().await;

        self.remote
            .list_gpg_keys()
            .await
            .map_err(|err| SyncError::remote(Action::Read, ObjectClass::GpgKey, "*", err))
    }

    /// Remove a GPG key registration; removing an absent one succeeds.
    pub async fn delete_gpg_key(&self, key_id: &str) -> Result<(), SyncError> {
        let handle = self.locks.class(ObjectClass::GpgKey);
        let _guard = handle.write().await;

        debug!(key = %key_id, "deleting gpg key");
        match self.remote.delete_gpg_key(key_id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(SyncError::remote(
                Action::Delete,
                ObjectClass::GpgKey,
                key_id,
                err,
            )),
        }
    }
}
