//! sync::certificate
//!
//! Host-certificate operations, keyed by the certificate class lock.
//!
//! # Design
//!
//! The remote enforces uniqueness on the full (type, subtype, host)
//! triple, but the HTTPS identity scheme deliberately drops the subtype:
//! two HTTPS certificates must not coexist for one host even when the
//! remote would happily store both. That extra constraint is enforced
//! here, before any remote create call, by enumerating existing
//! certificates and deriving each one's identity with the same codec that
//! encodes the desired object's identity. Relying on the remote's own
//! rejection would leave its message text as the only distinguishing
//! signal.
//!
//! Certificates are immutable on the remote side; there is no update
//! operation. Replacement is delete + create, or create in adopt mode.

use tracing::{debug, warn};

use crate::remote::{CertificateSpec, CertificateState};
use crate::sync::errors::{Action, SyncError};
use crate::sync::identity::CertificateId;
use crate::sync::{ObjectClass, Reconciler};

/// Derive the identity of an observed certificate, skipping entries the
/// codec cannot interpret.
fn derived_identity(state: &CertificateState) -> Option<String> {
    match CertificateId::from_parts(&state.cert_type, &state.cert_sub_type, &state.server_name) {
        Ok(id) => Some(id.encode()),
        Err(err) => {
            warn!(host = %state.server_name, error = %err, "skipping certificate with underivable identity");
            None
        }
    }
}

impl Reconciler {
    /// Register a host certificate.
    ///
    /// Without `adopt`, the call fails with [`SyncError::Conflict`] if any
    /// existing certificate derives the same identity - checked locally
    /// before the remote create is issued. With `adopt`, pre-existing
    /// material is taken over and replaced.
    ///
    /// # Errors
    ///
    /// [`SyncError::Identity`] if the spec's type/subtype/host fields do
    /// not form a valid identity; [`SyncError::Conflict`] on collision.
    pub async fn create_certificate(
        &self,
        spec: CertificateSpec,
        adopt: bool,
    ) -> Result<CertificateState, SyncError> {
        let id = CertificateId::from_parts(&spec.cert_type, &spec.cert_sub_type, &spec.server_name)?;
        let identity = id.encode();

        let handle = self.locks.class(ObjectClass::Certificate);
        let _guard = handle.write().await;

        if !adopt {
            let existing = self.remote.list_certificates().await.map_err(|err| {
                SyncError::remote(Action::Create, ObjectClass::Certificate, &identity, err)
            })?;
            let collision = existing
                .iter()
                .filter_map(derived_identity)
                .any(|other| other == identity);
            if collision {
                return Err(SyncError::Conflict {
                    class: ObjectClass::Certificate,
                    identity,
                });
            }
        }

        debug!(certificate = %identity, adopt, "registering certificate");
        self.remote
            .create_certificate(spec, adopt)
            .await
            .map_err(|err| {
                SyncError::remote(Action::Create, ObjectClass::Certificate, &identity, err)
            })
    }

    /// Read a certificate by derived identity; `Ok(None)` if absent.
    ///
    /// The remote has no point read for certificates, so this lists and
    /// selects - with the same derivation the create pre-check uses.
    pub async fn read_certificate(
        &self,
        id: &CertificateId,
    ) -> Result<Option<CertificateState>, SyncError> {
        let identity = id.encode();
        let handle = self.locks.class(ObjectClass::Certificate);
        let _guard = handle.read().await;

        let all = self.remote.list_certificates().await.map_err(|err| {
            SyncError::remote(Action::Read, ObjectClass::Certificate, &identity, err)
        })?;
        Ok(all
            .into_iter()
            .find(|state| derived_identity(state).as_deref() == Some(identity.as_str())))
    }

    /// List all registered certificates.
    pub async fn list_certificates(&self) -> Result<Vec<CertificateState>, SyncError> {
        let handle = self.locks.class(ObjectClass::Certificate);
        let _guard = handle.read().await;

        self.remote
            .list_certificates()
            .await
            .map_err(|err| SyncError::remote(Action::Read, ObjectClass::Certificate, "*", err))
    }

    /// Remove a certificate by derived identity; removing an absent one
    /// succeeds.
    pub async fn delete_certificate(&self, id: &CertificateId) -> Result<(), SyncError> {
        let identity = id.encode();
        let handle = self.locks.class(ObjectClass::Certificate);
        let _guard = handle.write().await;

        debug!(certificate = %identity, "deleting certificate");
        match self
            .remote
            .delete_certificate(id.cert_type(), id.cert_sub_type(), id.host())
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(SyncError::remote(
                Action::Delete,
                ObjectClass::Certificate,
                &identity,
                err,
            )),
        }
    }
}
