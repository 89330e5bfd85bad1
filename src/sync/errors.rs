//! sync::errors
//!
//! The typed error crossing the reconciler boundary.
//!
//! # Design
//!
//! Every error is annotated with the action attempted, the object class and
//! the identity involved, so the caller can present a precise diagnosis
//! without re-deriving context. Absence is not represented here: reads
//! return `Ok(None)` and deletes return `Ok(())` for already-absent
//! objects, so `NotFound` from the remote never escapes this boundary on
//! those paths.

use std::time::Duration;

use thiserror::Error;

use crate::remote::RemoteError;
use crate::sync::identity::IdentityError;
use crate::sync::ObjectClass;

/// The operation a reconciler call was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Read => write!(f, "read"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Errors from reconciler operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An object with the same derived identity already exists.
    ///
    /// Raised by the local uniqueness pre-check or by the remote's own
    /// duplicate/version rejection; terminal either way.
    #[error("{class} '{identity}' already exists")]
    Conflict {
        class: ObjectClass,
        identity: String,
    },

    /// The retry budget elapsed while only transient failures were observed.
    #[error("{action} {class} '{identity}' timed out after {budget:?}: {last}")]
    Timeout {
        action: Action,
        class: ObjectClass,
        identity: String,
        budget: Duration,
        last: RemoteError,
    },

    /// Any other remote failure, surfaced verbatim with context.
    #[error("{action} {class} '{identity}' failed: {source}")]
    Remote {
        action: Action,
        class: ObjectClass,
        identity: String,
        #[source]
        source: RemoteError,
    },

    /// A composite identity could not be derived or parsed.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl SyncError {
    /// Build the boundary error for a remote failure, folding the remote's
    /// own duplicate rejection into [`SyncError::Conflict`].
    pub(crate) fn remote(
        action: Action,
        class: ObjectClass,
        identity: &str,
        source: RemoteError,
    ) -> Self {
        if source.is_conflict() {
            return SyncError::Conflict {
                class,
                identity: identity.to_string(),
            };
        }
        SyncError::Remote {
            action,
            class,
            identity: identity.to_string(),
            source,
        }
    }

    /// True if the operation lost to an existing object or a newer version.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Conflict { .. })
    }

    /// True if the retry budget ran out on transient failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_display() {
        assert_eq!(Action::Create.to_string(), "create");
        assert_eq!(Action::Read.to_string(), "read");
        assert_eq!(Action::Update.to_string(), "update");
        assert_eq!(Action::Delete.to_string(), "delete");
    }

    #[test]
    fn remote_error_carries_full_context() {
        let err = SyncError::remote(
            Action::Update,
            ObjectClass::Repository,
            "https://git.example.com/infra.git",
            RemoteError::Api {
                status: 500,
                message: "internal".into(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("update"));
        assert!(msg.contains("repository"));
        assert!(msg.contains("https://git.example.com/infra.git"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn remote_conflict_folds_into_conflict_variant() {
        let err = SyncError::remote(
            Action::Create,
            ObjectClass::Project,
            "payments",
            RemoteError::Conflict("project 'payments' already exists".into()),
        );
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "project 'payments' already exists");
    }

    #[test]
    fn timeout_message_names_budget_and_cause() {
        let err = SyncError::Timeout {
            action: Action::Create,
            class: ObjectClass::Repository,
            identity: "git@git.example.com:infra.git".into(),
            budget: Duration::from_secs(30),
            last: RemoteError::UnknownHostKey("git.example.com".into()),
        };
        assert!(err.is_timeout());
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("30s"));
        assert!(msg.contains("git.example.com"));
    }
}
