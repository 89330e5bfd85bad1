//! sync
//!
//! The reconciliation core: everything between a desired object descriptor
//! and the remote calls that realize it.
//!
//! # Architecture
//!
//! Leaves first:
//!
//! - [`locks`] - Keyed read/write locking ([`LockRegistry`]): fixed
//!   class-level locks plus lazily created per-project locks
//! - [`retry`] - The bounded retry executor ([`retry::RetryPolicy`]) for the
//!   one identifiable transient creation failure
//! - [`identity`] - Composite identity codecs ([`identity::CertificateId`],
//!   [`identity::TokenId`]) used for deduplication and as primary keys
//! - [`merge`] - The observed-wins merge that keeps remote-issued role
//!   tokens alive across project updates
//! - [`errors`] - The typed boundary error ([`SyncError`]) carrying action,
//!   class and identity context
//!
//! On top sits the [`Reconciler`], which exposes per-class create, read,
//! update and delete operations. Every mutating call follows the same
//! shape: acquire the right lock, pre-check uniqueness where the remote's
//! own enforcement is not enough, dispatch (through the retry executor
//! where the call is known to fail transiently), reconcile drift, and
//! release through guard drop on every exit path.
//!
//! # Concurrency
//!
//! Calls run on whatever executor the embedding system supplies. Writes on
//! the same (class, identity) key are mutually exclusive; reads interleave
//! with reads. Operations on different identities of the same class, and
//! on different classes, proceed fully in parallel.

pub mod errors;
pub mod identity;
pub mod locks;
pub mod merge;
pub mod retry;

mod account;
mod certificate;
mod credentials;
mod gpg;
mod project;
mod reconciler;
mod repository;

pub use errors::{Action, SyncError};
pub use locks::LockRegistry;
pub use reconciler::{Reconciler, DEFAULT_RETRY_BUDGET};

/// The categories of remote object this core manages.
///
/// The class determines which lock applies and which identity scheme names
/// an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Project,
    Repository,
    RepositoryCredentials,
    Certificate,
    GpgKey,
    Account,
    Token,
}

impl ObjectClass {
    /// Every class, in a fixed order.
    pub const ALL: [ObjectClass; 7] = [
        ObjectClass::Project,
        ObjectClass::Repository,
        ObjectClass::RepositoryCredentials,
        ObjectClass::Certificate,
        ObjectClass::GpgKey,
        ObjectClass::Account,
        ObjectClass::Token,
    ];

    /// Kebab-case class name used in lock keys and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Project => "project",
            ObjectClass::Repository => "repository",
            ObjectClass::RepositoryCredentials => "repository-credentials",
            ObjectClass::Certificate => "certificate",
            ObjectClass::GpgKey => "gpg-key",
            ObjectClass::Account => "account",
            ObjectClass::Token => "token",
        }
    }
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
