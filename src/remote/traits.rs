//! remote::traits
//!
//! The `RemoteApi` trait: per-class operations against the remote system.
//!
//! # Design
//!
//! The trait is async because every operation involves network I/O, and it
//! is the single seam the reconciliation core calls through: production
//! wires in a real client, tests wire in [`crate::remote::mock::MockRemote`].
//!
//! Failures are typed, not stringly: the reconciler classifies errors with
//! a type switch (`is_not_found`, `is_transient`), so an implementation
//! must map its wire-level failures onto the right [`RemoteError`] variant
//! rather than relying on message text.
//!
//! # Example
//!
//! ```ignore
//! use coxswain::remote::{RemoteApi, RemoteError, RepositorySpec};
//!
//! async fn register(remote: &dyn RemoteApi) -> Result<(), RemoteError> {
//!     let repo = remote
//!         .create_repository(
//!             RepositorySpec {
//!                 url: "git@git.example.com:platform/infra.git".to_string(),
//!                 ..Default::default()
//!             },
//!             false,
//!         )
//!         .await?;
//!     println!("registered {} ({})", repo.url, repo.connection.status);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use super::types::{
    AccountState, CertificateSpec, CertificateState, GpgKeySpec, GpgKeyState, ProjectSpec,
    ProjectState, RepositoryCredentialsSpec, RepositoryCredentialsState, RepositorySpec,
    RepositoryState, TokenSpec, TokenState,
};

/// Errors from remote operations.
///
/// These variants are the contract the reconciler classifies against:
/// `NotFound` is recovered locally as absence, `UnknownHostKey` is the one
/// retryable transient condition, everything else is terminal on first
/// occurrence.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An object with the same identity already exists, or a version stamp
    /// no longer matches.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The remote does not yet recognize the host's trust material.
    ///
    /// Reported while a certificate registration for the host is still
    /// settling; the only failure the retry executor treats as transient.
    #[error("host key for '{0}' is not recognized")]
    UnknownHostKey(String),

    /// The caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other API-reported failure.
    #[error("API error: {status} - {message}")]
    Api {
        /// Status code reported by the remote
        status: u16,
        /// Error message reported by the remote
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),
}

impl RemoteError {
    /// True for absence, which reads and deletes recover from locally.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }

    /// True for the single condition the retry executor may re-attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::UnknownHostKey(_))
    }

    /// True for duplicate-identity or version-stamp rejections.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Conflict(_))
    }
}

/// Per-class operations against the remote system.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the reconciler shares one client
/// across concurrent calls.
///
/// # Semantics
///
/// - `create_*` operations reject duplicates with [`RemoteError::Conflict`]
///   unless `upsert` is passed where supported
/// - `get_*`/`delete_*` report absence as [`RemoteError::NotFound`]; the
///   reconciler decides whether absence is an error
/// - `update_project` takes the version stamp observed before the update
///   and fails with [`RemoteError::Conflict`] if the remote has moved on
/// - Certificates have no point read on the wire; callers list and filter
#[async_trait]
pub trait RemoteApi: Send + Sync {
    // Projects

    /// Create a project from the given spec.
    async fn create_project(&self, spec: ProjectSpec) -> Result<ProjectState, RemoteError>;

    /// Fetch a project by name.
    async fn get_project(&self, name: &str) -> Result<ProjectState, RemoteError>;

    /// List all projects.
    async fn list_projects(&self) -> Result<Vec<ProjectState>, RemoteError>;

    /// Replace a project's spec, guarded by the observed version stamp.
    async fn update_project(
        &self,
        spec: ProjectSpec,
        version: String,
    ) -> Result<ProjectState, RemoteError>;

    /// Delete a project by name.
    async fn delete_project(&self, name: &str) -> Result<(), RemoteError>;

    // Project role tokens

    /// Issue a token against a project role.
    ///
    /// The issued token is also recorded on the role's `jwt_tokens`
    /// collection on the remote side.
    async fn create_project_token(
        &self,
        project: &str,
        role: &str,
        spec: TokenSpec,
    ) -> Result<TokenState, RemoteError>;

    /// Revoke a token issued against a project role.
    async fn delete_project_token(
        &self,
        project: &str,
        role: &str,
        id: &str,
    ) -> Result<(), RemoteError>;

    // Repositories

    /// Register a repository. With `upsert`, an existing registration for
    /// the same URL is replaced instead of rejected.
    async fn create_repository(
        &self,
        spec: RepositorySpec,
        upsert: bool,
    ) -> Result<RepositoryState, RemoteError>;

    /// Fetch a repository registration by URL.
    async fn get_repository(&self, url: &str) -> Result<RepositoryState, RemoteError>;

    /// List all repository registrations.
    async fn list_repositories(&self) -> Result<Vec<RepositoryState>, RemoteError>;

    /// Replace a repository registration.
    async fn update_repository(&self, spec: RepositorySpec) -> Result<RepositoryState, RemoteError>;

    /// Remove a repository registration by URL.
    async fn delete_repository(&self, url: &str) -> Result<(), RemoteError>;

    // Repository credential templates

    /// Create a credential template. With `upsert`, an existing template
    /// for the same URL prefix is replaced.
    async fn create_credentials(
        &self,
        spec: RepositoryCredentialsSpec,
        upsert: bool,
    ) -> Result<RepositoryCredentialsState, RemoteError>;

    /// Fetch a credential template by URL prefix.
    async fn get_credentials(&self, url: &str) -> Result<RepositoryCredentialsState, RemoteError>;

    /// List all credential templates.
    async fn list_credentials(&self) -> Result<Vec<RepositoryCredentialsState>, RemoteError>;

    /// Replace a credential template.
    async fn update_credentials(
        &self,
        spec: RepositoryCredentialsSpec,
    ) -> Result<RepositoryCredentialsState, RemoteError>;

    /// Remove a credential template by URL prefix.
    async fn delete_credentials(&self, url: &str) -> Result<(), RemoteError>;

    // Host certificates

    /// Register a host certificate. With `upsert`, existing material for
    /// the same (type, subtype, host) is replaced.
    async fn create_certificate(
        &self,
        spec: CertificateSpec,
        upsert: bool,
    ) -> Result<CertificateState, RemoteError>;

    /// List all registered host certificates.
    async fn list_certificates(&self) -> Result<Vec<CertificateState>, RemoteError>;

    /// Remove host certificates matching (type, host), narrowed to one
    /// subtype when `cert_sub_type` is non-empty.
    async fn delete_certificate(
        &self,
        cert_type: &str,
        cert_sub_type: &str,
        server_name: &str,
    ) -> Result<(), RemoteError>;

    // GPG keys

    /// Register a GPG public key; the remote derives the key id.
    async fn create_gpg_key(&self, spec: GpgKeySpec) -> Result<GpgKeyState, RemoteError>;

    /// Fetch a GPG key registration by key id.
    async fn get_gpg_key(&self, key_id: &str) -> Result<GpgKeyState, RemoteError>;

    /// List all GPG key registrations.
    async fn list_gpg_keys(&self) -> Result<Vec<GpgKeyState>, RemoteError>;

    /// Remove a GPG key registration by key id.
    async fn delete_gpg_key(&self, key_id: &str) -> Result<(), RemoteError>;

    // Accounts

    /// Fetch an account by name.
    async fn get_account(&self, name: &str) -> Result<AccountState, RemoteError>;

    /// List all accounts.
    async fn list_accounts(&self) -> Result<Vec<AccountState>, RemoteError>;

    /// Issue a token for an account.
    async fn create_account_token(
        &self,
        account: &str,
        spec: TokenSpec,
    ) -> Result<TokenState, RemoteError>;

    /// Revoke an account token.
    async fn delete_account_token(&self, account: &str, id: &str) -> Result<(), RemoteError>;
}
