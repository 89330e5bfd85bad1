//! remote::types
//!
//! Request and state structs for every object class managed through the
//! remote API.
//!
//! # Design
//!
//! Spec structs (`*Spec`) describe the desired end state supplied by the
//! caller; state structs (`*State`) describe what the remote system
//! currently reports. Both derive serde so the caller can persist observed
//! state as its new baseline after each reconciler call. Secrets (passwords,
//! private keys) appear only in spec structs; the remote never echoes them
//! back in state.
//!
//! Certificate fields are carried as the raw strings the wire uses
//! (`cert_type`, `cert_sub_type`, `server_name`); the typed composite
//! identity lives in [`crate::sync::identity`] and is derived from these
//! parts by the reconciler.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired state of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Project name (unique within the remote system).
    pub name: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Repository URLs this project may deploy from.
    #[serde(default)]
    pub source_repos: Vec<String>,
    /// Deployment destinations this project may target.
    #[serde(default)]
    pub destinations: Vec<Destination>,
    /// Roles defined on the project.
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
}

impl ProjectSpec {
    /// Look up a role by name.
    pub fn role(&self, name: &str) -> Option<&RoleSpec> {
        self.roles.iter().find(|r| r.name == name)
    }
}

/// A deployment destination: cluster endpoint plus namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub server: String,
    pub namespace: String,
}

/// A role defined on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Role name (unique within the project).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Policy grants attached to the role.
    #[serde(default)]
    pub policies: Vec<String>,
    /// OIDC groups mapped onto the role.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Tokens issued against this role.
    ///
    /// Issued out-of-band by a different reconciliation path; callers
    /// normally leave this empty and the reconciler carries the observed
    /// collection forward on update.
    #[serde(default)]
    pub jwt_tokens: Vec<JwtToken>,
}

/// An issued token as recorded on a project role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtToken {
    /// Token identifier (unique within the role).
    pub id: String,
    /// Issuance timestamp.
    pub issued_at: DateTime<Utc>,
    /// Expiry timestamp, if the token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Observed state of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    /// The remotely stored spec, including remote-managed sub-fields.
    pub spec: ProjectSpec,
    /// Remote-assigned version stamp for optimistic-concurrency updates.
    pub version: String,
    /// Set while the remote system is still tearing the project down after
    /// a delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion: Option<PendingDeletion>,
}

impl ProjectState {
    /// Look up a role by name in the observed spec.
    pub fn role(&self, name: &str) -> Option<&RoleSpec> {
        self.spec.role(name)
    }
}

/// Deletion-pending marker with the remote-reported grace period.
///
/// While present, the project's name remains reserved; a create for the
/// same name must wait out `grace_period` before it can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeletion {
    pub grace_period: Duration,
}

/// Desired state of a repository registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    /// Repository URL; the repository's natural key.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,
    /// Skip server certificate verification.
    #[serde(default)]
    pub insecure: bool,
    /// Enable Git LFS for this repository.
    #[serde(default)]
    pub enable_lfs: bool,
}

/// Observed state of a repository registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub enable_lfs: bool,
    /// Result of the remote's most recent connection probe.
    pub connection: ConnectionState,
}

/// Remote-reported connection probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Connection probe status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Successful,
    Failed,
    Unknown,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Successful => write!(f, "successful"),
            ConnectionStatus::Failed => write!(f, "failed"),
            ConnectionStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Desired state of a credential template.
///
/// Credentials apply to every repository whose URL starts with `url`;
/// the prefix is the template's natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryCredentialsSpec {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,
}

/// Observed state of a credential template. Secrets are never echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryCredentialsState {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Desired state of a host certificate registration.
///
/// `cert_type` is `"ssh"` or `"https"`; `cert_sub_type` carries the SSH key
/// algorithm (e.g. `"ssh-ed25519"`) and is empty for HTTPS certificates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSpec {
    pub server_name: String,
    pub cert_type: String,
    #[serde(default)]
    pub cert_sub_type: String,
    /// Raw certificate material: a known-hosts entry for SSH, PEM for HTTPS.
    pub cert_data: String,
}

/// Observed state of a host certificate registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateState {
    pub server_name: String,
    pub cert_type: String,
    #[serde(default)]
    pub cert_sub_type: String,
    /// Remote-computed summary of the stored material (fingerprint).
    pub cert_info: String,
}

/// Desired state of a GPG public key registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgKeySpec {
    /// ASCII-armored public key material.
    pub key_data: String,
}

/// Observed state of a GPG public key registration.
///
/// The remote assigns `key_id` and `fingerprint` from the key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgKeyState {
    pub key_id: String,
    pub fingerprint: String,
    pub owner: String,
    pub key_data: String,
}

/// Observed state of an account.
///
/// Accounts are provisioned on the remote side; this layer reads them and
/// issues tokens against them but never creates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub capabilities: Vec<AccountCapability>,
}

/// Capability flags on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountCapability {
    Login,
    ApiKey,
}

impl std::fmt::Display for AccountCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountCapability::Login => write!(f, "login"),
            AccountCapability::ApiKey => write!(f, "apiKey"),
        }
    }
}

/// Request to issue a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    /// Caller-chosen token id; the remote assigns one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Requested lifetime; tokens without one never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<Duration>,
}

/// An issued token, returned exactly once at issuance.
///
/// `token` is the bearer credential itself; the remote only stores its
/// metadata afterwards, so callers must persist it here or lose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub id: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}
