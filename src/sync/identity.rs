//! sync::identity
//!
//! Stable string identities for objects whose natural key is multi-part.
//!
//! # Design
//!
//! Composite keys round-trip through a single canonical string form used
//! both as the object's externally visible primary key and for duplicate
//! detection: the reconciler derives the identity of every enumerated
//! remote object with the same code that encodes a desired object's
//! identity, so equality means the same thing on both sides.
//!
//! Two schemes exist:
//!
//! - [`CertificateId`]: `ssh/<subtype>/<host>` for SSH host keys,
//!   `https/<host>` for TLS certificates. The HTTPS form deliberately has
//!   no subtype segment, so two HTTPS certificates cannot coexist for one
//!   host even when the remote stores them with different subtypes.
//! - [`TokenId`]: `<project>/<role>/<id>` for tokens issued against a
//!   project role.
//!
//! Decoding rejects malformed input (wrong segment count, empty segments,
//! unknown type tags) with a descriptive error; `decode(encode(x)) == x`
//! for every valid `x`.
//!
//! # Example
//!
//! ```
//! use coxswain::sync::identity::CertificateId;
//!
//! let id = CertificateId::Ssh {
//!     sub_type: "ssh-ed25519".to_string(),
//!     host: "git.example.com".to_string(),
//! };
//! assert_eq!(id.encode(), "ssh/ssh-ed25519/git.example.com");
//! assert_eq!(CertificateId::decode("ssh/ssh-ed25519/git.example.com").unwrap(), id);
//!
//! // The HTTPS form has no subtype segment.
//! assert!(CertificateId::decode("https/extra/git.example.com").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from identity derivation and parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The type tag is neither `ssh` nor `https`.
    #[error("unknown certificate type '{0}' (expected 'ssh' or 'https')")]
    UnknownCertType(String),

    /// The identity string does not match its scheme.
    #[error("malformed {kind} identity '{value}': {reason}")]
    Malformed {
        /// Which scheme was being parsed
        kind: &'static str,
        /// The offending input
        value: String,
        /// What rule it broke
        reason: &'static str,
    },
}

/// Composite identity of a host certificate registration.
///
/// Serialized as its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CertificateId {
    /// An SSH host key: keyed by key algorithm and host.
    Ssh { sub_type: String, host: String },
    /// A TLS certificate: keyed by host alone.
    Https { host: String },
}

impl CertificateId {
    /// Derive the identity from the raw wire fields of an observed or
    /// desired certificate.
    ///
    /// The HTTPS scheme ignores `cert_sub_type` entirely: whatever subtype
    /// the remote stores, all HTTPS material for one host shares one
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnknownCertType`] for any other type tag,
    /// and [`IdentityError::Malformed`] for empty host or (for SSH) empty
    /// subtype.
    pub fn from_parts(
        cert_type: &str,
        cert_sub_type: &str,
        server_name: &str,
    ) -> Result<Self, IdentityError> {
        if server_name.is_empty() {
            return Err(IdentityError::Malformed {
                kind: "certificate",
                value: format!("{}/{}/{}", cert_type, cert_sub_type, server_name),
                reason: "host must not be empty",
            });
        }
        match cert_type {
            "ssh" => {
                if cert_sub_type.is_empty() {
                    return Err(IdentityError::Malformed {
                        kind: "certificate",
                        value: format!("ssh//{}", server_name),
                        reason: "ssh identity requires a subtype",
                    });
                }
                Ok(CertificateId::Ssh {
                    sub_type: cert_sub_type.to_string(),
                    host: server_name.to_string(),
                })
            }
            "https" => Ok(CertificateId::Https {
                host: server_name.to_string(),
            }),
            other => Err(IdentityError::UnknownCertType(other.to_string())),
        }
    }

    /// Canonical string form: `ssh/<subtype>/<host>` or `https/<host>`.
    pub fn encode(&self) -> String {
        match self {
            CertificateId::Ssh { sub_type, host } => format!("ssh/{}/{}", sub_type, host),
            CertificateId::Https { host } => format!("https/{}", host),
        }
    }

    /// Parse the canonical string form.
    ///
    /// # Errors
    ///
    /// Rejects unknown type tags, wrong segment counts for the declared
    /// type, and empty segments.
    pub fn decode(identity: &str) -> Result<Self, IdentityError> {
        let malformed = |reason| IdentityError::Malformed {
            kind: "certificate",
            value: identity.to_string(),
            reason,
        };
        let mut segments = identity.split('/');
        let cert_type = segments.next().unwrap_or_default();
        match cert_type {
            "ssh" => {
                let sub_type = segments.next().ok_or(malformed(
                    "ssh identity takes exactly three segments",
                ))?;
                let host = segments.next().ok_or(malformed(
                    "ssh identity takes exactly three segments",
                ))?;
                if segments.next().is_some() {
                    return Err(malformed("ssh identity takes exactly three segments"));
                }
                if sub_type.is_empty() || host.is_empty() {
                    return Err(malformed("segments must not be empty"));
                }
                Ok(CertificateId::Ssh {
                    sub_type: sub_type.to_string(),
                    host: host.to_string(),
                })
            }
            "https" => {
                let host = segments
                    .next()
                    .ok_or(malformed("https identity takes exactly two segments"))?;
                if segments.next().is_some() {
                    return Err(malformed("https identity takes exactly two segments"));
                }
                if host.is_empty() {
                    return Err(malformed("segments must not be empty"));
                }
                Ok(CertificateId::Https {
                    host: host.to_string(),
                })
            }
            other => Err(IdentityError::UnknownCertType(other.to_string())),
        }
    }

    /// The host the certificate is registered for.
    pub fn host(&self) -> &str {
        match self {
            CertificateId::Ssh { host, .. } => host,
            CertificateId::Https { host } => host,
        }
    }

    /// The wire-level type tag.
    pub fn cert_type(&self) -> &'static str {
        match self {
            CertificateId::Ssh { .. } => "ssh",
            CertificateId::Https { .. } => "https",
        }
    }

    /// The wire-level subtype; empty for HTTPS.
    pub fn cert_sub_type(&self) -> &str {
        match self {
            CertificateId::Ssh { sub_type, .. } => sub_type,
            CertificateId::Https { .. } => "",
        }
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl std::str::FromStr for CertificateId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for CertificateId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<CertificateId> for String {
    fn from(id: CertificateId) -> Self {
        id.encode()
    }
}

/// Composite identity of a token issued against a project role.
///
/// Serialized as its canonical string form `<project>/<role>/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId {
    pub project: String,
    pub role: String,
    pub id: String,
}

impl TokenId {
    /// Build a token identity from its parts.
    ///
    /// # Errors
    ///
    /// Parts must be non-empty, and project and role names cannot contain
    /// the `/` separator.
    pub fn new(
        project: impl Into<String>,
        role: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let token = TokenId {
            project: project.into(),
            role: role.into(),
            id: id.into(),
        };
        let malformed = |reason| IdentityError::Malformed {
            kind: "token",
            value: token.encode_unchecked(),
            reason,
        };
        if token.project.is_empty() || token.role.is_empty() || token.id.is_empty() {
            return Err(malformed("segments must not be empty"));
        }
        if token.project.contains('/') || token.role.contains('/') || token.id.contains('/') {
            return Err(malformed("segments must not contain '/'"));
        }
        Ok(token)
    }

    fn encode_unchecked(&self) -> String {
        format!("{}/{}/{}", self.project, self.role, self.id)
    }

    /// Canonical string form: `<project>/<role>/<id>`.
    pub fn encode(&self) -> String {
        self.encode_unchecked()
    }

    /// Parse the canonical string form.
    ///
    /// # Errors
    ///
    /// Rejects anything but exactly three non-empty segments.
    pub fn decode(identity: &str) -> Result<Self, IdentityError> {
        let malformed = |reason| IdentityError::Malformed {
            kind: "token",
            value: identity.to_string(),
            reason,
        };
        let segments: Vec<&str> = identity.split('/').collect();
        if segments.len() != 3 {
            return Err(malformed("token identity takes exactly three segments"));
        }
        let (project, role, id) = (segments[0], segments[1], segments[2]);
        if project.is_empty() || role.is_empty() || id.is_empty() {
            return Err(malformed("segments must not be empty"));
        }
        Ok(TokenId {
            project: project.to_string(),
            role: role.to_string(),
            id: id.to_string(),
        })
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl std::str::FromStr for TokenId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for TokenId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> Self {
        id.encode()
    }
}
