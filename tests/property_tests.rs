//! Property-based tests for the composite identity codecs.
//!
//! These tests use proptest to verify the round-trip law
//! `decode(encode(x)) == x` across randomly generated inputs, and that
//! decoding arbitrary strings never panics.

use proptest::prelude::*;

use coxswain::sync::identity::{CertificateId, TokenId};

/// Strategy for host names: non-empty, no `/`.
fn host() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9.-]{0,30}"
}

/// Strategy for SSH key algorithm subtypes: non-empty, no `/`.
fn sub_type() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,20}"
}

/// Strategy for identity segments that must not contain `/`.
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._-]{1,20}"
}

proptest! {
    /// Any valid SSH certificate identity round-trips.
    #[test]
    fn ssh_certificate_identity_roundtrip(sub in sub_type(), host in host()) {
        let id = CertificateId::Ssh {
            sub_type: sub,
            host,
        };
        prop_assert_eq!(CertificateId::decode(&id.encode()).unwrap(), id);
    }

    /// Any valid HTTPS certificate identity round-trips.
    #[test]
    fn https_certificate_identity_roundtrip(host in host()) {
        let id = CertificateId::Https { host };
        prop_assert_eq!(CertificateId::decode(&id.encode()).unwrap(), id);
    }

    /// Deriving from wire parts and encoding agree with the canonical form.
    #[test]
    fn ssh_from_parts_matches_canonical_encoding(sub in sub_type(), host in host()) {
        let id = CertificateId::from_parts("ssh", &sub, &host).unwrap();
        prop_assert_eq!(id.encode(), format!("ssh/{}/{}", sub, host));
    }

    /// The HTTPS identity is independent of whatever subtype the remote
    /// stores alongside the material.
    #[test]
    fn https_identity_ignores_stored_subtype(sub in sub_type(), host in host()) {
        let with_subtype = CertificateId::from_parts("https", &sub, &host).unwrap();
        let without = CertificateId::from_parts("https", "", &host).unwrap();
        prop_assert_eq!(with_subtype, without);
    }

    /// Decoding arbitrary input returns an error or a value, never panics,
    /// and any accepted value re-encodes to a string that decodes to the
    /// same value.
    #[test]
    fn certificate_decode_never_panics(input in ".*") {
        if let Ok(id) = CertificateId::decode(&input) {
            prop_assert_eq!(CertificateId::decode(&id.encode()).unwrap(), id);
        }
    }

    /// Any valid token identity round-trips.
    #[test]
    fn token_identity_roundtrip(project in segment(), role in segment(), id in segment()) {
        let token = TokenId::new(project, role, id).unwrap();
        prop_assert_eq!(TokenId::decode(&token.encode()).unwrap(), token);
    }

    /// Token decoding of arbitrary input never panics.
    #[test]
    fn token_decode_never_panics(input in ".*") {
        if let Ok(token) = TokenId::decode(&input) {
            prop_assert_eq!(TokenId::decode(&token.encode()).unwrap(), token);
        }
    }

    /// Identities derived from desired specs and from observed wire parts
    /// compare equal exactly when their parts are equal.
    #[test]
    fn identity_equality_is_part_equality(
        sub_a in sub_type(), host_a in host(),
        sub_b in sub_type(), host_b in host(),
    ) {
        let a = CertificateId::from_parts("ssh", &sub_a, &host_a).unwrap();
        let b = CertificateId::from_parts("ssh", &sub_b, &host_b).unwrap();
        prop_assert_eq!(a == b, sub_a == sub_b && host_a == host_b);
    }
}
