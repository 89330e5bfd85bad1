//! sync::merge
//!
//! Merging remote-managed state into a requested update.
//!
//! # Design
//!
//! A project update is effectively a three-way merge in which only one
//! side - the remote-managed side - is ever allowed to win, and only for
//! specific sub-fields. The policy is an explicit rule list rather than
//! inline field copies, so it is unit-testable without any network
//! machinery and the set of protected paths is visible in one place.
//!
//! Today a single rule exists: tokens issued against a project role are
//! owned by the token reconciliation path, so a desired role that lists no
//! tokens (the normal case - callers do not track issued credentials in
//! configuration) must not translate into deleting them.

use crate::remote::{ProjectSpec, ProjectState};

/// Sub-fields of a project payload whose value is always taken from the
/// observed object during an update merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedWins {
    /// The `jwt_tokens` collection of every role that exists on both sides.
    RoleTokens,
}

/// The rules applied to every project update.
pub const PROJECT_OBSERVED_WINS: &[ObservedWins] = &[ObservedWins::RoleTokens];

/// Build the outgoing update payload from the desired spec and the
/// currently observed state.
///
/// For every rule in `rules`, the observed value replaces the desired one:
///
/// - [`ObservedWins::RoleTokens`]: each desired role found by name in the
///   observed object takes the observed role's token collection wholesale.
///   A desired role with no observed counterpart is newly added and kept
///   as-is; an observed role absent from the desired spec is being removed,
///   and its tokens go with it.
pub fn project_update_payload(
    desired: &ProjectSpec,
    observed: &ProjectState,
    rules: &[ObservedWins],
) -> ProjectSpec {
    let mut payload = desired.clone();
    for rule in rules {
        match rule {
            ObservedWins::RoleTokens => {
                for role in &mut payload.roles {
                    if let Some(existing) = observed.role(&role.name) {
                        role.jwt_tokens = existing.jwt_tokens.clone();
                    }
                }
            }
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{JwtToken, RoleSpec};
    use chrono::Utc;

    fn role(name: &str, token_ids: &[&str]) -> RoleSpec {
        RoleSpec {
            name: name.to_string(),
            description: None,
            policies: vec![],
            groups: vec![],
            jwt_tokens: token_ids
                .iter()
                .map(|id| JwtToken {
                    id: id.to_string(),
                    issued_at: Utc::now(),
                    expires_at: None,
                })
                .collect(),
        }
    }

    fn project(roles: Vec<RoleSpec>) -> ProjectSpec {
        ProjectSpec {
            name: "payments".to_string(),
            description: None,
            source_repos: vec![],
            destinations: vec![],
            roles,
        }
    }

    fn observed(roles: Vec<RoleSpec>) -> ProjectState {
        ProjectState {
            spec: project(roles),
            version: "3".to_string(),
            deletion: None,
        }
    }

    #[test]
    fn observed_tokens_survive_a_tokenless_desired_role() {
        let desired = project(vec![role("admin", &[])]);
        let observed = observed(vec![role("admin", &["t-1", "t-2"])]);

        let payload = project_update_payload(&desired, &observed, PROJECT_OBSERVED_WINS);

        let merged = payload.role("admin").unwrap();
        assert_eq!(merged.jwt_tokens.len(), 2);
        assert_eq!(merged.jwt_tokens[0].id, "t-1");
        assert_eq!(merged.jwt_tokens[1].id, "t-2");
    }

    #[test]
    fn observed_tokens_replace_whatever_the_caller_listed() {
        let desired = project(vec![role("admin", &["stale"])]);
        let observed = observed(vec![role("admin", &["t-1"])]);

        let payload = project_update_payload(&desired, &observed, PROJECT_OBSERVED_WINS);

        let merged = payload.role("admin").unwrap();
        assert_eq!(merged.jwt_tokens.len(), 1);
        assert_eq!(merged.jwt_tokens[0].id, "t-1");
    }

    #[test]
    fn newly_added_role_is_kept_as_is() {
        let desired = project(vec![role("admin", &[]), role("ci", &[])]);
        let observed = observed(vec![role("admin", &["t-1"])]);

        let payload = project_update_payload(&desired, &observed, PROJECT_OBSERVED_WINS);

        assert_eq!(payload.role("admin").unwrap().jwt_tokens.len(), 1);
        assert!(payload.role("ci").unwrap().jwt_tokens.is_empty());
    }

    #[test]
    fn removed_role_takes_its_tokens_with_it() {
        let desired = project(vec![]);
        let observed = observed(vec![role("admin", &["t-1"])]);

        let payload = project_update_payload(&desired, &observed, PROJECT_OBSERVED_WINS);

        assert!(payload.roles.is_empty());
    }

    #[test]
    fn empty_rule_list_leaves_the_desired_spec_untouched() {
        let desired = project(vec![role("admin", &[])]);
        let observed = observed(vec![role("admin", &["t-1"])]);

        let payload = project_update_payload(&desired, &observed, &[]);

        assert!(payload.role("admin").unwrap().jwt_tokens.is_empty());
        assert_eq!(payload, desired);
    }

    #[test]
    fn non_token_fields_come_from_the_desired_side() {
        let mut desired_role = role("admin", &[]);
        desired_role.policies = vec!["allow sync".to_string()];
        let desired = project(vec![desired_role]);

        let mut observed_role = role("admin", &["t-1"]);
        observed_role.policies = vec!["deny everything".to_string()];
        let observed = observed(vec![observed_role]);

        let payload = project_update_payload(&desired, &observed, PROJECT_OBSERVED_WINS);

        let merged = payload.role("admin").unwrap();
        assert_eq!(merged.policies, vec!["allow sync".to_string()]);
        assert_eq!(merged.jwt_tokens.len(), 1);
    }
}
