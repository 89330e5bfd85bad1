//! sync::project
//!
//! Project operations, keyed by the per-project lock.
//!
//! # Invariants
//!
//! - Two operations on the same project name always serialize, whatever
//!   their kind; two different projects never block each other
//! - An update never drops tokens issued against a role out-of-band: the
//!   observed token collection wins over the desired one (see
//!   [`crate::sync::merge`])
//! - A create targeting a name whose remote object is still
//!   deletion-pending waits out the reported grace period before
//!   dispatching
//! - Tokens issued against a project role take the owning project's lock,
//!   so issuance serializes with project updates

use tracing::debug;

use crate::remote::{ProjectSpec, ProjectState, TokenSpec, TokenState};
use crate::sync::errors::{Action, SyncError};
use crate::sync::identity::TokenId;
use crate::sync::merge::{project_update_payload, PROJECT_OBSERVED_WINS};
use crate::sync::{ObjectClass, Reconciler};

impl Reconciler {
    /// Create a project.
    ///
    /// If the remote still reports an object of the same name as
    /// deletion-pending, the call sleeps for the reported grace period
    /// before dispatching, so the create does not race the remote's own
    /// asynchronous teardown.
    ///
    /// # Errors
    ///
    /// [`SyncError::Conflict`] if a live project of the same name exists;
    /// any other remote failure is surfaced with context.
    pub async fn create_project(&self, spec: ProjectSpec) -> Result<ProjectState, SyncError> {
        let handle = self.locks.project(&spec.name);
        let _guard = handle.write().await;

        match self.remote.get_project(&spec.name).await {
            Ok(existing) => {
                if let Some(pending) = existing.deletion {
                    debug!(
                        project = %spec.name,
                        grace = ?pending.grace_period,
                        "name still draining from a previous delete, waiting"
                    );
                    tokio::time::sleep(pending.grace_period).await;
                }
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => {
                return Err(SyncError::remote(
                    Action::Create,
                    ObjectClass::Project,
                    &spec.name,
                    err,
                ))
            }
        }

        let name = spec.name.clone();
        debug!(project = %name, "creating project");
        self.remote
            .create_project(spec)
            .await
            .map_err(|err| SyncError::remote(Action::Create, ObjectClass::Project, &name, err))
    }

    /// Read a project; `Ok(None)` if it does not exist.
    pub async fn read_project(&self, name: &str) -> Result<Option<ProjectState>, SyncError> {
        let handle = self.locks.project(name);
        let _guard = handle.read().await;

        match self.remote.get_project(name).await {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(SyncError::remote(
                Action::Read,
                ObjectClass::Project,
                name,
                err,
            )),
        }
    }

    /// List all projects.
    ///
    /// Listing spans names, so it takes the project class-level read lock
    /// rather than any per-name lock; it is a snapshot read and does not
    /// serialize against single-name writers.
    pub async fn list_projects(&self) -> Result<Vec<ProjectState>, SyncError> {
        let handle = self.locks.class(ObjectClass::Project);
        let _guard = handle.read().await;

        self.remote
            .list_projects()
            .await
            .map_err(|err| SyncError::remote(Action::Read, ObjectClass::Project, "*", err))
    }

    /// Update a project to match the desired spec.
    ///
    /// The currently observed object is fetched under the project write
    /// lock; remote-managed sub-fields (role token collections) are folded
    /// into the outgoing payload and the observed version stamp is echoed
    /// so a concurrent out-of-band change is rejected by the remote rather
    /// than clobbered.
    ///
    /// # Errors
    ///
    /// Updating an absent project is an error, unlike reading or deleting
    /// one. A stale version stamp surfaces as [`SyncError::Conflict`].
    pub async fn update_project(&self, spec: ProjectSpec) -> Result<ProjectState, SyncError> {
        let handle = self.locks.project(&spec.name);
        let _guard = handle.write().await;

        let observed = self.remote.get_project(&spec.name).await.map_err(|err| {
            SyncError::remote(Action::Update, ObjectClass::Project, &spec.name, err)
        })?;

        let payload = project_update_payload(&spec, &observed, PROJECT_OBSERVED_WINS);
        debug!(project = %spec.name, version = %observed.version, "updating project");
        self.remote
            .update_project(payload, observed.version)
            .await
            .map_err(|err| {
                SyncError::remote(Action::Update, ObjectClass::Project, &spec.name, err)
            })
    }

    /// Delete a project; deleting an absent project succeeds.
    pub async fn delete_project(&self, name: &str) -> Result<(), SyncError> {
        let handle = self.locks.project(name);
        let _guard = handle.write().await;

        debug!(project = %name, "deleting project");
        match self.remote.delete_project(name).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(SyncError::remote(
                Action::Delete,
                ObjectClass::Project,
                name,
                err,
            )),
        }
    }

    /// Issue a token against a project role.
    ///
    /// Serializes on the owning project's lock, so issuance never
    /// interleaves with a project update that would otherwise race the
    /// role's token collection.
    pub async fn create_project_token(
        &self,
        project: &str,
        role: &str,
        spec: TokenSpec,
    ) -> Result<TokenState, SyncError> {
        let handle = self.locks.project(project);
        let _guard = handle.write().await;

        let identity = format!("{}/{}", project, role);
        debug!(token = %identity, "issuing project role token");
        self.remote
            .create_project_token(project, role, spec)
            .await
            .map_err(|err| SyncError::remote(Action::Create, ObjectClass::Token, &identity, err))
    }

    /// Revoke a token issued against a project role; revoking an absent
    /// token succeeds.
    pub async fn delete_project_token(&self, token: &TokenId) -> Result<(), SyncError> {
        let handle = self.locks.project(&token.project);
        let _guard = handle.write().await;

        debug!(token = %token, "revoking project role token");
        match self
            .remote
            .delete_project_token(&token.project, &token.role, &token.id)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(SyncError::remote(
                Action::Delete,
                ObjectClass::Token,
                &token.encode(),
                err,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MockRemote;
    use crate::remote::{RemoteError, RemoteOp, RoleSpec};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn reconciler(remote: &MockRemote) -> Reconciler {
        Reconciler::new(Arc::new(remote.clone()))
    }

    fn spec_with_role(name: &str, role: &str) -> ProjectSpec {
        ProjectSpec {
            name: name.to_string(),
            description: None,
            source_repos: vec![],
            destinations: vec![],
            roles: vec![RoleSpec {
                name: role.to_string(),
                description: None,
                policies: vec![],
                groups: vec![],
                jwt_tokens: vec![],
            }],
        }
    }

    fn bare_spec(name: &str) -> ProjectSpec {
        ProjectSpec {
            name: name.to_string(),
            description: None,
            source_repos: vec![],
            destinations: vec![],
            roles: vec![],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn create_waits_out_the_deletion_grace_period() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);

        reconciler.create_project(bare_spec("doomed")).await.unwrap();
        assert!(remote.mark_deletion_pending("doomed", Duration::from_secs(2)));

        let started = Instant::now();
        reconciler.create_project(bare_spec("doomed")).await.unwrap();

        // The only sleep in the call is the grace-period wait.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        let ops: Vec<_> = remote.operations().into_iter().map(|(op, _)| op).collect();
        assert_eq!(
            ops,
            vec![
                RemoteOp::CreateProject,
                RemoteOp::GetProject,
                RemoteOp::CreateProject,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn create_without_prior_object_does_not_wait() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);

        let started = Instant::now();
        reconciler.create_project(bare_spec("fresh")).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn create_against_a_live_project_conflicts() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);

        reconciler.create_project(bare_spec("demo")).await.unwrap();
        let err = reconciler
            .create_project(bare_spec("demo"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn update_preserves_issued_role_tokens() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);

        reconciler
            .create_project(spec_with_role("payments", "admin"))
            .await
            .unwrap();
        reconciler
            .create_project_token("payments", "admin", TokenSpec::default())
            .await
            .unwrap();
        reconciler
            .create_project_token("payments", "admin", TokenSpec::default())
            .await
            .unwrap();

        // The desired spec lists the role with zero tokens, as a
        // configuration-driven caller would.
        let mut desired = spec_with_role("payments", "admin");
        desired.description = Some("updated".to_string());
        let updated = reconciler.update_project(desired).await.unwrap();

        assert_eq!(updated.spec.description.as_deref(), Some("updated"));
        assert_eq!(updated.role("admin").unwrap().jwt_tokens.len(), 2);
        let stored = remote.stored_project("payments").unwrap();
        assert_eq!(stored.role("admin").unwrap().jwt_tokens.len(), 2);
    }

    #[tokio::test]
    async fn update_of_an_absent_project_is_an_error() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);

        let err = reconciler
            .update_project(bare_spec("ghost"))
            .await
            .unwrap_err();
        match err {
            SyncError::Remote {
                action: Action::Update,
                class: ObjectClass::Project,
                source: RemoteError::NotFound(_),
                ..
            } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn list_returns_projects_in_name_order() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);
        reconciler.create_project(bare_spec("zeta")).await.unwrap();
        reconciler.create_project(bare_spec("alpha")).await.unwrap();

        let listed = reconciler.list_projects().await.unwrap();
        let names: Vec<_> = listed.iter().map(|p| p.spec.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn read_of_an_absent_project_is_none() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);
        assert!(reconciler.read_project("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_an_absent_project_succeeds() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);
        reconciler.delete_project("ghost").await.unwrap();
        assert_eq!(remote.count(RemoteOp::DeleteProject), 1);
    }

    #[tokio::test]
    async fn token_issuance_against_a_missing_role_is_an_error() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);
        reconciler.create_project(bare_spec("payments")).await.unwrap();

        let err = reconciler
            .create_project_token("payments", "ghost-role", TokenSpec::default())
            .await
            .unwrap_err();
        match err {
            SyncError::Remote {
                class: ObjectClass::Token,
                source: RemoteError::NotFound(_),
                ..
            } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn token_revocation_is_idempotent() {
        let remote = MockRemote::new();
        let reconciler = reconciler(&remote);
        reconciler
            .create_project(spec_with_role("payments", "ci"))
            .await
            .unwrap();
        let token = reconciler
            .create_project_token("payments", "ci", TokenSpec::default())
            .await
            .unwrap();

        let id = TokenId::new("payments", "ci", token.id.as_str()).unwrap();
        reconciler.delete_project_token(&id).await.unwrap();
        reconciler.delete_project_token(&id).await.unwrap();

        let stored = remote.stored_project("payments").unwrap();
        assert!(stored.role("ci").unwrap().jwt_tokens.is_empty());
    }
}
