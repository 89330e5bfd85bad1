//! remote::mock
//!
//! Mock remote implementation for deterministic testing.
//!
//! # Design
//!
//! `MockRemote` implements [`RemoteApi`] entirely in memory. Tests use it
//! to drive the reconciler without a network: failures can be injected per
//! operation (always, or for the next N calls), every call is recorded
//! with its identity for call-count and ordering assertions, and an
//! optional simulated latency plus an in-flight gauge let concurrency
//! tests observe whether two calls ever overlapped inside the remote.
//!
//! # Example
//!
//! ```
//! use coxswain::remote::mock::MockRemote;
//! use coxswain::remote::{ProjectSpec, RemoteApi, RemoteOp};
//!
//! # tokio_test::block_on(async {
//! let remote = MockRemote::new();
//!
//! let project = remote
//!     .create_project(ProjectSpec {
//!         name: "payments".to_string(),
//!         description: None,
//!         source_repos: vec![],
//!         destinations: vec![],
//!         roles: vec![],
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(project.spec.name, "payments");
//! assert_eq!(remote.count(RemoteOp::CreateProject), 1);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::traits::{RemoteApi, RemoteError};
use super::types::{
    AccountState, CertificateSpec, CertificateState, ConnectionState, ConnectionStatus,
    GpgKeySpec, GpgKeyState, JwtToken, PendingDeletion, ProjectSpec, ProjectState,
    RepositoryCredentialsSpec, RepositoryCredentialsState, RepositorySpec, RepositoryState,
    TokenSpec, TokenState,
};

/// Operation kinds, used for failure injection and the recorded call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    CreateProject,
    GetProject,
    ListProjects,
    UpdateProject,
    DeleteProject,
    CreateProjectToken,
    DeleteProjectToken,
    CreateRepository,
    GetRepository,
    ListRepositories,
    UpdateRepository,
    DeleteRepository,
    CreateCredentials,
    GetCredentials,
    ListCredentials,
    UpdateCredentials,
    DeleteCredentials,
    CreateCertificate,
    ListCertificates,
    DeleteCertificate,
    CreateGpgKey,
    GetGpgKey,
    ListGpgKeys,
    DeleteGpgKey,
    GetAccount,
    ListAccounts,
    CreateAccountToken,
    DeleteAccountToken,
}

/// A failure configured for one operation kind.
#[derive(Debug, Clone)]
struct InjectedFailure {
    error: RemoteError,
    /// `None` fails every matching call; `Some(n)` fails the next n.
    remaining: Option<u32>,
}

/// Overlap instrumentation shared across clones.
#[derive(Debug, Default)]
struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Decrements the in-flight count when the operation finishes.
struct LoadGuard {
    gauge: Arc<Gauge>,
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock remote for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
    gauge: Arc<Gauge>,
}

#[derive(Debug)]
struct MockRemoteInner {
    projects: HashMap<String, ProjectState>,
    repositories: HashMap<String, RepositoryState>,
    credentials: HashMap<String, RepositoryCredentialsState>,
    certificates: Vec<CertificateState>,
    gpg_keys: HashMap<String, GpgKeyState>,
    accounts: HashMap<String, AccountState>,
    account_tokens: HashMap<String, Vec<JwtToken>>,
    version_counter: u64,
    failures: HashMap<RemoteOp, InjectedFailure>,
    operations: Vec<(RemoteOp, String)>,
    latency: Option<Duration>,
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemote {
    /// Create a new empty mock remote.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRemoteInner {
                projects: HashMap::new(),
                repositories: HashMap::new(),
                credentials: HashMap::new(),
                certificates: Vec::new(),
                gpg_keys: HashMap::new(),
                accounts: HashMap::new(),
                account_tokens: HashMap::new(),
                version_counter: 0,
                failures: HashMap::new(),
                operations: Vec::new(),
                latency: None,
            })),
            gauge: Arc::new(Gauge::default()),
        }
    }

    /// Configure every call of `op` to fail with `error`.
    pub fn fail_on(self, op: RemoteOp, error: RemoteError) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.failures.insert(
                op,
                InjectedFailure {
                    error,
                    remaining: None,
                },
            );
        }
        self
    }

    /// Configure the next `times` calls of `op` to fail with `error`.
    pub fn fail_times(self, op: RemoteOp, error: RemoteError, times: u32) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.failures.insert(
                op,
                InjectedFailure {
                    error,
                    remaining: Some(times),
                },
            );
        }
        self
    }

    /// Clear all failure configuration.
    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures.clear();
    }

    /// Add a simulated per-operation latency.
    ///
    /// Combined with [`MockRemote::peak_in_flight`], this lets tests observe
    /// whether two operations were ever inside the remote simultaneously.
    pub fn with_latency(self, latency: Duration) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.latency = Some(latency);
        }
        self
    }

    /// Seed an account. Accounts have no create operation on the wire.
    pub fn add_account(&self, account: AccountState) {
        let mut inner = self.inner.lock().unwrap();
        inner.account_tokens.entry(account.name.clone()).or_default();
        inner.accounts.insert(account.name.clone(), account);
    }

    /// Mark a stored project as deletion-pending with the given grace period.
    ///
    /// Returns false if no such project is stored.
    pub fn mark_deletion_pending(&self, name: &str, grace_period: Duration) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.projects.get_mut(name) {
            Some(project) => {
                project.deletion = Some(PendingDeletion { grace_period });
                true
            }
            None => false,
        }
    }

    /// Get all recorded operations with the identity each targeted.
    pub fn operations(&self) -> Vec<(RemoteOp, String)> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Count recorded calls of one operation kind.
    pub fn count(&self, op: RemoteOp) -> usize {
        self.inner
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|(kind, _)| *kind == op)
            .count()
    }

    /// Highest number of operations ever in flight simultaneously.
    pub fn peak_in_flight(&self) -> usize {
        self.gauge.peak.load(Ordering::SeqCst)
    }

    /// Peek at a stored project without going through the recorded API.
    pub fn stored_project(&self, name: &str) -> Option<ProjectState> {
        self.inner.lock().unwrap().projects.get(name).cloned()
    }

    /// Record the call and surface any injected failure.
    fn begin(&self, op: RemoteOp, identity: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push((op, identity.to_string()));

        let fired = match inner.failures.get_mut(&op) {
            Some(failure) => match failure.remaining.as_mut() {
                None => Some(failure.error.clone()),
                Some(0) => None,
                Some(n) => {
                    *n -= 1;
                    Some(failure.error.clone())
                }
            },
            None => None,
        };
        if inner
            .failures
            .get(&op)
            .is_some_and(|f| f.remaining == Some(0))
        {
            inner.failures.remove(&op);
        }
        match fired {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Track overlap and apply configured latency.
    async fn simulate_load(&self) -> LoadGuard {
        let current = self.gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(current, Ordering::SeqCst);

        let latency = self.inner.lock().unwrap().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        LoadGuard {
            gauge: Arc::clone(&self.gauge),
        }
    }

    fn next_version(inner: &mut MockRemoteInner) -> String {
        inner.version_counter += 1;
        inner.version_counter.to_string()
    }

    fn issue_token(spec: &TokenSpec, subject: String) -> (JwtToken, TokenState) {
        let id = spec
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let issued_at = Utc::now();
        let expires_at = spec
            .expires_in
            .and_then(|lifetime| chrono::Duration::from_std(lifetime).ok())
            .map(|lifetime| issued_at + lifetime);

        let record = JwtToken {
            id: id.clone(),
            issued_at,
            expires_at,
        };
        let state = TokenState {
            token: format!("jwt.{}.{}", subject, id),
            id,
            issued_at,
            expires_at,
        };
        (record, state)
    }

    fn fingerprint(data: &str) -> String {
        format!("sha256:{}", hex::encode(Sha256::digest(data.as_bytes())))
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn create_project(&self, spec: ProjectSpec) -> Result<ProjectState, RemoteError> {
        self.begin(RemoteOp::CreateProject, &spec.name)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        // A deletion-pending project counts as torn down by the time a
        // create lands; the marker exists so grace-period waits are
        // observable. Only a live project rejects the name.
        if inner
            .projects
            .get(&spec.name)
            .is_some_and(|p| p.deletion.is_none())
        {
            return Err(RemoteError::Conflict(format!(
                "project '{}' already exists",
                spec.name
            )));
        }
        let state = ProjectState {
            version: Self::next_version(&mut inner),
            spec,
            deletion: None,
        };
        inner.projects.insert(state.spec.name.clone(), state.clone());
        Ok(state)
    }

    async fn get_project(&self, name: &str) -> Result<ProjectState, RemoteError> {
        self.begin(RemoteOp::GetProject, name)?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        inner
            .projects
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("project '{}'", name)))
    }

    async fn list_projects(&self) -> Result<Vec<ProjectState>, RemoteError> {
        self.begin(RemoteOp::ListProjects, "")?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        let mut projects: Vec<_> = inner.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
        Ok(projects)
    }

    async fn update_project(
        &self,
        spec: ProjectSpec,
        version: String,
    ) -> Result<ProjectState, RemoteError> {
        self.begin(RemoteOp::UpdateProject, &spec.name)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        let stored = match inner.projects.get(&spec.name) {
            Some(stored) => stored.clone(),
            None => return Err(RemoteError::NotFound(format!("project '{}'", spec.name))),
        };
        if stored.version != version {
            return Err(RemoteError::Conflict(format!(
                "project '{}' version stamp is stale",
                spec.name
            )));
        }
        let state = ProjectState {
            version: Self::next_version(&mut inner),
            spec,
            deletion: stored.deletion,
        };
        inner.projects.insert(state.spec.name.clone(), state.clone());
        Ok(state)
    }

    async fn delete_project(&self, name: &str) -> Result<(), RemoteError> {
        self.begin(RemoteOp::DeleteProject, name)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        match inner.projects.remove(name) {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound(format!("project '{}'", name))),
        }
    }

    async fn create_project_token(
        &self,
        project: &str,
        role: &str,
        spec: TokenSpec,
    ) -> Result<TokenState, RemoteError> {
        self.begin(
            RemoteOp::CreateProjectToken,
            &format!("{}/{}", project, role),
        )?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        let version = Self::next_version(&mut inner);
        let stored = inner
            .projects
            .get_mut(project)
            .ok_or_else(|| RemoteError::NotFound(format!("project '{}'", project)))?;
        let role_spec = stored
            .spec
            .roles
            .iter_mut()
            .find(|r| r.name == role)
            .ok_or_else(|| {
                RemoteError::NotFound(format!("role '{}' in project '{}'", role, project))
            })?;

        let (record, state) = Self::issue_token(&spec, format!("proj:{}:{}", project, role));
        if role_spec.jwt_tokens.iter().any(|t| t.id == record.id) {
            return Err(RemoteError::Conflict(format!(
                "token '{}' already issued for role '{}'",
                record.id, role
            )));
        }
        role_spec.jwt_tokens.push(record);
        stored.version = version;
        Ok(state)
    }

    async fn delete_project_token(
        &self,
        project: &str,
        role: &str,
        id: &str,
    ) -> Result<(), RemoteError> {
        self.begin(
            RemoteOp::DeleteProjectToken,
            &format!("{}/{}/{}", project, role, id),
        )?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        let version = Self::next_version(&mut inner);
        let stored = inner
            .projects
            .get_mut(project)
            .ok_or_else(|| RemoteError::NotFound(format!("project '{}'", project)))?;
        let role_spec = stored
            .spec
            .roles
            .iter_mut()
            .find(|r| r.name == role)
            .ok_or_else(|| {
                RemoteError::NotFound(format!("role '{}' in project '{}'", role, project))
            })?;

        let before = role_spec.jwt_tokens.len();
        role_spec.jwt_tokens.retain(|t| t.id != id);
        if role_spec.jwt_tokens.len() == before {
            return Err(RemoteError::NotFound(format!(
                "token '{}' on role '{}'",
                id, role
            )));
        }
        stored.version = version;
        Ok(())
    }

    async fn create_repository(
        &self,
        spec: RepositorySpec,
        upsert: bool,
    ) -> Result<RepositoryState, RemoteError> {
        self.begin(RemoteOp::CreateRepository, &spec.url)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        if !upsert && inner.repositories.contains_key(&spec.url) {
            return Err(RemoteError::Conflict(format!(
                "repository '{}' already exists",
                spec.url
            )));
        }
        let state = RepositoryState {
            url: spec.url.clone(),
            name: spec.name,
            username: spec.username,
            insecure: spec.insecure,
            enable_lfs: spec.enable_lfs,
            connection: ConnectionState {
                status: ConnectionStatus::Successful,
                message: None,
            },
        };
        inner.repositories.insert(spec.url, state.clone());
        Ok(state)
    }

    async fn get_repository(&self, url: &str) -> Result<RepositoryState, RemoteError> {
        self.begin(RemoteOp::GetRepository, url)?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        inner
            .repositories
            .get(url)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("repository '{}'", url)))
    }

    async fn list_repositories(&self) -> Result<Vec<RepositoryState>, RemoteError> {
        self.begin(RemoteOp::ListRepositories, "")?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        let mut repositories: Vec<_> = inner.repositories.values().cloned().collect();
        repositories.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(repositories)
    }

    async fn update_repository(
        &self,
        spec: RepositorySpec,
    ) -> Result<RepositoryState, RemoteError> {
        self.begin(RemoteOp::UpdateRepository, &spec.url)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        if !inner.repositories.contains_key(&spec.url) {
            return Err(RemoteError::NotFound(format!("repository '{}'", spec.url)));
        }
        let state = RepositoryState {
            url: spec.url.clone(),
            name: spec.name,
            username: spec.username,
            insecure: spec.insecure,
            enable_lfs: spec.enable_lfs,
            connection: ConnectionState {
                status: ConnectionStatus::Successful,
                message: None,
            },
        };
        inner.repositories.insert(spec.url, state.clone());
        Ok(state)
    }

    async fn delete_repository(&self, url: &str) -> Result<(), RemoteError> {
        self.begin(RemoteOp::DeleteRepository, url)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        match inner.repositories.remove(url) {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound(format!("repository '{}'", url))),
        }
    }

    async fn create_credentials(
        &self,
        spec: RepositoryCredentialsSpec,
        upsert: bool,
    ) -> Result<RepositoryCredentialsState, RemoteError> {
        self.begin(RemoteOp::CreateCredentials, &spec.url)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        if !upsert && inner.credentials.contains_key(&spec.url) {
            return Err(RemoteError::Conflict(format!(
                "credentials for '{}' already exist",
                spec.url
            )));
        }
        let state = RepositoryCredentialsState {
            url: spec.url.clone(),
            username: spec.username,
        };
        inner.credentials.insert(spec.url, state.clone());
        Ok(state)
    }

    async fn get_credentials(&self, url: &str) -> Result<RepositoryCredentialsState, RemoteError> {
        self.begin(RemoteOp::GetCredentials, url)?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        inner
            .credentials
            .get(url)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("credentials for '{}'", url)))
    }

    async fn list_credentials(&self) -> Result<Vec<RepositoryCredentialsState>, RemoteError> {
        self.begin(RemoteOp::ListCredentials, "")?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        let mut credentials: Vec<_> = inner.credentials.values().cloned().collect();
        credentials.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(credentials)
    }

    async fn update_credentials(
        &self,
        spec: RepositoryCredentialsSpec,
    ) -> Result<RepositoryCredentialsState, RemoteError> {
        self.begin(RemoteOp::UpdateCredentials, &spec.url)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        if !inner.credentials.contains_key(&spec.url) {
            return Err(RemoteError::NotFound(format!(
                "credentials for '{}'",
                spec.url
            )));
        }
        let state = RepositoryCredentialsState {
            url: spec.url.clone(),
            username: spec.username,
        };
        inner.credentials.insert(spec.url, state.clone());
        Ok(state)
    }

    async fn delete_credentials(&self, url: &str) -> Result<(), RemoteError> {
        self.begin(RemoteOp::DeleteCredentials, url)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        match inner.credentials.remove(url) {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound(format!("credentials for '{}'", url))),
        }
    }

    async fn create_certificate(
        &self,
        spec: CertificateSpec,
        upsert: bool,
    ) -> Result<CertificateState, RemoteError> {
        self.begin(RemoteOp::CreateCertificate, &spec.server_name)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        let existing = inner.certificates.iter().position(|c| {
            c.cert_type == spec.cert_type
                && c.cert_sub_type == spec.cert_sub_type
                && c.server_name == spec.server_name
        });
        if existing.is_some() && !upsert {
            return Err(RemoteError::Conflict(format!(
                "certificate for '{}' already exists",
                spec.server_name
            )));
        }
        let state = CertificateState {
            server_name: spec.server_name,
            cert_type: spec.cert_type,
            cert_sub_type: spec.cert_sub_type,
            cert_info: Self::fingerprint(&spec.cert_data),
        };
        match existing {
            Some(index) => inner.certificates[index] = state.clone(),
            None => inner.certificates.push(state.clone()),
        }
        Ok(state)
    }

    async fn list_certificates(&self) -> Result<Vec<CertificateState>, RemoteError> {
        self.begin(RemoteOp::ListCertificates, "")?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        Ok(inner.certificates.clone())
    }

    async fn delete_certificate(
        &self,
        cert_type: &str,
        cert_sub_type: &str,
        server_name: &str,
    ) -> Result<(), RemoteError> {
        self.begin(RemoteOp::DeleteCertificate, server_name)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        let before = inner.certificates.len();
        inner.certificates.retain(|c| {
            !(c.cert_type == cert_type
                && c.server_name == server_name
                && (cert_sub_type.is_empty() || c.cert_sub_type == cert_sub_type))
        });
        if inner.certificates.len() == before {
            return Err(RemoteError::NotFound(format!(
                "certificate for '{}'",
                server_name
            )));
        }
        Ok(())
    }

    async fn create_gpg_key(&self, spec: GpgKeySpec) -> Result<GpgKeyState, RemoteError> {
        self.begin(RemoteOp::CreateGpgKey, "")?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        let digest = hex::encode(Sha256::digest(spec.key_data.as_bytes()));
        let key_id = digest[..16].to_uppercase();
        if inner.gpg_keys.contains_key(&key_id) {
            return Err(RemoteError::Conflict(format!(
                "gpg key '{}' already exists",
                key_id
            )));
        }
        let state = GpgKeyState {
            key_id: key_id.clone(),
            fingerprint: digest[..40].to_uppercase(),
            owner: "unknown".to_string(),
            key_data: spec.key_data,
        };
        inner.gpg_keys.insert(key_id, state.clone());
        Ok(state)
    }

    async fn get_gpg_key(&self, key_id: &str) -> Result<GpgKeyState, RemoteError> {
        self.begin(RemoteOp::GetGpgKey, key_id)?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        inner
            .gpg_keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("gpg key '{}'", key_id)))
    }

    async fn list_gpg_keys(&self) -> Result<Vec<GpgKeyState>, RemoteError> {
        self.begin(RemoteOp::ListGpgKeys, "")?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        let mut keys: Vec<_> = inner.gpg_keys.values().cloned().collect();
        keys.sort_by(|a, b| a.key_id.cmp(&b.key_id));
        Ok(keys)
    }

    async fn delete_gpg_key(&self, key_id: &str) -> Result<(), RemoteError> {
        self.begin(RemoteOp::DeleteGpgKey, key_id)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        match inner.gpg_keys.remove(key_id) {
            Some(_) => Ok(()),
            None => Err(RemoteError::NotFound(format!("gpg key '{}'", key_id))),
        }
    }

    async fn get_account(&self, name: &str) -> Result<AccountState, RemoteError> {
        self.begin(RemoteOp::GetAccount, name)?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        inner
            .accounts
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("account '{}'", name)))
    }

    async fn list_accounts(&self) -> Result<Vec<AccountState>, RemoteError> {
        self.begin(RemoteOp::ListAccounts, "")?;
        let _load = self.simulate_load().await;

        let inner = self.inner.lock().unwrap();
        let mut accounts: Vec<_> = inner.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    async fn create_account_token(
        &self,
        account: &str,
        spec: TokenSpec,
    ) -> Result<TokenState, RemoteError> {
        self.begin(RemoteOp::CreateAccountToken, account)?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        if !inner.accounts.contains_key(account) {
            return Err(RemoteError::NotFound(format!("account '{}'", account)));
        }
        let (record, state) = Self::issue_token(&spec, format!("acct:{}", account));
        let tokens = inner.account_tokens.entry(account.to_string()).or_default();
        if tokens.iter().any(|t| t.id == record.id) {
            return Err(RemoteError::Conflict(format!(
                "token '{}' already issued for account '{}'",
                record.id, account
            )));
        }
        tokens.push(record);
        Ok(state)
    }

    async fn delete_account_token(&self, account: &str, id: &str) -> Result<(), RemoteError> {
        self.begin(
            RemoteOp::DeleteAccountToken,
            &format!("{}/{}", account, id),
        )?;
        let _load = self.simulate_load().await;

        let mut inner = self.inner.lock().unwrap();
        let tokens = inner
            .account_tokens
            .get_mut(account)
            .ok_or_else(|| RemoteError::NotFound(format!("account '{}'", account)))?;
        let before = tokens.len();
        tokens.retain(|t| t.id != id);
        if tokens.len() == before {
            return Err(RemoteError::NotFound(format!(
                "token '{}' on account '{}'",
                id, account
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_spec(name: &str) -> ProjectSpec {
        ProjectSpec {
            name: name.to_string(),
            description: None,
            source_repos: vec![],
            destinations: vec![],
            roles: vec![],
        }
    }

    #[tokio::test]
    async fn project_create_then_get_roundtrip() {
        let remote = MockRemote::new();
        let created = remote.create_project(project_spec("demo")).await.unwrap();
        assert_eq!(created.version, "1");

        let fetched = remote.get_project("demo").await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_project_create_conflicts() {
        let remote = MockRemote::new();
        remote.create_project(project_spec("demo")).await.unwrap();

        let err = remote.create_project(project_spec("demo")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn stale_version_update_conflicts() {
        let remote = MockRemote::new();
        remote.create_project(project_spec("demo")).await.unwrap();

        let err = remote
            .update_project(project_spec("demo"), "0".to_string())
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn fail_times_fires_then_clears() {
        let remote = MockRemote::new().fail_times(
            RemoteOp::GetProject,
            RemoteError::Network("flaky".into()),
            2,
        );
        remote.create_project(project_spec("demo")).await.unwrap();

        assert!(remote.get_project("demo").await.is_err());
        assert!(remote.get_project("demo").await.is_err());
        assert!(remote.get_project("demo").await.is_ok());
        assert_eq!(remote.count(RemoteOp::GetProject), 3);
    }

    #[tokio::test]
    async fn operations_record_identity() {
        let remote = MockRemote::new();
        remote.create_project(project_spec("demo")).await.unwrap();
        let _ = remote.get_project("other").await;

        let ops = remote.operations();
        assert_eq!(ops[0], (RemoteOp::CreateProject, "demo".to_string()));
        assert_eq!(ops[1], (RemoteOp::GetProject, "other".to_string()));
    }

    #[tokio::test]
    async fn certificate_upsert_replaces_in_place() {
        let remote = MockRemote::new();
        let spec = CertificateSpec {
            server_name: "git.example.com".to_string(),
            cert_type: "ssh".to_string(),
            cert_sub_type: "ssh-ed25519".to_string(),
            cert_data: "AAAA-old".to_string(),
        };
        remote.create_certificate(spec.clone(), false).await.unwrap();

        let replaced = remote
            .create_certificate(
                CertificateSpec {
                    cert_data: "AAAA-new".to_string(),
                    ..spec
                },
                true,
            )
            .await
            .unwrap();
        let listed = remote.list_certificates().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].cert_info, replaced.cert_info);
        assert!(replaced.cert_info.starts_with("sha256:"));
    }

    #[tokio::test]
    async fn account_token_lifecycle() {
        let remote = MockRemote::new();
        remote.add_account(AccountState {
            name: "deployer".to_string(),
            enabled: true,
            capabilities: vec![],
        });

        let token = remote
            .create_account_token(
                "deployer",
                TokenSpec {
                    id: Some("ci".to_string()),
                    expires_in: Some(Duration::from_secs(3600)),
                },
            )
            .await
            .unwrap();
        assert_eq!(token.id, "ci");
        assert!(token.expires_at.is_some());

        remote.delete_account_token("deployer", "ci").await.unwrap();
        let err = remote
            .delete_account_token("deployer", "ci")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn project_token_lands_on_role() {
        let remote = MockRemote::new();
        let mut spec = project_spec("demo");
        spec.roles.push(crate::remote::types::RoleSpec {
            name: "ci".to_string(),
            description: None,
            policies: vec![],
            groups: vec![],
            jwt_tokens: vec![],
        });
        remote.create_project(spec).await.unwrap();

        remote
            .create_project_token("demo", "ci", TokenSpec::default())
            .await
            .unwrap();

        let stored = remote.stored_project("demo").unwrap();
        assert_eq!(stored.role("ci").unwrap().jwt_tokens.len(), 1);
    }

    #[tokio::test]
    async fn gpg_key_id_is_deterministic() {
        let remote = MockRemote::new();
        let spec = GpgKeySpec {
            key_data: "-----BEGIN PGP PUBLIC KEY BLOCK-----".to_string(),
        };
        let created = remote.create_gpg_key(spec.clone()).await.unwrap();
        remote.delete_gpg_key(&created.key_id).await.unwrap();

        let recreated = remote.create_gpg_key(spec).await.unwrap();
        assert_eq!(created.key_id, recreated.key_id);
        assert_eq!(created.key_id.len(), 16);
        assert_eq!(created.fingerprint.len(), 40);
    }
}
