//! sync::credentials
//!
//! Credential-template operations, keyed by the repository-credentials
//! class lock. Templates apply to every repository whose URL starts with
//! the template's URL prefix; the prefix is the natural key.

use tracing::debug;

use crate::remote::{RepositoryCredentialsSpec, RepositoryCredentialsState};
use crate::sync::errors::{Action, SyncError};
use crate::sync::{ObjectClass, Reconciler};

impl Reconciler {
    /// Create a credential template. With `upsert`, an existing template
    /// for the same URL prefix is adopted and replaced.
    pub async fn create_credentials(
        &self,
        spec: RepositoryCredentialsSpec,
        upsert: bool,
    ) -> Result<RepositoryCredentialsState, SyncError> {
        let handle = self.locks.class(ObjectClass::RepositoryCredentials);
        let _guard = handle.write().await;

        let url = spec.url.clone();
        debug!(credentials = %url, upsert, "creating credential template");
        self.remote.create_credentials(spec, upsert).await.map_err(|err| {
            SyncError::remote(Action::Create, ObjectClass::RepositoryCredentials, &url, err)
        })
    }

    /// Read a credential template; `Ok(None)` if it does not exist.
    pub async fn read_credentials(
        &self,
        url: &str,
    ) -> Result<Option<RepositoryCredentialsState>, SyncError> {
        let handle = self.locks.class(ObjectClass::RepositoryCredentials);
        let _guard = handle.read().await;

        match self.remote.get_credentials(url).await {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(SyncError::remote(
                Action::Read,
                ObjectClass::RepositoryCredentials,
                url,
                err,
            )),
        }
    }

    /// List all credential templates.
    pub async fn list_credentials(&self) -> Result<Vec<RepositoryCredentialsState>, SyncError> {
        let handle = self.locks.class(ObjectClass::RepositoryCredentials);
        let _guard = handle.read().await;

        self.remote.list_credentials().await.map_err(|err| {
            SyncError::remote(Action::Read, ObjectClass::RepositoryCredentials, "*", err)
        })
    }

    /// Replace a credential template.
    ///
    /// # Errors
    ///
    /// Updating an absent template is an error.
    pub async fn update_credentials(
        &self,
        spec: RepositoryCredentialsSpec,
    ) -> Result<RepositoryCredentialsState, SyncError> {
        let handle = self.locks.class(ObjectClass::RepositoryCredentials);
        let _guard = handle.write().await;

        let url = spec.url.clone();
        debug!(credentials = %url, "updating credential template");
        self.remote.update_credentials(spec).await.map_err(|err| {
            SyncError::remote(Action::Update, ObjectClass::RepositoryCredentials, &url, err)
        })
    }

    /// Remove a credential template; removing an absent one succeeds.
    pub async fn delete_credentials(&self, url: &str) -> Result<(), SyncError> {
        let handle = self.locks.class(ObjectClass::RepositoryCredentials);
        let _guard = handle.write().await;

        debug!(credentials = %url, "deleting credential template");
        match self.remote.delete_credentials(url).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(SyncError::remote(
                Action::Delete,
                ObjectClass::RepositoryCredentials,
                url,
                err,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MockRemote;
    use std::sync::Arc;

    fn spec(url: &str, username: &str) -> RepositoryCredentialsSpec {
        RepositoryCredentialsSpec {
            url: url.to_string(),
            username: Some(username.to_string()),
            password: Some("secret".to_string()),
            ssh_private_key: None,
        }
    }

    #[tokio::test]
    async fn lifecycle_roundtrip() {
        let remote = MockRemote::new();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));

        let created = reconciler
            .create_credentials(spec("https://git.example.com", "bot"), false)
            .await
            .unwrap();
        assert_eq!(created.username.as_deref(), Some("bot"));

        let read = reconciler
            .read_credentials("https://git.example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, created);

        let updated = reconciler
            .update_credentials(spec("https://git.example.com", "deployer"))
            .await
            .unwrap();
        assert_eq!(updated.username.as_deref(), Some("deployer"));

        reconciler
            .delete_credentials("https://git.example.com")
            .await
            .unwrap();
        assert!(reconciler
            .read_credentials("https://git.example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_create_without_upsert_conflicts() {
        let remote = MockRemote::new();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));
        reconciler
            .create_credentials(spec("https://git.example.com", "bot"), false)
            .await
            .unwrap();

        let err = reconciler
            .create_credentials(spec("https://git.example.com", "other"), false)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let adopted = reconciler
            .create_credentials(spec("https://git.example.com", "other"), true)
            .await
            .unwrap();
        assert_eq!(adopted.username.as_deref(), Some("other"));
    }

    #[tokio::test]
    async fn delete_of_an_absent_template_succeeds() {
        let remote = MockRemote::new();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));
        reconciler
            .delete_credentials("https://git.example.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn state_never_echoes_secrets() {
        let remote = MockRemote::new();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));
        let created = reconciler
            .create_credentials(spec("https://git.example.com", "bot"), false)
            .await
            .unwrap();

        let json = serde_json::to_string(&created).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }
}
