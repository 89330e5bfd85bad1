//! sync::account
//!
//! Account reads and account-token issuance.
//!
//! Accounts are provisioned on the remote side; this layer never creates
//! or deletes them. Reads take the account class lock; token issuance and
//! revocation are mutations of the token class and take its lock.

use tracing::debug;

use crate::remote::{AccountState, TokenSpec, TokenState};
use crate::sync::errors::{Action, SyncError};
use crate::sync::{ObjectClass, Reconciler};

impl Reconciler {
    /// Read an account; `Ok(None)` if it does not exist.
    pub async fn read_account(&self, name: &str) -> Result<Option<AccountState>, SyncError> {
        let handle = self.locks.class(ObjectClass::Account);
        let _guard = handle.read().await;

        match self.remote.get_account(name).await {
            Ok(state) => Ok(Some(state)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(SyncError::remote(
                Action::Read,
                ObjectClass::Account,
                name,
                err,
            )),
        }
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<AccountState>, SyncError> {
        let handle = self.locks.class(ObjectClass::Account);
        let _guard = handle.read().await;

        self.remote
            .list_accounts()
            .await
            .map_err(|err| SyncError::remote(Action::Read, ObjectClass::Account, "*", err))
    }

    /// Issue a token for an account.
    ///
    /// # Errors
    ///
    /// Issuing against an absent account is an error; absence is only
    /// recovered on reads and deletes.
    pub async fn create_account_token(
        &self,
        account: &str,
        spec: TokenSpec,
    ) -> Result<TokenState, SyncError> {
        let handle = self.locks.class(ObjectClass::Token);
        let _guard = handle.write().await;

        debug!(account = %account, "issuing account token");
        self.remote
            .create_account_token(account, spec)
            .await
            .map_err(|err| SyncError::remote(Action::Create, ObjectClass::Token, account, err))
    }

    /// Revoke an account token; revoking an absent token succeeds.
    pub async fn delete_account_token(&self, account: &str, id: &str) -> Result<(), SyncError> {
        let handle = self.locks.class(ObjectClass::Token);
        let _guard = handle.write().await;

        let identity = format!("{}/{}", account, id);
        debug!(token = %identity, "revoking account token");
        match self.remote.delete_account_token(account, id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(SyncError::remote(
                Action::Delete,
                ObjectClass::Token,
                &identity,
                err,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MockRemote;
    use crate::remote::{AccountCapability, RemoteError};
    use std::sync::Arc;
    use std::time::Duration;

    fn seeded_remote() -> MockRemote {
        let remote = MockRemote::new();
        remote.add_account(AccountState {
            name: "deployer".to_string(),
            enabled: true,
            capabilities: vec![AccountCapability::ApiKey],
        });
        remote
    }

    #[tokio::test]
    async fn read_returns_seeded_account() {
        let remote = seeded_remote();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));

        let account = reconciler.read_account("deployer").await.unwrap().unwrap();
        assert!(account.enabled);
        assert_eq!(account.capabilities, vec![AccountCapability::ApiKey]);
    }

    #[tokio::test]
    async fn read_of_an_absent_account_is_none() {
        let remote = MockRemote::new();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));
        assert!(reconciler.read_account("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_lifecycle() {
        let remote = seeded_remote();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));

        let token = reconciler
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

        reconciler.delete_account_token("deployer", "ci").await.unwrap();
        // Idempotent.
        reconciler.delete_account_token("deployer", "ci").await.unwrap();
    }

    #[tokio::test]
    async fn issuance_against_an_absent_account_is_an_error() {
        let remote = MockRemote::new();
        let reconciler = Reconciler::new(Arc::new(remote.clone()));

        let err = reconciler
            .create_account_token("ghost", TokenSpec::default())
            .await
            .unwrap_err();
        match err {
            SyncError::Remote {
                action: Action::Create,
                class: ObjectClass::Token,
                source: RemoteError::NotFound(_),
                ..
            } => {}
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn list_covers_seeded_accounts() {
        let remote = seeded_remote();
        remote.add_account(AccountState {
            name: "auditor".to_string(),
            enabled: false,
            capabilities: vec![AccountCapability::Login],
        });
        let reconciler = Reconciler::new(Arc::new(remote.clone()));

        let accounts = reconciler.list_accounts().await.unwrap();
        let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["auditor", "deployer"]);
    }
}
