use super::{Backend, BackendError};
use crate::models::{Journal, Profile, Role, Session, StoredState};
use crate::storage::{load_data, persist_data};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendDocument {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub states: BTreeMap<String, StoredState>,
}

/// Accounts and journals kept in one JSON file, rewritten after every save.
pub struct FileBackend {
    path: PathBuf,
    document: Mutex<BackendDocument>,
    tokens: Mutex<HashMap<String, String>>,
}

impl FileBackend {
    pub async fn open(path: &Path) -> Self {
        let document: BackendDocument = load_data(path).await;
        info!(
            "file backend at {} with {} users",
            path.display(),
            document.users.len()
        );
        Self::with_document(path.to_path_buf(), document)
    }

    pub fn with_document(path: PathBuf, document: BackendDocument) -> Self {
        Self {
            path,
            document: Mutex::new(document),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    async fn caller(&self, session: &Session) -> Result<UserRecord, BackendError> {
        let user_id = self
            .tokens
            .lock()
            .await
            .get(&session.access_token)
            .cloned()
            .ok_or_else(|| BackendError::AuthFailed("session expired".to_string()))?;
        let document = self.document.lock().await;
        document
            .users
            .iter()
            .find(|user| user.id == user_id)
            .cloned()
            .ok_or_else(|| BackendError::AuthFailed("unknown user".to_string()))
    }

    async fn require_reader(&self, session: &Session, user_id: &str) -> Result<(), BackendError> {
        let caller = self.caller(session).await?;
        if caller.id == user_id || caller.role.is_admin() {
            Ok(())
        } else {
            Err(forbidden())
        }
    }
}

fn forbidden() -> BackendError {
    BackendError::Http {
        status: 403,
        body: "permission denied".to_string(),
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let user = {
            let document = self.document.lock().await;
            document
                .users
                .iter()
                .find(|user| user.email.eq_ignore_ascii_case(email.trim()) && user.password == password)
                .cloned()
        };
        let user = user.ok_or_else(|| BackendError::AuthFailed("Invalid login credentials".to_string()))?;

        let token = Uuid::new_v4().to_string();
        self.tokens.lock().await.insert(token.clone(), user.id.clone());
        Ok(Session {
            user_id: user.id,
            email: user.email,
            access_token: token,
        })
    }

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError> {
        self.tokens.lock().await.remove(&session.access_token);
        Ok(())
    }

    async fn select_profile(&self, session: &Session, user_id: &str) -> Result<Option<Profile>, BackendError> {
        self.require_reader(session, user_id).await?;
        let document = self.document.lock().await;
        Ok(document
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(UserRecord::profile))
    }

    async fn list_clients(&self, session: &Session) -> Result<Vec<Profile>, BackendError> {
        if !self.caller(session).await?.role.is_admin() {
            return Err(forbidden());
        }
        let document = self.document.lock().await;
        let mut clients: Vec<&UserRecord> = document
            .users
            .iter()
            .filter(|user| !user.role.is_admin())
            .collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(clients.into_iter().map(UserRecord::profile).collect())
    }

    async fn get_user_state(&self, session: &Session, user_id: &str) -> Result<Option<StoredState>, BackendError> {
        self.require_reader(session, user_id).await?;
        Ok(self.document.lock().await.states.get(user_id).cloned())
    }

    async fn upsert_user_state(&self, session: &Session, user_id: &str, data: &Journal) -> Result<(), BackendError> {
        if self.caller(session).await?.id != user_id {
            return Err(forbidden());
        }
        let mut document = self.document.lock().await;
        // memory only changes once the file write succeeded
        let mut next = document.clone();
        next.states.insert(
            user_id.to_string(),
            StoredState {
                data: data.clone(),
                updated_at: Some(Utc::now()),
            },
        );
        persist_data(&self.path, &next).await?;
        *document = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(id: &str, role: Role, created: i64) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            password: "secret".to_string(),
            role,
            created_at: Utc.timestamp_opt(created, 0).single(),
        }
    }

    fn backend(dir: &Path) -> FileBackend {
        FileBackend::with_document(
            dir.join("backend.json"),
            BackendDocument {
                users: vec![
                    user("coach", Role::Admin, 1),
                    user("alice", Role::Client, 2),
                    user("bob", Role::Client, 3),
                ],
                states: BTreeMap::new(),
            },
        )
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        let err = backend.sign_in("alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, BackendError::AuthFailed(_)));
        let session = backend.sign_in("ALICE@example.com", "secret").await.unwrap();
        assert_eq!(session.user_id, "alice");
    }

    #[tokio::test]
    async fn coach_lists_clients_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        let coach = backend.sign_in("coach@example.com", "secret").await.unwrap();
        let ids: Vec<String> = backend
            .list_clients(&coach)
            .await
            .unwrap()
            .into_iter()
            .map(|profile| profile.id)
            .collect();
        assert_eq!(ids, vec!["bob", "alice"]);

        let alice = backend.sign_in("alice@example.com", "secret").await.unwrap();
        assert!(backend.list_clients(&alice).await.is_err());
    }

    #[tokio::test]
    async fn upsert_persists_and_is_readable_by_coach_only() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        let alice = backend.sign_in("alice@example.com", "secret").await.unwrap();
        let bob = backend.sign_in("bob@example.com", "secret").await.unwrap();
        let coach = backend.sign_in("coach@example.com", "secret").await.unwrap();

        assert!(backend.get_user_state(&alice, "alice").await.unwrap().is_none());
        backend
            .upsert_user_state(&alice, "alice", &Journal::template())
            .await
            .unwrap();
        assert!(backend.upsert_user_state(&bob, "alice", &Journal::template()).await.is_err());

        let stored = backend.get_user_state(&coach, "alice").await.unwrap().unwrap();
        assert_eq!(stored.data, Journal::template());
        assert!(stored.updated_at.is_some());
        assert!(backend.get_user_state(&bob, "alice").await.is_err());

        let reopened = FileBackend::open(&dir.path().join("backend.json")).await;
        let coach = reopened.sign_in("coach@example.com", "secret").await.unwrap();
        assert!(reopened.get_user_state(&coach, "alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_write_leaves_stored_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // the target path is a directory, so the write fails
        let backend = FileBackend::with_document(
            dir.path().to_path_buf(),
            BackendDocument {
                users: vec![user("alice", Role::Client, 1)],
                states: BTreeMap::new(),
            },
        );
        let alice = backend.sign_in("alice@example.com", "secret").await.unwrap();

        let err = backend
            .upsert_user_state(&alice, "alice", &Journal::template())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
        assert!(backend.get_user_state(&alice, "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_invalidates_token() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        let alice = backend.sign_in("alice@example.com", "secret").await.unwrap();
        backend.sign_out(&alice).await.unwrap();
        assert!(matches!(
            backend.select_profile(&alice, "alice").await,
            Err(BackendError::AuthFailed(_))
        ));
    }
}
