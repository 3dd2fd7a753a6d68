use crate::backend::{Backend, SharedBackend};
use crate::models::{DayPatch, Journal, Role, Session};
use crate::storage::read_legacy_cache;
use crate::store::Store;
use crate::sync::SyncHandle;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Where a session's journal came from at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated {
    Remote(Journal),
    Legacy(Journal),
    Template,
    /// The stored journal could not be read. Nothing is saved until the user edits.
    Unavailable,
}

/// Picks the starting journal: remote blob, then legacy cache, then the template.
pub async fn hydrate(backend: &dyn Backend, session: &Session, legacy_dir: &Path) -> Hydrated {
    match backend.get_user_state(session, &session.user_id).await {
        Ok(Some(stored)) => return Hydrated::Remote(stored.data),
        Ok(None) => {}
        Err(err) => {
            error!(user_id = %session.user_id, "failed to load stored journal: {err}");
            return Hydrated::Unavailable;
        }
    }

    match read_legacy_cache(legacy_dir, &session.user_id).await {
        Some(journal) => Hydrated::Legacy(journal),
        None => Hydrated::Template,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    /// A legacy journal was found and the user has not yet decided whether to import it.
    AwaitingImport(Arc<Journal>),
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NotReady,
    UnknownDay,
    NoPendingImport,
}

/// What the pages need to render one session.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub phase: Phase,
    pub journal: Arc<Journal>,
    pub last_saved: Option<DateTime<Utc>>,
}

struct Slot {
    phase: Phase,
    store: Store,
    sync: Option<SyncHandle>,
}

/// A logged-in user: identity, role, and their journal.
pub struct UserSession {
    pub session: Session,
    pub role: Role,
    backend: SharedBackend,
    save_debounce: Duration,
    slot: Mutex<Slot>,
    started: Instant,
    /// Milliseconds after `started` of the last request.
    last_seen_ms: AtomicU64,
}

impl UserSession {
    pub fn new(backend: SharedBackend, session: Session, role: Role, save_debounce: Duration) -> Arc<Self> {
        Arc::new(Self {
            session,
            role,
            backend,
            save_debounce,
            slot: Mutex::new(Slot {
                phase: Phase::Loading,
                store: Store::new(Journal::template()),
                sync: None,
            }),
            started: Instant::now(),
            last_seen_ms: AtomicU64::new(0),
        })
    }

    pub fn touch(&self) {
        let elapsed = self.started.elapsed().as_millis() as u64;
        self.last_seen_ms.store(elapsed, Ordering::Relaxed);
    }

    pub fn idle_for(&self) -> Duration {
        let seen = self.started + Duration::from_millis(self.last_seen_ms.load(Ordering::Relaxed));
        Instant::now().saturating_duration_since(seen)
    }

    /// Runs hydration once in the background; pages show a loading state until it finishes.
    pub fn start_hydration(self: &Arc<Self>, legacy_dir: PathBuf) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let hydrated = hydrate(this.backend.as_ref(), &this.session, &legacy_dir).await;
            this.finish_hydration(hydrated).await;
        });
    }

    pub async fn finish_hydration(&self, hydrated: Hydrated) {
        let mut slot = self.slot.lock().await;
        if slot.phase != Phase::Loading {
            return;
        }
        match hydrated {
            Hydrated::Remote(journal) => {
                info!(user_id = %self.session.user_id, "loaded stored journal");
                slot.store.replace(journal);
                self.become_ready(&mut slot, false);
            }
            Hydrated::Legacy(journal) => {
                slot.phase = Phase::AwaitingImport(Arc::new(journal));
            }
            Hydrated::Template => {
                info!(user_id = %self.session.user_id, "starting from an empty journal");
                slot.store.replace(Journal::template());
                self.become_ready(&mut slot, true);
            }
            Hydrated::Unavailable => {
                warn!(user_id = %self.session.user_id, "stored journal unavailable, showing an empty one without saving");
                slot.store.replace(Journal::template());
                self.become_ready(&mut slot, false);
            }
        }
    }

    /// Adopts the legacy journal when `accept` is true, the template otherwise.
    pub async fn resolve_legacy_import(&self, accept: bool) -> Result<(), SessionError> {
        let mut slot = self.slot.lock().await;
        let Phase::AwaitingImport(legacy) = &slot.phase else {
            return Err(SessionError::NoPendingImport);
        };
        let journal = if accept {
            info!(user_id = %self.session.user_id, "importing legacy journal");
            (**legacy).clone()
        } else {
            Journal::template()
        };
        slot.store.replace(journal);
        self.become_ready(&mut slot, true);
        Ok(())
    }

    fn become_ready(&self, slot: &mut Slot, save_now: bool) {
        let sync = SyncHandle::spawn(Arc::clone(&self.backend), self.session.clone(), self.save_debounce);
        if save_now {
            sync.schedule(slot.store.current());
        }
        slot.sync = Some(sync);
        slot.phase = Phase::Ready;
    }

    pub async fn view(&self) -> SessionView {
        let slot = self.slot.lock().await;
        SessionView {
            phase: slot.phase.clone(),
            journal: slot.store.current(),
            last_saved: slot.sync.as_ref().and_then(SyncHandle::last_saved),
        }
    }

    pub async fn update_day(&self, week_number: u8, day_id: &str, patch: &DayPatch) -> Result<Arc<Journal>, SessionError> {
        let mut slot = self.slot.lock().await;
        if slot.phase != Phase::Ready {
            return Err(SessionError::NotReady);
        }
        let journal = slot
            .store
            .update_day(week_number, day_id, patch)
            .ok_or(SessionError::UnknownDay)?;
        if let Some(sync) = &slot.sync {
            sync.schedule(Arc::clone(&journal));
        }
        Ok(journal)
    }

    /// Swaps the whole journal, as import and reset do.
    pub async fn replace(&self, journal: Journal) -> Result<Arc<Journal>, SessionError> {
        let mut slot = self.slot.lock().await;
        if slot.phase != Phase::Ready {
            return Err(SessionError::NotReady);
        }
        let journal = slot.store.replace(journal);
        if let Some(sync) = &slot.sync {
            sync.schedule(Arc::clone(&journal));
        }
        Ok(journal)
    }

    /// Flushes pending saves, then signs out of the backend.
    pub async fn close(&self) {
        let sync = self.slot.lock().await.sync.take();
        if let Some(sync) = sync {
            sync.shutdown().await;
        }
        if let Err(err) = self.backend.sign_out(&self.session).await {
            warn!(user_id = %self.session.user_id, "sign out failed: {err}");
        }
    }
}

/// Live sessions keyed by the cookie token.
#[derive(Default)]
pub struct Sessions {
    by_token: RwLock<HashMap<String, Arc<UserSession>>>,
}

impl Sessions {
    pub async fn insert(&self, session: Arc<UserSession>) -> String {
        let token = Uuid::new_v4().to_string();
        self.by_token.write().await.insert(token.clone(), session);
        token
    }

    /// Looks up a session and marks it as active.
    pub async fn get(&self, token: &str) -> Option<Arc<UserSession>> {
        let session = self.by_token.read().await.get(token).cloned()?;
        session.touch();
        Some(session)
    }

    pub async fn remove(&self, token: &str) -> Option<Arc<UserSession>> {
        self.by_token.write().await.remove(token)
    }

    /// Drops every session idle for at least `max_idle` and hands them back for closing.
    pub async fn remove_idle(&self, max_idle: Duration) -> Vec<Arc<UserSession>> {
        let mut by_token = self.by_token.write().await;
        let idle: Vec<String> = by_token
            .iter()
            .filter(|(_, session)| session.idle_for() >= max_idle)
            .map(|(token, _)| token.clone())
            .collect();
        idle.iter().filter_map(|token| by_token.remove(token)).collect()
    }

    pub async fn len(&self) -> usize {
        self.by_token.read().await.len()
    }
}

pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically closes sessions nobody has used for `max_idle`.
pub fn spawn_idle_sweeper(sessions: Arc<Sessions>, max_idle: Duration) -> JoinHandle<()> {
    let period = SESSION_SWEEP_INTERVAL.min(max_idle).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for user in sessions.remove_idle(max_idle).await {
                info!(user_id = %user.session.user_id, "session expired");
                user.close().await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendDocument, BackendError, FileBackend, UserRecord};
    use crate::models::{Profile, StoredState};
    use tokio::fs;

    async fn setup(dir: &Path) -> (Arc<FileBackend>, Session) {
        let backend = Arc::new(FileBackend::with_document(
            dir.join("backend.json"),
            BackendDocument {
                users: vec![UserRecord {
                    id: "u1".to_string(),
                    email: "u1@example.com".to_string(),
                    password: "pw".to_string(),
                    role: Role::Client,
                    created_at: None,
                }],
                ..BackendDocument::default()
            },
        ));
        let session = backend.sign_in("u1@example.com", "pw").await.unwrap();
        (backend, session)
    }

    /// Serves reads with an error and counts every write.
    #[derive(Default)]
    struct UnreachableBackend {
        writes: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Backend for UnreachableBackend {
        async fn sign_in(&self, email: &str, _: &str) -> Result<Session, BackendError> {
            Ok(Session {
                user_id: "u1".to_string(),
                email: email.to_string(),
                access_token: "t".to_string(),
            })
        }

        async fn sign_out(&self, _: &Session) -> Result<(), BackendError> {
            Ok(())
        }

        async fn select_profile(&self, _: &Session, _: &str) -> Result<Option<Profile>, BackendError> {
            Ok(None)
        }

        async fn list_clients(&self, _: &Session) -> Result<Vec<Profile>, BackendError> {
            Ok(Vec::new())
        }

        async fn get_user_state(&self, _: &Session, _: &str) -> Result<Option<StoredState>, BackendError> {
            Err(BackendError::Transport("timeout".to_string()))
        }

        async fn upsert_user_state(&self, _: &Session, _: &str, _: &Journal) -> Result<(), BackendError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_remote_read_never_saves_the_template() {
        let backend = Arc::new(UnreachableBackend::default());
        let session = backend.sign_in("u1@example.com", "pw").await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let hydrated = hydrate(backend.as_ref(), &session, dir.path()).await;
        assert_eq!(hydrated, Hydrated::Unavailable);

        let user = UserSession::new(backend.clone(), session, Role::Client, Duration::from_millis(10));
        user.finish_hydration(hydrated).await;
        let view = user.view().await;
        assert_eq!(view.phase, Phase::Ready);
        assert_eq!(*view.journal, Journal::template());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 0);

        let patch = DayPatch {
            workout: Some(true),
            ..DayPatch::default()
        };
        user.update_day(1, "w1-d1", &patch).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_removed_and_active_ones_kept() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, session) = setup(dir.path()).await;
        let sessions = Sessions::default();
        let new_user = || UserSession::new(backend.clone(), session.clone(), Role::Client, Duration::from_millis(10));

        let stale = sessions.insert(new_user()).await;
        tokio::time::advance(Duration::from_secs(50)).await;
        let active = sessions.insert(new_user()).await;
        assert!(sessions.remove_idle(Duration::from_secs(60)).await.is_empty());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(sessions.get(&active).await.is_some());
        let removed = sessions.remove_idle(Duration::from_secs(60)).await;
        assert_eq!(removed.len(), 1);
        assert!(sessions.get(&stale).await.is_none());
        assert!(sessions.get(&active).await.is_some());
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn hydrate_without_any_source_yields_template() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, session) = setup(dir.path()).await;
        let hydrated = hydrate(backend.as_ref(), &session, &dir.path().join("legacy")).await;
        assert_eq!(hydrated, Hydrated::Template);
    }

    #[tokio::test]
    async fn hydrate_prefers_remote_over_legacy() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, session) = setup(dir.path()).await;
        let legacy_dir = dir.path().join("legacy");
        fs::create_dir_all(&legacy_dir).await.unwrap();
        let mut legacy = Journal::template();
        legacy.weeks.truncate(1);
        fs::write(legacy_dir.join("u1.json"), serde_json::to_vec(&legacy).unwrap())
            .await
            .unwrap();

        assert_eq!(
            hydrate(backend.as_ref(), &session, &legacy_dir).await,
            Hydrated::Legacy(legacy)
        );

        backend
            .upsert_user_state(&session, "u1", &Journal::template())
            .await
            .unwrap();
        assert_eq!(
            hydrate(backend.as_ref(), &session, &legacy_dir).await,
            Hydrated::Remote(Journal::template())
        );
    }

    #[tokio::test]
    async fn edits_wait_for_hydration() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, session) = setup(dir.path()).await;
        let user = UserSession::new(backend, session, Role::Client, Duration::from_millis(10));

        assert_eq!(
            user.update_day(1, "w1-d1", &DayPatch::default()).await.unwrap_err(),
            SessionError::NotReady
        );
        user.finish_hydration(Hydrated::Template).await;
        assert_eq!(user.view().await.phase, Phase::Ready);
        assert!(user.update_day(1, "w1-d1", &DayPatch::default()).await.is_ok());
        assert_eq!(
            user.update_day(1, "w2-d1", &DayPatch::default()).await.unwrap_err(),
            SessionError::UnknownDay
        );
    }

    #[tokio::test]
    async fn declining_legacy_import_uses_template() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, session) = setup(dir.path()).await;
        let user = UserSession::new(backend, session, Role::Client, Duration::from_millis(10));
        let mut legacy = Journal::template();
        legacy.weeks.truncate(2);

        user.finish_hydration(Hydrated::Legacy(legacy.clone())).await;
        assert_eq!(user.view().await.phase, Phase::AwaitingImport(Arc::new(legacy)));
        user.resolve_legacy_import(false).await.unwrap();
        let view = user.view().await;
        assert_eq!(view.phase, Phase::Ready);
        assert_eq!(*view.journal, Journal::template());
        assert_eq!(
            user.resolve_legacy_import(true).await.unwrap_err(),
            SessionError::NoPendingImport
        );
    }

    #[tokio::test]
    async fn accepted_legacy_import_is_saved_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, session) = setup(dir.path()).await;
        let user = UserSession::new(backend.clone(), session.clone(), Role::Client, Duration::from_secs(60));
        let mut legacy = Journal::template();
        legacy.weeks.truncate(3);

        user.finish_hydration(Hydrated::Legacy(legacy.clone())).await;
        user.resolve_legacy_import(true).await.unwrap();
        assert_eq!(*user.view().await.journal, legacy);

        let reader = backend.sign_in("u1@example.com", "pw").await.unwrap();
        user.close().await;
        let stored = backend.get_user_state(&reader, "u1").await.unwrap().unwrap();
        assert_eq!(stored.data, legacy);
    }
}
