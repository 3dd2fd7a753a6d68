//! Read-only browsing of client journals for coaches.
//!
//! The coach page is a small state machine driven by the links the coach
//! clicks: pick a client, then a week, then a day. Each step only narrows the
//! selection made before it, and choosing a new client starts over.

use crate::backend::{Backend, BackendError};
use crate::models::{CoachQuery, DayData, Profile, Session, StoredState, WeekData};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientData {
    Loading,
    Loaded(Arc<StoredState>),
    /// The client has never saved anything. Not an error.
    NoData,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoachView {
    NoClientSelected,
    ClientSelected {
        client: Profile,
        data: ClientData,
    },
    WeekSelected {
        client: Profile,
        state: Arc<StoredState>,
        week: u8,
    },
    DaySelected {
        client: Profile,
        state: Arc<StoredState>,
        week: u8,
        day_id: String,
    },
}

impl CoachView {
    pub fn select_client(self, client: Profile) -> Self {
        CoachView::ClientSelected {
            client,
            data: ClientData::Loading,
        }
    }

    /// Records the result of fetching the selected client's journal.
    pub fn loaded(self, result: Result<Option<StoredState>, BackendError>) -> Self {
        match self {
            CoachView::ClientSelected {
                client,
                data: ClientData::Loading,
            } => {
                let data = match result {
                    Ok(Some(state)) => ClientData::Loaded(Arc::new(state)),
                    Ok(None) => ClientData::NoData,
                    Err(err) => ClientData::Error(err.to_string()),
                };
                CoachView::ClientSelected { client, data }
            }
            other => other,
        }
    }

    pub fn select_week(self, week: u8) -> Self {
        let (client, state) = match self {
            CoachView::ClientSelected {
                client,
                data: ClientData::Loaded(state),
            }
            | CoachView::WeekSelected { client, state, .. }
            | CoachView::DaySelected { client, state, .. } => (client, state),
            other => return other,
        };
        if state.data.week(week).is_none() {
            return CoachView::ClientSelected {
                client,
                data: ClientData::Loaded(state),
            };
        }
        CoachView::WeekSelected { client, state, week }
    }

    pub fn select_day(self, day_id: &str) -> Self {
        let (client, state, week) = match self {
            CoachView::WeekSelected { client, state, week }
            | CoachView::DaySelected {
                client, state, week, ..
            } => (client, state, week),
            other => return other,
        };
        let exists = state
            .data
            .week(week)
            .is_some_and(|w| w.day(day_id).is_some());
        if !exists {
            return CoachView::WeekSelected { client, state, week };
        }
        CoachView::DaySelected {
            client,
            state,
            week,
            day_id: day_id.to_string(),
        }
    }

    pub fn client(&self) -> Option<&Profile> {
        match self {
            CoachView::NoClientSelected => None,
            CoachView::ClientSelected { client, .. }
            | CoachView::WeekSelected { client, .. }
            | CoachView::DaySelected { client, .. } => Some(client),
        }
    }

    pub fn state(&self) -> Option<&Arc<StoredState>> {
        match self {
            CoachView::ClientSelected {
                data: ClientData::Loaded(state),
                ..
            }
            | CoachView::WeekSelected { state, .. }
            | CoachView::DaySelected { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn week(&self) -> Option<&Arc<WeekData>> {
        match self {
            CoachView::WeekSelected { state, week, .. } | CoachView::DaySelected { state, week, .. } => {
                state.data.week(*week)
            }
            _ => None,
        }
    }

    pub fn day(&self) -> Option<&Arc<DayData>> {
        match self {
            CoachView::DaySelected { day_id, .. } => self.week()?.day(day_id),
            _ => None,
        }
    }
}

/// Builds the view for the selection encoded in `query`.
///
/// Clients that are not on the roster are ignored.
pub async fn resolve_view(
    backend: &dyn Backend,
    session: &Session,
    roster: &[Profile],
    query: &CoachQuery,
) -> CoachView {
    let view = CoachView::NoClientSelected;
    let Some(client_id) = query.client.as_deref() else {
        return view;
    };
    let Some(client) = roster.iter().find(|client| client.id == client_id) else {
        warn!(client_id, "coach selected a client outside the roster");
        return view;
    };

    let view = view.select_client(client.clone());
    let result = backend.get_user_state(session, &client.id).await;
    if let Err(err) = &result {
        warn!(client_id, "failed to load client journal: {err}");
    }
    let mut view = view.loaded(result);

    if let Some(week) = query.week_number() {
        view = view.select_week(week);
        if let Some(day_id) = query.day.as_deref() {
            view = view.select_day(day_id);
        }
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Journal, Role};

    fn client() -> Profile {
        Profile {
            id: "c1".to_string(),
            email: "c1@example.com".to_string(),
            role: Role::Client,
        }
    }

    fn stored() -> StoredState {
        StoredState {
            data: Journal::template(),
            updated_at: None,
        }
    }

    #[test]
    fn full_selection_path() {
        let view = CoachView::NoClientSelected.select_client(client());
        assert_eq!(
            view,
            CoachView::ClientSelected {
                client: client(),
                data: ClientData::Loading
            }
        );
        let view = view.loaded(Ok(Some(stored()))).select_week(3).select_day("w3-d2");
        assert_eq!(view.day().unwrap().id, "w3-d2");
        assert_eq!(view.week().unwrap().week_number, 3);
        assert_eq!(view.client().unwrap().id, "c1");
    }

    #[test]
    fn missing_state_is_no_data() {
        let view = CoachView::NoClientSelected.select_client(client()).loaded(Ok(None));
        assert!(matches!(
            view,
            CoachView::ClientSelected {
                data: ClientData::NoData,
                ..
            }
        ));
        assert!(matches!(view.select_week(1), CoachView::ClientSelected { .. }));
    }

    #[test]
    fn load_error_is_kept_as_message() {
        let view = CoachView::NoClientSelected
            .select_client(client())
            .loaded(Err(BackendError::Transport("down".into())));
        assert_eq!(
            view,
            CoachView::ClientSelected {
                client: client(),
                data: ClientData::Error("network error: down".into())
            }
        );
    }

    #[test]
    fn unknown_week_or_day_stays_at_previous_level() {
        let loaded = CoachView::NoClientSelected
            .select_client(client())
            .loaded(Ok(Some(stored())));
        assert!(matches!(loaded.clone().select_week(12), CoachView::ClientSelected { .. }));
        let week = loaded.select_week(2);
        assert!(matches!(week.clone().select_day("w3-d1"), CoachView::WeekSelected { week: 2, .. }));
        assert!(matches!(week.select_day("w2-d7"), CoachView::DaySelected { .. }));
    }

    #[tokio::test]
    async fn malformed_week_stays_at_client_level() {
        use crate::backend::{BackendDocument, FileBackend, UserRecord};

        let dir = tempfile::tempdir().unwrap();
        let record = |id: &str, role| UserRecord {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            password: "pw".to_string(),
            role,
            created_at: None,
        };
        let backend = FileBackend::with_document(
            dir.path().join("backend.json"),
            BackendDocument {
                users: vec![record("coach", Role::Admin), record("c1", Role::Client)],
                ..BackendDocument::default()
            },
        );
        let coach = backend.sign_in("coach@example.com", "pw").await.unwrap();
        let c1 = backend.sign_in("c1@example.com", "pw").await.unwrap();
        backend.upsert_user_state(&c1, "c1", &Journal::template()).await.unwrap();
        let roster = vec![client()];

        for week in ["", "abc", "-1", "300"] {
            let query = CoachQuery {
                client: Some("c1".to_string()),
                week: Some(week.to_string()),
                day: Some("w1-d1".to_string()),
            };
            let view = resolve_view(&backend, &coach, &roster, &query).await;
            assert!(
                matches!(view, CoachView::ClientSelected { data: ClientData::Loaded(_), .. }),
                "week {week:?}"
            );
        }

        let query = CoachQuery {
            client: Some("c1".to_string()),
            week: Some(" 2 ".to_string()),
            day: None,
        };
        let view = resolve_view(&backend, &coach, &roster, &query).await;
        assert!(matches!(view, CoachView::WeekSelected { week: 2, .. }));
    }

    #[test]
    fn selecting_a_day_before_a_week_does_nothing() {
        let view = CoachView::NoClientSelected
            .select_client(client())
            .loaded(Ok(Some(stored())))
            .select_day("w1-d1");
        assert!(matches!(view, CoachView::ClientSelected { .. }));
    }
}
