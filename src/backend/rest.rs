use super::{Backend, BackendError};
use crate::models::{Journal, Profile, Session, StoredState};
use crate::transfer::journal_from_value;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Client for a hosted GoTrue + PostgREST service.
#[derive(Debug, Clone)]
pub struct RestBackend {
    http: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateRow {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct StateUpsert<'a> {
    user_id: &'a str,
    data: &'a Journal,
    updated_at: DateTime<Utc>,
}

impl RestBackend {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("fr-journal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let res = request.send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        if status.is_success() {
            return res.json::<T>().await.map_err(|e| BackendError::Decode(e.to_string()));
        }
        let body = res.text().await.unwrap_or_default();
        Err(BackendError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(), BackendError> {
        let res = request.send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(BackendError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let res = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let token = res
                    .json::<TokenResponse>()
                    .await
                    .map_err(|e| BackendError::Decode(e.to_string()))?;
                Ok(Session {
                    email: token.user.email.unwrap_or_else(|| email.to_string()),
                    user_id: token.user.id,
                    access_token: token.access_token,
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = res.text().await.unwrap_or_default();
                Err(BackendError::AuthFailed(auth_error_message(&body)))
            }
            s => {
                let body = res.text().await.unwrap_or_default();
                Err(BackendError::Http {
                    status: s.as_u16(),
                    body,
                })
            }
        }
    }

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError> {
        let request = self.authorized(self.http.post(self.auth_url("logout")), session);
        self.execute(request).await
    }

    async fn select_profile(&self, session: &Session, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let request = self.authorized(self.http.get(self.table_url("profiles")), session).query(&[
            ("select", "id,email,role".to_string()),
            ("id", format!("eq.{user_id}")),
        ]);
        let rows: Vec<Profile> = self.fetch(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_clients(&self, session: &Session) -> Result<Vec<Profile>, BackendError> {
        let request = self.authorized(self.http.get(self.table_url("profiles")), session).query(&[
            ("select", "id,email,role"),
            ("role", "neq.admin"),
            ("order", "created_at.desc"),
        ]);
        self.fetch(request).await
    }

    async fn get_user_state(&self, session: &Session, user_id: &str) -> Result<Option<StoredState>, BackendError> {
        let request = self.authorized(self.http.get(self.table_url("user_state")), session).query(&[
            ("select", "data,updated_at".to_string()),
            ("user_id", format!("eq.{user_id}")),
        ]);
        let rows: Vec<StateRow> = self.fetch(request).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let Some(data) = row.data.filter(|data| data.get("weeks").is_some_and(|weeks| !weeks.is_null())) else {
            warn!(user_id, "stored state has no weeks, treating as empty");
            return Ok(None);
        };
        let data = journal_from_value(data).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Some(StoredState {
            data,
            updated_at: row.updated_at,
        }))
    }

    async fn upsert_user_state(&self, session: &Session, user_id: &str, data: &Journal) -> Result<(), BackendError> {
        let request = self
            .authorized(self.http.post(self.table_url("user_state")), session)
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&StateUpsert {
                user_id,
                data,
                updated_at: Utc::now(),
            });
        self.execute(request).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Transport("timeout".to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

/// Pulls the human readable message out of an auth error body.
fn auth_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| "Invalid login credentials".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_message_prefers_description() {
        assert_eq!(
            auth_error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(auth_error_message(r#"{"msg":"Email not confirmed"}"#), "Email not confirmed");
        assert_eq!(auth_error_message("<html>"), "Invalid login credentials");
    }

    #[test]
    fn urls_strip_trailing_slash() {
        let backend = RestBackend::new("https://example.supabase.co/", "anon").unwrap();
        assert_eq!(backend.auth_url("token"), "https://example.supabase.co/auth/v1/token");
        assert_eq!(backend.table_url("user_state"), "https://example.supabase.co/rest/v1/user_state");
    }
}
