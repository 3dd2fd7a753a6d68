use crate::backend::BackendError;
use crate::coach::resolve_view;
use crate::errors::AppError;
use crate::models::{
    ClientStateResponse, CoachQuery, DayData, DayPatch, Journal, LegacyImportForm, LoginForm, Profile,
    SyncStatusResponse, WEEK_COUNT,
};
use crate::session::{Phase, UserSession};
use crate::state::AppState;
use crate::stats::{build_summary, SummaryResponse};
use crate::transfer::{export_file_name, export_json, parse_journal};
use crate::ui::{
    render_coach, render_index, render_legacy_prompt, render_loading, render_login, render_not_found, render_week,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const SESSION_COOKIE: &str = "frj_session";

async fn current_user(state: &AppState, jar: &CookieJar) -> Option<Arc<UserSession>> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    state.sessions.get(&token).await
}

/// Drops the session behind the request cookie, if any. Pending saves still go
/// out; the response does not wait for them.
async fn end_session(state: &AppState, jar: &CookieJar) {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return;
    };
    if let Some(user) = state.sessions.remove(cookie.value()).await {
        info!(user_id = %user.session.user_id, "signed out");
        tokio::spawn(async move { user.close().await });
    }
}

async fn api_user(state: &AppState, jar: &CookieJar) -> Result<Arc<UserSession>, AppError> {
    current_user(state, jar).await.ok_or_else(AppError::unauthorized)
}

async fn coach_user(state: &AppState, jar: &CookieJar) -> Result<Arc<UserSession>, AppError> {
    let user = api_user(state, jar).await?;
    if !user.role.is_admin() {
        return Err(AppError::forbidden());
    }
    Ok(user)
}

async fn ready_journal(user: &UserSession) -> Result<Arc<Journal>, AppError> {
    let view = user.view().await;
    if view.phase != Phase::Ready {
        return Err(AppError::conflict("journal is still loading"));
    }
    Ok(view.journal)
}

pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if current_user(&state, &jar).await.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(render_login(None)).into_response()
}

pub async fn login(State(state): State<AppState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let session = match state.backend.sign_in(form.email.trim(), &form.password).await {
        Ok(session) => session,
        Err(err) => {
            warn!("sign in failed for {}: {err}", form.email.trim());
            let status = match err {
                BackendError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            return (status, Html(render_login(Some(&err.to_string())))).into_response();
        }
    };

    let role = match state.backend.select_profile(&session, &session.user_id).await {
        Ok(profile) => profile.map(|profile| profile.role).unwrap_or_default(),
        Err(err) => {
            warn!(user_id = %session.user_id, "failed to load profile, assuming client role: {err}");
            Default::default()
        }
    };
    info!(user_id = %session.user_id, role = role.as_str(), "signed in");
    end_session(&state, &jar).await;

    let user = UserSession::new(Arc::clone(&state.backend), session, role, state.config.save_debounce);
    user.start_hydration(state.config.legacy_dir.clone());
    let token = state.sessions.insert(user).await;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), Redirect::to("/")).into_response()
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    end_session(&state, &jar).await;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login")).into_response()
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(user) = current_user(&state, &jar).await else {
        return Redirect::to("/login").into_response();
    };
    let view = user.view().await;
    let email = &user.session.email;
    match &view.phase {
        Phase::Loading => Html(render_loading()).into_response(),
        Phase::AwaitingImport(legacy) => Html(render_legacy_prompt(email, user.role, legacy)).into_response(),
        Phase::Ready => Html(render_index(email, user.role, &view)).into_response(),
    }
}

pub async fn week_page(State(state): State<AppState>, jar: CookieJar, Path(week): Path<String>) -> Response {
    let Some(user) = current_user(&state, &jar).await else {
        return Redirect::to("/login").into_response();
    };
    let week_number = match week.parse::<u8>() {
        Ok(n) if (1..=WEEK_COUNT).contains(&n) => n,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Html(render_not_found(&format!("There is no week {week}."))),
            )
                .into_response();
        }
    };

    let view = user.view().await;
    if view.phase != Phase::Ready {
        return Redirect::to("/").into_response();
    }
    match view.journal.week(week_number) {
        Some(week) => Html(render_week(&user.session.email, user.role, week, view.last_saved)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html(render_not_found(&format!("There is no week {week_number}."))),
        )
            .into_response(),
    }
}

pub async fn legacy_import(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LegacyImportForm>,
) -> Result<Redirect, AppError> {
    let Some(user) = current_user(&state, &jar).await else {
        return Ok(Redirect::to("/login"));
    };
    user.resolve_legacy_import(form.accept).await?;
    Ok(Redirect::to("/"))
}

pub async fn reset_form(State(state): State<AppState>, jar: CookieJar) -> Result<Redirect, AppError> {
    let Some(user) = current_user(&state, &jar).await else {
        return Ok(Redirect::to("/login"));
    };
    user.replace(Journal::template()).await?;
    info!(user_id = %user.session.user_id, "journal reset");
    Ok(Redirect::to("/"))
}

pub async fn coach_page(State(state): State<AppState>, jar: CookieJar, Query(query): Query<CoachQuery>) -> Response {
    let Some(user) = current_user(&state, &jar).await else {
        return Redirect::to("/login").into_response();
    };
    if !user.role.is_admin() {
        return AppError::forbidden().into_response();
    }

    let (roster, roster_error) = match state.backend.list_clients(&user.session).await {
        Ok(roster) => (roster, None),
        Err(err) => {
            error!("failed to load client roster: {err}");
            (Vec::new(), Some(err.to_string()))
        }
    };
    let view = resolve_view(state.backend.as_ref(), &user.session, &roster, &query).await;
    Html(render_coach(&user.session.email, &roster, roster_error.as_deref(), &view)).into_response()
}

pub async fn get_state(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Journal>, AppError> {
    let user = api_user(&state, &jar).await?;
    let journal = ready_journal(&user).await?;
    Ok(Json((*journal).clone()))
}

pub async fn patch_day(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((week, day_id)): Path<(u8, String)>,
    Json(patch): Json<DayPatch>,
) -> Result<Json<DayData>, AppError> {
    let user = api_user(&state, &jar).await?;
    let journal = user.update_day(week, &day_id, &patch).await?;
    let day = journal
        .week(week)
        .and_then(|week| week.day(&day_id))
        .ok_or_else(|| AppError::not_found("no such day"))?;
    Ok(Json((**day).clone()))
}

pub async fn get_summary(State(state): State<AppState>, jar: CookieJar) -> Result<Json<SummaryResponse>, AppError> {
    let user = api_user(&state, &jar).await?;
    let journal = ready_journal(&user).await?;
    Ok(Json(build_summary(&journal)))
}

pub async fn get_sync(State(state): State<AppState>, jar: CookieJar) -> Result<Json<SyncStatusResponse>, AppError> {
    let user = api_user(&state, &jar).await?;
    Ok(Json(SyncStatusResponse {
        last_saved: user.view().await.last_saved,
    }))
}

pub async fn export(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let user = api_user(&state, &jar).await?;
    let journal = ready_journal(&user).await?;
    let payload = export_json(&journal).map_err(AppError::internal)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(Utc::now().date_naive())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        payload,
    )
        .into_response())
}

pub async fn import(State(state): State<AppState>, jar: CookieJar, body: Bytes) -> Result<StatusCode, AppError> {
    let user = api_user(&state, &jar).await?;
    let journal = parse_journal(&body)?;
    user.replace(journal).await?;
    info!(user_id = %user.session.user_id, "journal imported");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset(State(state): State<AppState>, jar: CookieJar) -> Result<StatusCode, AppError> {
    let user = api_user(&state, &jar).await?;
    user.replace(Journal::template()).await?;
    info!(user_id = %user.session.user_id, "journal reset");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn coach_clients(State(state): State<AppState>, jar: CookieJar) -> Result<Json<Vec<Profile>>, AppError> {
    let user = coach_user(&state, &jar).await?;
    Ok(Json(state.backend.list_clients(&user.session).await?))
}

pub async fn coach_client_state(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(client_id): Path<String>,
) -> Result<Json<ClientStateResponse>, AppError> {
    let user = coach_user(&state, &jar).await?;
    let client = state
        .backend
        .list_clients(&user.session)
        .await?
        .into_iter()
        .find(|client| client.id == client_id)
        .ok_or_else(|| AppError::not_found("no such client"))?;
    let stored = state.backend.get_user_state(&user.session, &client.id).await?;
    Ok(Json(ClientStateResponse {
        client,
        state: stored,
    }))
}
