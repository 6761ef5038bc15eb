use crate::calendar::EventDraft;
use crate::directory::{Confirmation, DeleteOutcome};
use crate::errors::{ApiError, ApiResult, AppError};
use crate::models::{
    ConfirmForm, DirectoryStats, EventForm, FieldErrors, LoginForm, Member, MemberForm, MemberId,
    MembersQuery,
};
use crate::query::{PageView, QueryState};
use crate::session::SessionProvider;
use crate::state::{AppState, Notice, NoticeKind};
use crate::stats::{build_stats, fetch_gym_stats};
use crate::storage::persist_session;
use crate::ui;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::NaiveDate;
use tracing::{error, info, warn};

pub async fn index(State(state): State<AppState>) -> Redirect {
    if state.session.is_signed_in() {
        Redirect::to("/members")
    } else {
        Redirect::to("/login")
    }
}

pub async fn login_page() -> Html<String> {
    Html(ui::render_login("", None))
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let client = state.directory.client();
    match client.login(&form.username, &form.password).await {
        Ok(tokens) => {
            state.session.set(Some(form.username.trim().to_string()), tokens);
            save_session(&state).await;
            state.directory.forget().await;
            info!(user = form.username.trim(), "signed in");
            Redirect::to("/members").into_response()
        }
        Err(err) => {
            let message = match &err {
                ApiError::Unauthorized => "Invalid username or password".to_string(),
                ApiError::ValidationFailed(_) => "Please enter your username and password".to_string(),
                other => other.user_message(),
            };
            Html(ui::render_login(&form.username, Some(&message))).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> Redirect {
    sign_out(&state).await;
    Redirect::to("/login")
}

pub async fn members_page(
    State(state): State<AppState>,
    Query(params): Query<MembersQuery>,
) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };

    if let Err(err) = checked(&state, state.directory.ensure_loaded().await).await {
        if matches!(err, ApiError::Unauthorized) {
            return Redirect::to("/login").into_response();
        }
        state.notify(NoticeKind::Error, err.user_message()).await;
    }

    let mut query = query_state(&params);
    let page = state.directory.page(&mut query).await;
    let notice = state.take_notice().await;
    Html(ui::render_members(&user, notice.as_ref(), &query.term, &page)).into_response()
}

pub async fn reload_members(State(state): State<AppState>) -> Response {
    match checked(&state, state.directory.reload().await).await {
        Ok(count) => {
            state.notify(NoticeKind::Success, format!("{count} members loaded")).await;
            Redirect::to("/members").into_response()
        }
        Err(err) => failure(&state, err, "/members").await,
    }
}

pub async fn new_member_page(State(state): State<AppState>) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };
    let html = ui::render_member_form(&user, None, "New member", "/members", &MemberForm::blank(), None);
    Html(html).into_response()
}

pub async fn create_member(State(state): State<AppState>, Form(form): Form<MemberForm>) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };
    match checked(&state, state.directory.create(&form.to_payload()).await).await {
        Ok(member) => {
            state
                .notify(NoticeKind::Success, format!("{} was added", member.full_name))
                .await;
            Redirect::to("/members").into_response()
        }
        Err(err) => form_failure(&user, err, "New member", "/members", &form),
    }
}

pub async fn edit_member_page(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };
    let member = match cached_member(&state, id).await {
        Ok(Some(member)) => member,
        Ok(None) => return not_found(&state).await,
        Err(err) => return failure(&state, err, "/members").await,
    };
    let action = format!("/members/{id}");
    let html = ui::render_member_form(
        &user,
        None,
        "Edit member",
        &action,
        &MemberForm::from_member(&member),
        None,
    );
    Html(html).into_response()
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<MemberForm>,
) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };
    let result = state.directory.update(MemberId(id), &form.to_payload()).await;
    match checked(&state, result).await {
        Ok(member) => {
            state
                .notify(NoticeKind::Success, format!("{} was updated", member.full_name))
                .await;
            Redirect::to("/members").into_response()
        }
        Err(err) => {
            let action = format!("/members/{id}");
            form_failure(&user, err, "Edit member", &action, &form)
        }
    }
}

pub async fn toggle_member(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let member = match cached_member(&state, id).await {
        Ok(Some(member)) => member,
        Ok(None) => return not_found(&state).await,
        Err(err) => return failure(&state, err, "/members").await,
    };
    match checked(&state, state.directory.toggle_active(&member).await).await {
        Ok(updated) => {
            let status = if updated.is_active { "activated" } else { "deactivated" };
            state
                .notify(NoticeKind::Success, format!("{} was {status}", updated.full_name))
                .await;
            Redirect::to("/members").into_response()
        }
        Err(err) => failure(&state, err, "/members").await,
    }
}

pub async fn confirm_delete_page(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };
    match cached_member(&state, id).await {
        Ok(Some(member)) => Html(ui::render_confirm_delete(&user, &member)).into_response(),
        Ok(None) => not_found(&state).await,
        Err(err) => failure(&state, err, "/members").await,
    }
}

pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    let confirmation = confirmation(&form);
    match checked(&state, state.directory.delete(MemberId(id), confirmation).await).await {
        Ok(DeleteOutcome::Deleted) => {
            state.notify(NoticeKind::Success, "Member deleted").await;
            Redirect::to("/members").into_response()
        }
        Ok(DeleteOutcome::Cancelled) => Redirect::to("/members").into_response(),
        Err(err) => failure(&state, err, "/members").await,
    }
}

pub async fn stats_page(State(state): State<AppState>) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };

    let gym = fetch_gym_stats(state.directory.client(), state.config.gym_id).await;
    let gym = match checked(&state, gym).await {
        Ok(gym) => Some(gym),
        Err(ApiError::Unauthorized) => return Redirect::to("/login").into_response(),
        Err(err) => {
            state.notify(NoticeKind::Error, err.user_message()).await;
            None
        }
    };

    let local = match local_stats(&state).await {
        Ok(local) => local,
        Err(ApiError::Unauthorized) => return Redirect::to("/login").into_response(),
        Err(err) => {
            state.notify(NoticeKind::Error, err.user_message()).await;
            build_stats(&[])
        }
    };

    let notice = state.take_notice().await;
    Html(ui::render_stats(&user, notice.as_ref(), gym.as_ref(), &local)).into_response()
}

pub async fn calendar_page(State(state): State<AppState>) -> Response {
    let Some(user) = signed_in_user(&state) else {
        return Redirect::to("/login").into_response();
    };
    let events = match checked(&state, state.calendar.list().await).await {
        Ok(events) => events,
        Err(ApiError::Unauthorized) => return Redirect::to("/login").into_response(),
        Err(err) => {
            state.notify(NoticeKind::Error, err.user_message()).await;
            Vec::new()
        }
    };
    let notice = state.take_notice().await;
    Html(ui::render_calendar(&user, notice.as_ref(), &events)).into_response()
}

pub async fn create_event(State(state): State<AppState>, Form(form): Form<EventForm>) -> Response {
    let result = match event_draft(form) {
        Ok(draft) => state.calendar.create(draft).await,
        Err(err) => Err(err),
    };
    match checked(&state, result).await {
        Ok(()) => {
            state.notify(NoticeKind::Success, "Activity added").await;
            Redirect::to("/calendar").into_response()
        }
        Err(err) => failure(&state, err, "/calendar").await,
    }
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<EventForm>,
) -> Response {
    let result = match event_draft(form) {
        Ok(draft) => state.calendar.update(id, draft).await,
        Err(err) => Err(err),
    };
    match checked(&state, result).await {
        Ok(()) => {
            state.notify(NoticeKind::Success, "Activity updated").await;
            Redirect::to("/calendar").into_response()
        }
        Err(err) => failure(&state, err, "/calendar").await,
    }
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    match checked(&state, state.calendar.delete(id, confirmation(&form)).await).await {
        Ok(true) => {
            state.notify(NoticeKind::Success, "Activity deleted").await;
            Redirect::to("/calendar").into_response()
        }
        Ok(false) => Redirect::to("/calendar").into_response(),
        Err(err) => failure(&state, err, "/calendar").await,
    }
}

pub async fn api_members(
    State(state): State<AppState>,
    Query(params): Query<MembersQuery>,
) -> Result<Json<PageView>, AppError> {
    checked(&state, state.directory.ensure_loaded().await).await?;
    let mut query = query_state(&params);
    Ok(Json(state.directory.page(&mut query).await))
}

pub async fn api_stats(State(state): State<AppState>) -> Result<Json<DirectoryStats>, AppError> {
    Ok(Json(local_stats(&state).await?))
}

async fn local_stats(state: &AppState) -> ApiResult<DirectoryStats> {
    checked(state, state.directory.ensure_loaded().await).await?;
    let members = state.directory.members().await;
    Ok(build_stats(&members))
}

/// Looks a member up in the cache, loading the collection first when this
/// is the first page visited since sign-in.
async fn cached_member(state: &AppState, id: u64) -> ApiResult<Option<Member>> {
    checked(state, state.directory.ensure_loaded().await).await?;
    Ok(state.directory.get(MemberId(id)).await)
}

fn query_state(params: &MembersQuery) -> QueryState {
    let mut query = QueryState::default();
    query.set_term(params.q.as_deref().unwrap_or_default().trim());
    query.page = params
        .page
        .as_deref()
        .and_then(|page| page.parse::<usize>().ok())
        .unwrap_or(1);
    query
}

fn confirmation(form: &ConfirmForm) -> Confirmation {
    if form.confirmed() {
        Confirmation::Confirmed
    } else {
        Confirmation::Declined
    }
}

fn event_draft(form: EventForm) -> ApiResult<EventDraft> {
    let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::ValidationFailed(FieldErrors::single("date", "must be a valid date"))
    })?;
    Ok(EventDraft {
        title: form.title,
        description: form.description,
        date,
    })
}

fn signed_in_user(state: &AppState) -> Option<String> {
    if !state.session.is_signed_in() {
        return None;
    }
    Some(state.session.username().unwrap_or_else(|| "admin".to_string()))
}

/// Ends the session when the backend rejects it; every other outcome passes
/// through untouched.
async fn checked<T>(state: &AppState, result: ApiResult<T>) -> ApiResult<T> {
    if let Err(ApiError::Unauthorized) = &result {
        warn!("backend rejected the session, signing out");
        sign_out(state).await;
    }
    result
}

async fn sign_out(state: &AppState) {
    state.session.clear();
    state.directory.forget().await;
    save_session(state).await;
}

async fn save_session(state: &AppState) {
    if let Err(err) = persist_session(&state.config.session_path, &state.session).await {
        error!("failed to persist session: {err}");
    }
}

async fn failure(state: &AppState, err: ApiError, back: &str) -> Response {
    if matches!(err, ApiError::Unauthorized) {
        return Redirect::to("/login").into_response();
    }
    state.notify(NoticeKind::Error, err.user_message()).await;
    Redirect::to(back).into_response()
}

fn form_failure(
    user: &str,
    err: ApiError,
    heading: &str,
    action: &str,
    form: &MemberForm,
) -> Response {
    if matches!(err, ApiError::Unauthorized) {
        return Redirect::to("/login").into_response();
    }
    let notice = Notice {
        kind: NoticeKind::Error,
        message: err.user_message(),
    };
    let html = ui::render_member_form(user, Some(&notice), heading, action, form, err.field_errors());
    Html(html).into_response()
}

async fn not_found(state: &AppState) -> Response {
    state.notify(NoticeKind::Error, "That member is no longer in the list").await;
    Redirect::to("/members").into_response()
}
