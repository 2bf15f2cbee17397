use crate::api::ApiError;
use crate::bookmarks::{bookmarked_words, safe_return_path, toggle_action, ToggleAction};
use crate::errors::{AppError, PageError};
use crate::filters::{distinct, search, FilterQuery};
use crate::models::{
    ChatExchange, ChatQuery, ConclusionRequest, FilterSet, InsightSummary, NewBookmark,
    PageContext, User,
};
use crate::pagination::paginate;
use crate::session::{
    expired_session_cookie, session_cookie, session_id_from_headers, SessionStore,
    CHAT_HISTORY_KEY,
};
use crate::state::AppState;
use crate::stats::{
    cities_from_rows, city_breakdown, sentiment_breakdown, summary_breakdown, top_series,
};
use crate::ui::{
    render_chat, render_dashboard, render_login, render_my_insights, render_settings,
    render_smart_analytics, render_top_insights, DashboardView, Drilldown, FilterOptions,
    MyInsightsView, SmartAnalyticsView, TopInsightsView,
};
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::HashMap, future::Future};
use tracing::{error, info, warn};

const SMART_ANALYTICS_PAGE: &str = "smart-analytics";
const CHART_LIMIT: usize = 10;
const CHAT_HISTORY_LIMIT: usize = 20;

/// The signed-in browser behind a request.
pub struct Viewer {
    pub session_id: String,
    pub token: String,
    pub user: Option<User>,
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Viewer, PageError> {
    let session_id = session_id_from_headers(headers).ok_or(PageError::SignIn)?;
    let token = state
        .sessions
        .token(&session_id)
        .await
        .ok_or(PageError::SignIn)?;
    let user = state.sessions.user(&session_id).await;
    Ok(Viewer {
        session_id,
        token,
        user,
    })
}

/// A 401 ends the session and sends the browser to the login form; any other
/// failure renders the error page.
async fn reject(state: &AppState, viewer: &Viewer, err: ApiError) -> PageError {
    match err {
        ApiError::Unauthorized => {
            warn!("API rejected the session token, signing the browser out");
            end_session(state, &viewer.session_id).await;
            PageError::SignIn
        }
        other => {
            error!("API request failed: {other}");
            PageError::App(other.into())
        }
    }
}

async fn end_session(state: &AppState, session_id: &str) {
    if let Err(err) = state.sessions.clear(session_id).await {
        error!("failed to clear session: {}", err.message);
    }
    state.forget_session(session_id).await;
}

/// Cached read scoped to the viewer's session.
async fn load<T, F, Fut>(
    state: &AppState,
    viewer: &Viewer,
    parts: &[&str],
    fetch: F,
) -> Result<T, PageError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let key = AppState::cache_key(&viewer.session_id, parts);
    match state.cache.get_or_fetch(&key, fetch).await {
        Ok(value) => Ok(value),
        Err(err) => Err(reject(state, viewer, err).await),
    }
}

/// Uncached call, for writes and reads that must be current.
async fn call<T>(
    state: &AppState,
    viewer: &Viewer,
    request: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, PageError> {
    match request.await {
        Ok(value) => Ok(value),
        Err(err) => Err(reject(state, viewer, err).await),
    }
}

fn return_path(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|value| value.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub search: Option<String>,
    pub word: Option<String>,
}

pub async fn index() -> Redirect {
    Redirect::to("/survey-dashboard")
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session_id) = session_id_from_headers(&headers) {
        if let Some(token) = state.sessions.token(&session_id).await {
            match state.api.verify_session(&token).await {
                Ok(_) => return Redirect::to("/survey-dashboard").into_response(),
                Err(ApiError::Unauthorized) => end_session(&state, &session_id).await,
                Err(err) => warn!("could not verify stored session: {err}"),
            }
        }
    }
    Html(render_login(None, "")).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        let html = render_login(Some("Username and password are required."), username);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response());
    }

    match state.api.login(username, &form.password).await {
        Ok(login) => {
            if let Some(previous) = session_id_from_headers(&headers) {
                end_session(&state, &previous).await;
            }
            let session_id = SessionStore::new_session_id();
            state.sessions.sign_in(&session_id, &login).await?;
            info!("user {} signed in", login.user.username);
            Ok((
                [(SET_COOKIE, session_cookie(&session_id))],
                Redirect::to("/survey-dashboard"),
            )
                .into_response())
        }
        Err(err) => {
            warn!("login failed for {username}: {err}");
            let (status, message) = match err {
                ApiError::Unauthorized | ApiError::Rejected(_) => {
                    (StatusCode::UNAUTHORIZED, "Invalid username or password.")
                }
                other => {
                    let message = other.user_message();
                    (AppError::from(other).status, message)
                }
            };
            Ok((status, Html(render_login(Some(message), username))).into_response())
        }
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session_id) = session_id_from_headers(&headers) {
        if let Some(token) = state.sessions.token(&session_id).await {
            if let Err(err) = state.api.logout(&token).await {
                warn!("API logout failed: {err}");
            }
        }
        end_session(&state, &session_id).await;
    }
    (
        [(SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

pub async fn survey_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let token = viewer.token.as_str();

    let (stats, summaries, cities, bookmarks) = tokio::try_join!(
        load(&state, &viewer, &["insights", "dashboard"], || state
            .api
            .dashboard_stats(token)),
        load(&state, &viewer, &["insights", "summary"], || state
            .api
            .insights_summary(token)),
        load(&state, &viewer, &["kota-summary"], || state.api.kota_summary(token)),
        load(&state, &viewer, &["bookmarks"], || state.api.bookmarks(token)),
    )?;

    let overall = summary_breakdown(&summaries);
    let series = top_series(&summaries, CHART_LIMIT);
    let cities = city_breakdown(&cities);
    let bookmarked = bookmarked_words(&bookmarks);
    let return_to = return_path(&uri);

    let view = DashboardView {
        user: viewer.user.as_ref(),
        stats: &stats,
        overall: &overall,
        series: &series,
        cities: &cities,
        insights: paginate(&summaries, query.page.unwrap_or(1), state.config.page_size),
        bookmarked: &bookmarked,
        return_to: &return_to,
    };
    Ok(Html(render_dashboard(&view)))
}

pub async fn top_insights(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let token = viewer.token.as_str();

    let (positives, negatives, summaries, bookmarks) = tokio::try_join!(
        load(&state, &viewer, &["insights", "top-positive"], || state
            .api
            .top_positive(token)),
        load(&state, &viewer, &["insights", "top-negative"], || state
            .api
            .top_negative(token)),
        load(&state, &viewer, &["insights", "summary"], || state
            .api
            .insights_summary(token)),
        load(&state, &viewer, &["bookmarks"], || state.api.bookmarks(token)),
    )?;

    let word = query
        .word
        .as_deref()
        .map(str::trim)
        .filter(|word| !word.is_empty());
    let detail = match word {
        Some(word) => {
            let summary_key = ["insights", "word", word];
            let feedback_key = ["employee-insights", word];
            let (matches, feedback) = tokio::try_join!(
                load(&state, &viewer, &summary_key, || state
                    .api
                    .insights_by_word(token, word)),
                load(&state, &viewer, &feedback_key, || state
                    .api
                    .employee_insights_for_word(token, word)),
            )?;
            Some((word, matches, feedback))
        }
        None => None,
    };

    let term = query.search.unwrap_or_default();
    let results = search(&summaries, &term);
    let bookmarked = bookmarked_words(&bookmarks);
    let return_to = return_path(&uri);

    let view = TopInsightsView {
        user: viewer.user.as_ref(),
        positives: &positives,
        negatives: &negatives,
        results: paginate(&results, query.page.unwrap_or(1), state.config.page_size),
        search: &term,
        drilldown: detail.as_ref().map(|(word, summaries, feedback)| Drilldown {
            word: *word,
            summaries: summaries.as_slice(),
            feedback: feedback.as_slice(),
        }),
        bookmarked: &bookmarked,
        return_to: &return_to,
    };
    Ok(Html(render_top_insights(&view)))
}

fn page_context(viewer: &Viewer, filters: &FilterSet, conclusion: Option<String>) -> PageContext {
    PageContext {
        page: SMART_ANALYTICS_PAGE.to_string(),
        session_id: viewer.session_id.clone(),
        filters: filters.clone(),
        ai_conclusion: conclusion,
        updated_at: Some(Utc::now().to_rfc3339()),
    }
}

pub async fn smart_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FilterQuery>,
) -> Result<Html<String>, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let token = viewer.token.as_str();

    let (rows, stored) = tokio::try_join!(
        load(&state, &viewer, &["employee-insights"], || state
            .api
            .employee_insights(token)),
        call(
            &state,
            &viewer,
            state
                .api
                .page_context(token, SMART_ANALYTICS_PAGE, &viewer.session_id)
        ),
    )?;

    // A bare visit restores the filters this browser last used.
    let filters = match (&stored, query.is_absent()) {
        (Some(context), true) => context.filters.clone(),
        _ => query.to_filters(),
    };
    let unchanged = stored
        .as_ref()
        .is_some_and(|context| context.filters == filters);

    let mut conclusion = None;
    if unchanged {
        conclusion = stored.and_then(|context| context.ai_conclusion);
        if conclusion.is_none() {
            conclusion = call(
                &state,
                &viewer,
                state
                    .api
                    .ai_conclusion(token, SMART_ANALYTICS_PAGE, &viewer.session_id),
            )
            .await?
            .map(|cached| cached.conclusion);
        }
    } else {
        let record = page_context(&viewer, &filters, None);
        match state.api.save_page_context(token, &record).await {
            Ok(_) => {}
            Err(ApiError::Unauthorized) => {
                return Err(reject(&state, &viewer, ApiError::Unauthorized).await);
            }
            Err(err) => warn!("could not store page context: {err}"),
        }
    }

    let filtered = filters.apply(&rows);
    let breakdown = sentiment_breakdown(filtered.iter().copied());
    let cities = cities_from_rows(filtered.iter().copied());
    let options = FilterOptions {
        kotas: distinct(&rows, |row| Some(row.kota.as_str())),
        witels: distinct(&rows, |row| row.witel.as_deref()),
        sources: distinct(&rows, |row| Some(row.source.as_str())),
    };

    let view = SmartAnalyticsView {
        user: viewer.user.as_ref(),
        filters: &filters,
        options: &options,
        breakdown: &breakdown,
        cities: &cities,
        rows: paginate(&filtered, query.page.unwrap_or(1), state.config.page_size),
        conclusion: conclusion.as_deref(),
    };
    Ok(Html(render_smart_analytics(&view)))
}

pub async fn generate_conclusion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(query): Form<FilterQuery>,
) -> Result<Redirect, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let token = viewer.token.as_str();
    let filters = query.to_filters();

    let request = ConclusionRequest {
        session_id: viewer.session_id.clone(),
        filters: filters.clone(),
    };
    let generated = call(
        &state,
        &viewer,
        state
            .api
            .generate_ai_conclusion(token, SMART_ANALYTICS_PAGE, &request),
    )
    .await?;
    info!("generated AI conclusion for {SMART_ANALYTICS_PAGE}");

    let record = page_context(&viewer, &filters, Some(generated.conclusion));
    call(&state, &viewer, state.api.save_page_context(token, &record)).await?;

    let query = filters.to_query_string();
    if query.is_empty() {
        Ok(Redirect::to("/smart-analytics?search="))
    } else {
        Ok(Redirect::to(&format!("/smart-analytics?{query}")))
    }
}

pub async fn my_insights(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let token = viewer.token.as_str();

    let (bookmarks, summaries) = tokio::try_join!(
        load(&state, &viewer, &["bookmarks"], || state.api.bookmarks(token)),
        load(&state, &viewer, &["insights", "summary"], || state
            .api
            .insights_summary(token)),
    )?;

    let term = query.search.unwrap_or_default();
    let matches = search(&bookmarks, &term);
    let lookup: HashMap<String, InsightSummary> = summaries
        .into_iter()
        .map(|summary| (summary.word_insight.trim().to_lowercase(), summary))
        .collect();
    let return_to = return_path(&uri);

    let view = MyInsightsView {
        user: viewer.user.as_ref(),
        bookmarks: paginate(&matches, query.page.unwrap_or(1), state.config.page_size),
        search: &term,
        summaries: &lookup,
        return_to: &return_to,
    };
    Ok(Html(render_my_insights(&view)))
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub word_insight: String,
    pub return_to: Option<String>,
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let token = viewer.token.as_str();
    let word = form.word_insight.trim();
    if word.is_empty() {
        return Err(AppError::bad_request("word_insight is required").into());
    }

    let current = call(&state, &viewer, state.api.bookmarks(token)).await?;
    match toggle_action(&current, word) {
        ToggleAction::Add => {
            let bookmark = NewBookmark {
                word_insight: word.to_string(),
                note: None,
            };
            call(&state, &viewer, state.api.add_bookmark(token, &bookmark)).await?;
            info!("bookmarked {word}");
        }
        ToggleAction::Remove(id) => {
            call(&state, &viewer, state.api.remove_bookmark(token, id)).await?;
            info!("removed bookmark {id} ({word})");
        }
    }
    state
        .cache
        .invalidate_prefix(&AppState::cache_key(&viewer.session_id, &["bookmarks"]))
        .await;

    Ok(Redirect::to(&safe_return_path(
        form.return_to.as_deref(),
        "/my-insights",
    )))
}

pub async fn settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let token = viewer.token.as_str();
    let user = load(&state, &viewer, &["auth", "me"], || state.api.current_user(token)).await?;
    Ok(Html(render_settings(Some(&user), &state.config)))
}

fn parse_history(raw: Option<&str>) -> Vec<ChatExchange> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|err| {
        warn!("discarding unreadable chat history: {err}");
        Vec::new()
    })
}

/// Stored history with `exchange` appended, keeping the newest exchanges.
fn append_exchange(raw: Option<&str>, exchange: ChatExchange) -> Result<String, AppError> {
    let mut history = parse_history(raw);
    history.push(exchange);
    if history.len() > CHAT_HISTORY_LIMIT {
        let excess = history.len() - CHAT_HISTORY_LIMIT;
        history.drain(..excess);
    }
    serde_json::to_string(&history).map_err(AppError::internal)
}

async fn chat_history(state: &AppState, session_id: &str) -> Vec<ChatExchange> {
    let raw = state.sessions.get(session_id, CHAT_HISTORY_KEY).await;
    parse_history(raw.as_deref())
}

pub async fn chat_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let history = chat_history(&state, &viewer.session_id).await;
    Ok(Html(render_chat(viewer.user.as_ref(), &history, None)))
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub query: String,
}

pub async fn chat_send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Result<Response, PageError> {
    let viewer = require_session(&state, &headers).await?;
    let question = form.query.trim();
    if question.is_empty() {
        return Ok(Redirect::to("/chat").into_response());
    }

    let query = ChatQuery {
        query: question.to_string(),
        session_id: Some(viewer.session_id.clone()),
    };
    match state.api.chat(&viewer.token, &query).await {
        Ok(reply) => {
            let exchange = ChatExchange {
                question: question.to_string(),
                answer: reply.answer,
                sources: reply.sources,
            };
            state
                .sessions
                .update(&viewer.session_id, CHAT_HISTORY_KEY, |raw| {
                    append_exchange(raw, exchange)
                })
                .await?;
            Ok(Redirect::to("/chat").into_response())
        }
        Err(ApiError::Unauthorized) => Err(reject(&state, &viewer, ApiError::Unauthorized).await),
        Err(err) => {
            warn!("chat query failed: {err}");
            let history = chat_history(&state, &viewer.session_id).await;
            let html = render_chat(viewer.user.as_ref(), &history, Some(err.user_message()));
            Ok((AppError::from(err).status, Html(html)).into_response())
        }
    }
}

pub async fn chat_clear(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Redirect, PageError> {
    let viewer = require_session(&state, &headers).await?;
    state
        .sessions
        .set(&viewer.session_id, CHAT_HISTORY_KEY, "[]".to_string())
        .await?;
    Ok(Redirect::to("/chat"))
}
