// FastMoney - REST API with Axum
// Public read endpoints for the landing and results pages, plus the
// token-gated admin endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::admin::{ContentEditor, Notice, ResultEditor, ResultForm};
use crate::auth::{AuthProvider, Session};
use crate::entities::{CategoryBox, CategoryField, HomepageContent, ResultDraft, WebResult};
use crate::error::StoreError;
use crate::listing::{ListingEngine, ListingState, ListingView, ResultsSnapshot};
use crate::repository::ContentRepository;

type SharedStore = Arc<Mutex<Box<dyn ContentRepository + Send>>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
    auth: AuthProvider,
    engine: ListingEngine,
}

impl AppState {
    pub fn new<R>(store: R, auth: AuthProvider, engine: ListingEngine) -> Self
    where
        R: ContentRepository + Send + 'static,
    {
        AppState {
            store: Arc::new(Mutex::new(Box::new(store))),
            auth,
            engine,
        }
    }

    /// Run `f` against the store. A poisoned lock is a store error, not a panic.
    fn with_store<T>(
        &self,
        f: impl FnOnce(&dyn ContentRepository) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let store = self
            .store
            .lock()
            .map_err(|_| StoreError::store("store lock poisoned"))?;
        f(&**store)
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        self.auth.require_session(bearer_token(headers))?;
        Ok(())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Failures turned into enveloped HTTP responses
pub enum ApiError {
    Store(StoreError),
    /// Request body axum could not read as the expected JSON
    Body { status: StatusCode, message: String },
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Store(err) => {
                let status = match &err {
                    StoreError::AuthRequired => StatusCode::UNAUTHORIZED,
                    StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                    StoreError::Network { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    StoreError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!(error = %err, "request failed");
                }
                (status, err.to_string())
            }
            ApiError::Body { status, message } => {
                warn!(%status, %message, "rejected request body");
                (status, message)
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };

        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// JSON body that has not been checked yet; `?` on it yields an `ApiError`.
type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    q: String,
    page: Option<String>,
}

impl ResultsQuery {
    /// Missing page means page 1; an unparseable one renders as an empty page.
    fn listing_state(&self) -> ListingState {
        let page = match &self.page {
            None => 1,
            Some(raw) => raw.trim().parse().unwrap_or(0),
        };
        ListingState::new(self.q.clone(), page)
    }
}

#[derive(Serialize)]
struct ResultsPage<'a> {
    #[serde(flatten)]
    view: ListingView<'a>,
    page_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    load_error: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct HomepageUpdate {
    heading: String,
    #[serde(default)]
    paragraph: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryUpdate {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryEdit {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
}

/// The whole admin content page saved in one go.
#[derive(Debug, Deserialize)]
pub struct ContentUpdate {
    heading: String,
    #[serde(default)]
    paragraph: String,
    #[serde(default)]
    categories: Vec<CategoryEdit>,
}

// ============================================================================
// Public Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/homepage - Heading and paragraph, or the built-in fallback
async fn get_homepage(State(state): State<AppState>) -> ApiResult<HomepageContent> {
    let content = state.with_store(|store| store.homepage())?;
    Ok(Json(ApiResponse::ok(
        content.unwrap_or_else(HomepageContent::fallback),
    )))
}

/// GET /api/categories - Category boxes in display order
async fn get_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryBox>> {
    let categories = state.with_store(|store| store.list_categories())?;
    Ok(Json(ApiResponse::ok(categories)))
}

/// GET /api/results?q=&page= - One rendered page of the results listing
async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Response {
    let snapshot = match state.with_store(|store| Ok(ResultsSnapshot::fetch(store))) {
        Ok(snapshot) => snapshot,
        Err(err) => return ApiError::Store(err).into_response(),
    };

    let listing_state = query.listing_state();
    let page = ResultsPage {
        view: state.engine.view(&snapshot.results, &listing_state),
        page_size: state.engine.page_size(),
        load_error: snapshot.load_error.as_deref(),
    };

    (StatusCode::OK, Json(ApiResponse::ok(page))).into_response()
}

/// POST /api/auth/login - Exchange admin credentials for a bearer token
async fn login(
    State(state): State<AppState>,
    body: JsonBody<LoginRequest>,
) -> ApiResult<Session> {
    let Json(request) = body?;
    let session = state.auth.sign_in(&request.email, &request.password)?;
    Ok(Json(ApiResponse::ok(session)))
}

/// POST /api/auth/logout - End the caller's session
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = bearer_token(&headers) {
        state.auth.sign_out(token);
    }
    Json(ApiResponse::ok("OK"))
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// PUT /api/homepage - Heading and paragraph only
async fn put_homepage(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: JsonBody<HomepageUpdate>,
) -> ApiResult<HomepageContent> {
    state.require_admin(&headers)?;
    let Json(update) = body?;

    let content = state.with_store(|store| {
        let mut editor = ContentEditor::load(store)?;
        editor.set_heading(update.heading);
        editor.set_paragraph(update.paragraph);
        editor.try_save(store)
    })?;

    Ok(Json(ApiResponse::ok(content)))
}

/// PUT /api/content - Homepage text plus category boxes. Writes stop at the
/// first failure; unknown category ids are rejected before anything is written.
async fn put_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: JsonBody<ContentUpdate>,
) -> ApiResult<Notice> {
    state.require_admin(&headers)?;
    let Json(update) = body?;

    state.with_store(|store| {
        let mut editor = ContentEditor::load(store)?;
        editor.set_heading(update.heading);
        editor.set_paragraph(update.paragraph);

        for edit in update.categories {
            let known = editor.update_category(&edit.id, CategoryField::Title, edit.title);
            if !known {
                return Err(StoreError::not_found("category", edit.id));
            }
            editor.update_category(&edit.id, CategoryField::Description, edit.description);
        }

        editor.try_save(store)
    })?;

    Ok(Json(ApiResponse::ok(Notice::saved())))
}

/// PUT /api/categories/:id
async fn put_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: JsonBody<CategoryUpdate>,
) -> ApiResult<&'static str> {
    state.require_admin(&headers)?;
    let Json(update) = body?;
    state.with_store(|store| store.update_category(&id, &update.title, &update.description))?;
    Ok(Json(ApiResponse::ok("OK")))
}

/// GET /api/admin/results - Every stored result, unfiltered
async fn get_admin_results(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<WebResult>> {
    state.require_admin(&headers)?;
    let results = state.with_store(|store| store.list_results())?;
    Ok(Json(ApiResponse::ok(results)))
}

/// POST /api/results
async fn create_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: JsonBody<ResultDraft>,
) -> Result<Response, ApiError> {
    state.require_admin(&headers)?;
    let Json(draft) = body?;

    let created = state.with_store(|store| {
        let mut editor = ResultEditor::default();
        editor.open_new();
        editor.form = ResultForm::from_draft(&draft);
        editor.try_submit(store)
    })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))).into_response())
}

/// PUT /api/results/:id
async fn update_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: JsonBody<ResultDraft>,
) -> ApiResult<WebResult> {
    state.require_admin(&headers)?;
    let Json(draft) = body?;

    let updated = state.with_store(|store| {
        let existing = store
            .list_results()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::not_found("web result", id.as_str()))?;

        let mut editor = ResultEditor::default();
        editor.edit(&existing);
        editor.form = ResultForm::from_draft(&draft);
        editor.try_submit(store)
    })?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /api/results/:id
async fn delete_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<&'static str> {
    state.require_admin(&headers)?;
    state.with_store(|store| ResultEditor::default().try_delete(store, &id))?;
    Ok(Json(ApiResponse::ok("OK")))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/homepage", get(get_homepage).put(put_homepage))
        .route("/content", put(put_content))
        .route("/categories", get(get_categories))
        .route("/categories/:id", put(put_category))
        .route("/results", get(get_results).post(create_result))
        .route("/results/:id", put(update_result).delete(delete_result))
        .route("/admin/results", get(get_admin_results))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
