use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::book::Book;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::pagination::ListQuery;
use crate::rate_limiter::RateLimiter;
use crate::response::{HealthResponse, RateLimitPolicy};
use crate::store::{BookStore, SharedStore};
use crate::validation::RequestValidator;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub books: SharedStore,
    pub rate_limiter: RateLimiter,
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let store = if config.seed_books {
            BookStore::seeded()
        } else {
            BookStore::new()
        };

        Self::with_store(store, RateLimiter::from_config(config), config.trust_proxy_headers)
    }

    pub fn with_store(store: BookStore, rate_limiter: RateLimiter, trust_proxy_headers: bool) -> Self {
        Self {
            books: store.into_shared(),
            rate_limiter,
            trust_proxy_headers,
        }
    }
}

/// `GET /api/books`
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Book>> {
    let store = state.books.read().await;
    let page: Vec<Book> = query.apply(store.list()).into_iter().cloned().collect();

    debug!(
        page = query.page(),
        limit = query.limit(),
        author = query.author.as_deref().unwrap_or(""),
        returned = page.len(),
        "Listed books"
    );

    Json(page)
}

/// `POST /api/books`
pub async fn create_book(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>)> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Rejected create body");
        ApiError::InvalidBookData
    })?;
    let fields = RequestValidator::validate_new_book(payload)?;

    let book = state.books.write().await.insert(fields);
    info!(book_id = book.id, "Created book");

    Ok((StatusCode::CREATED, Json(book)))
}

/// `PUT /api/books/:book_id`
pub async fn update_book(
    State(state): State<AppState>,
    book_id: std::result::Result<Path<String>, PathRejection>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Book>> {
    let book_id = book_id_from_path(book_id)?;

    let mut store = state.books.write().await;
    let book = store.find_by_id_mut(book_id).ok_or(ApiError::BookNotFound)?;

    let Json(payload) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Rejected update body");
        ApiError::InvalidBookData
    })?;
    let patch = RequestValidator::validate_book_update(payload)?;

    let changed = book.apply_update(&patch);
    info!(book_id, changed, "Updated book");

    Ok(Json(book.clone()))
}

/// `DELETE /api/books/:book_id`
pub async fn delete_book(
    State(state): State<AppState>,
    book_id: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Book>> {
    let book_id = book_id_from_path(book_id)?;

    let book = state
        .books
        .write()
        .await
        .remove(book_id)
        .ok_or(ApiError::BookNotFound)?;
    info!(book_id, "Deleted book");

    Ok(Json(book))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let books = state.books.read().await.len();
    let limiter = &state.rate_limiter;

    Json(HealthResponse::healthy(
        books,
        RateLimitPolicy {
            requests: limiter.limit(),
            window: limiter.window(),
            strategy: limiter.strategy(),
            tracked_clients: limiter.tracked_clients(),
        },
    ))
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// A segment that cannot even be decoded is an unknown route as well.
fn book_id_from_path(path: std::result::Result<Path<String>, PathRejection>) -> Result<u64> {
    let Path(raw) = path.map_err(|rejection| {
        debug!(error = %rejection, "Rejected book id segment");
        ApiError::RouteNotFound
    })?;
    parse_book_id(&raw)
}

/// Book ids are positive decimal integers; anything else is an unknown route.
fn parse_book_id(raw: &str) -> Result<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::RouteNotFound);
    }
    raw.parse().map_err(|_| ApiError::RouteNotFound)
}
