//! Simple REST API server example for the cash book.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /entries` - Post an entry to the committed ledger
//! - `GET /entries` - List posted entries
//! - `GET /entries/last` - Id of the newest posted entry
//! - `PATCH /entries/{id}` - Amend a posted entry's description
//! - `DELETE /entries/last` - Delete the newest posted entry
//! - `POST /entries/last/reverse` - Move the newest posted entry to pending
//! - `GET /balance` - Book totals
//! - `POST /pending` / `GET /pending` - Stage and list pending entries
//! - `GET /pending/last` - Id of the newest pending entry
//! - `PUT /pending/{id}` / `DELETE /pending/{id}` - Rework or drop a pending entry
//! - `POST /actors` / `GET /actors` - Seed and list the actor directory
//!
//! ## Example Usage
//!
//! ```bash
//! # Register an actor first; entries must reference one
//! curl -X POST http://localhost:3000/actors \
//!   -H "Content-Type: application/json" \
//!   -d '{"kind": "contractee", "name": "Quarry Ltd"}'
//!
//! # Money in
//! curl -X POST http://localhost:3000/entries \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "input", "amount": "100.00", "description": "haul 17, gravel", "actor": 1}'
//!
//! # Money out
//! curl -X POST http://localhost:3000/entries \
//!   -H "Content-Type: application/json" \
//!   -d '{"type": "output", "amount": "30.00", "description": "diesel", "actor": 1}'
//!
//! # Running balance
//! curl http://localhost:3000/balance
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use cashbook::{
    Actor, ActorId, ActorKind, ActorProfile, ActorRegistry, BookTotals, Cashbook, EntryDraft,
    EntryId, EntryKind, LedgerError, PendingEntry, PostedEntry, RegistryError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

// === Request/Response DTOs ===

/// Request body for posting or staging an entry.
///
/// The kind arrives as a string so bad values surface as the ledger's
/// own invalid-kind error rather than a decode failure:
/// ```json
/// {"type": "input", "amount": "100.00", "description": "haul 17", "actor": 1}
/// ```
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    #[serde(rename = "type")]
    kind: String,
    amount: Decimal,
    description: String,
    actor: i64,
}

impl EntryRequest {
    fn into_draft(self) -> Result<EntryDraft, LedgerError> {
        let kind: EntryKind = self.kind.parse()?;
        Ok(EntryDraft::new(kind, self.amount, self.description, ActorId(self.actor)))
    }
}

/// Request body for amending a posted entry's description.
#[derive(Debug, Deserialize)]
pub struct AmendRequest {
    description: String,
}

/// Request body for registering an actor.
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    kind: String,
    name: String,
    #[serde(default)]
    national_id: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Response body for deletions.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: EntryId,
}

/// Response body for last-id lookups; `null` when the table is empty.
#[derive(Debug, Serialize)]
pub struct LastIdResponse {
    pub last_id: Option<EntryId>,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state: the book and the actor directory.
#[derive(Clone)]
pub struct AppState {
    pub book: Arc<Cashbook>,
    pub actors: Arc<ActorRegistry>,
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::InvalidKind => (StatusCode::BAD_REQUEST, "INVALID_KIND"),
            LedgerError::InvalidAmount => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            LedgerError::MissingDescription => (StatusCode::BAD_REQUEST, "MISSING_DESCRIPTION"),
            LedgerError::MissingActor => (StatusCode::BAD_REQUEST, "MISSING_ACTOR"),
            LedgerError::ActorNotFound => (StatusCode::NOT_FOUND, "ACTOR_NOT_FOUND"),
            LedgerError::InsufficientBalance => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_BALANCE")
            }
            LedgerError::ProtectedEntry => (StatusCode::FORBIDDEN, "PROTECTED_ENTRY"),
            LedgerError::InvalidId => (StatusCode::BAD_REQUEST, "INVALID_ID"),
            LedgerError::EntryNotFound => (StatusCode::NOT_FOUND, "ENTRY_NOT_FOUND"),
            LedgerError::EmptyLedger => (StatusCode::CONFLICT, "EMPTY_LEDGER"),
            LedgerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAULT"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

fn registry_error_response(error: RegistryError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match error {
        RegistryError::EmptyName => (StatusCode::BAD_REQUEST, "EMPTY_NAME"),
        RegistryError::DuplicateName => (StatusCode::CONFLICT, "DUPLICATE_NAME"),
        RegistryError::DuplicateId => (StatusCode::CONFLICT, "DUPLICATE_ID"),
        RegistryError::InvalidId => (StatusCode::BAD_REQUEST, "INVALID_ACTOR_ID"),
        RegistryError::UnknownKind => (StatusCode::BAD_REQUEST, "UNKNOWN_ACTOR_KIND"),
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

// === Handlers ===

/// POST /entries - Post an entry to the committed ledger.
async fn create_entry(
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<PostedEntry>), AppError> {
    let draft = request.into_draft()?;
    let entry = state.book.post(draft)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /entries - List posted entries.
async fn list_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostedEntry>>, AppError> {
    Ok(Json(state.book.posted()?))
}

/// GET /entries/last - Id of the newest posted entry.
async fn last_entry_id(State(state): State<AppState>) -> Result<Json<LastIdResponse>, AppError> {
    Ok(Json(LastIdResponse { last_id: state.book.last_posted_id()? }))
}

/// PATCH /entries/{id} - Amend a posted entry's description.
async fn amend_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AmendRequest>,
) -> Result<Json<PostedEntry>, AppError> {
    let entry = state.book.amend_description(EntryId(id), &request.description)?;
    Ok(Json(entry))
}

/// DELETE /entries/last - Delete the newest posted entry.
async fn delete_last_entry(
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, AppError> {
    let id = state.book.delete_last()?;
    Ok(Json(DeletedResponse { id }))
}

/// POST /entries/last/reverse - Move the newest posted entry to pending.
async fn reverse_last_entry(
    State(state): State<AppState>,
) -> Result<Json<PendingEntry>, AppError> {
    Ok(Json(state.book.reverse_last()?))
}

/// GET /balance - Book totals.
async fn balance(State(state): State<AppState>) -> Result<Json<BookTotals>, AppError> {
    Ok(Json(state.book.totals()?))
}

/// POST /pending - Stage a pending entry.
async fn create_pending(
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<PendingEntry>), AppError> {
    let draft = request.into_draft()?;
    let entry = state.book.stage(draft)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /pending - List pending entries.
async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingEntry>>, AppError> {
    Ok(Json(state.book.pending()?))
}

/// GET /pending/last - Id of the newest pending entry.
async fn last_pending_id(
    State(state): State<AppState>,
) -> Result<Json<LastIdResponse>, AppError> {
    Ok(Json(LastIdResponse { last_id: state.book.last_pending_id()? }))
}

/// PUT /pending/{id} - Replace a pending entry's fields.
async fn update_pending(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<PendingEntry>, AppError> {
    let draft = request.into_draft()?;
    let entry = state.book.update_pending(EntryId(id), draft)?;
    Ok(Json(entry))
}

/// DELETE /pending/{id} - Drop a pending entry.
async fn delete_pending(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeletedResponse>, AppError> {
    let id = state.book.delete_pending(EntryId(id))?;
    Ok(Json(DeletedResponse { id }))
}

/// POST /actors - Register an actor.
async fn create_actor(
    State(state): State<AppState>,
    Json(request): Json<ActorRequest>,
) -> Result<(StatusCode, Json<Actor>), (StatusCode, Json<ErrorResponse>)> {
    let kind: ActorKind = request.kind.parse().map_err(registry_error_response)?;
    let profile = ActorProfile {
        kind,
        name: request.name,
        national_id: request.national_id,
        address: request.address,
        notes: request.notes,
    };
    let actor = state.actors.register(profile).map_err(registry_error_response)?;
    Ok((StatusCode::CREATED, Json(actor)))
}

/// GET /actors - List actors.
async fn list_actors(State(state): State<AppState>) -> Json<Vec<Actor>> {
    Json(state.actors.actors())
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/entries", post(create_entry).get(list_entries))
        .route("/entries/last", get(last_entry_id).delete(delete_last_entry))
        .route("/entries/last/reverse", post(reverse_last_entry))
        .route("/entries/{id}", patch(amend_entry))
        .route("/balance", get(balance))
        .route("/pending", post(create_pending).get(list_pending))
        .route("/pending/last", get(last_pending_id))
        .route("/pending/{id}", put(update_pending).delete(delete_pending))
        .route("/actors", post(create_actor).get(list_actors))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let actors = Arc::new(ActorRegistry::new());
    let state = AppState {
        book: Arc::new(Cashbook::in_memory(actors.clone())),
        actors,
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Cashbook API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST   /entries              - Post an entry");
    println!("  GET    /entries              - List posted entries");
    println!("  GET    /entries/last         - Newest posted id");
    println!("  PATCH  /entries/{{id}}         - Amend a description");
    println!("  DELETE /entries/last         - Delete the newest entry");
    println!("  POST   /entries/last/reverse - Reverse the newest entry");
    println!("  GET    /balance              - Book totals");
    println!("  POST   /pending              - Stage a pending entry");
    println!("  GET    /pending              - List pending entries");
    println!("  PUT    /pending/{{id}}         - Rework a pending entry");
    println!("  DELETE /pending/{{id}}         - Drop a pending entry");
    println!("  POST   /actors               - Register an actor");
    println!("  GET    /actors               - List actors");

    axum::serve(listener, app).await.unwrap();
}
