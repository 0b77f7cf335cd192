use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{EntryIdResponse, EntryIdsResponse, JournalQuery, JournalView, NewEntryRequest};
use super::repo;
use super::repo_types::{JournalEntry, NewEntry};
use super::services::{draft_totals, journal_day, log_meal, MealDraft};
use crate::{error::ApiError, nutrition::Nutrition, state::AppState};

pub fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/totals", post(meal_totals))
        .route("/users/:user/journal", get(list_journal).post(log_meal_draft))
        .route("/users/:user/journal/entries", post(add_entry))
        .route("/journal", get(list_all))
        .route("/journal/:entry_id", delete(delete_entry))
}

/// Running totals for a meal being assembled. Nothing is stored.
#[instrument(skip(draft))]
pub async fn meal_totals(Json(draft): Json<MealDraft>) -> Json<Nutrition> {
    Json(draft_totals(&draft))
}

#[instrument(skip(state, draft))]
pub async fn log_meal_draft(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(draft): Json<MealDraft>,
) -> Result<(StatusCode, Json<EntryIdsResponse>), ApiError> {
    if draft.dishes.is_empty() {
        return Err(ApiError::BadRequest("select at least one dish".into()));
    }
    let entry_ids = log_meal(&state.db, user_id, &draft).await?;
    Ok((StatusCode::CREATED, Json(EntryIdsResponse { entry_ids })))
}

#[instrument(skip(state, payload))]
pub async fn add_entry(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<NewEntryRequest>,
) -> Result<(StatusCode, Json<EntryIdResponse>), ApiError> {
    let entry = NewEntry {
        user_id,
        date: payload.date,
        meal_type: payload.meal_type,
        food_item: payload.food_item,
        dining_hall: payload.dining_hall,
        notes: payload.notes,
        nutrition: payload.nutrition,
    };
    let entry_id = repo::add_entry(&state.db, &entry).await?;
    info!(user_id, %entry_id, "journal entry added");
    Ok((StatusCode::CREATED, Json(EntryIdResponse { entry_id })))
}

#[instrument(skip(state))]
pub async fn list_journal(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<JournalQuery>,
) -> Result<Json<JournalView>, ApiError> {
    let view = match query.date {
        Some(date) => JournalView::Day(journal_day(&state.db, user_id, date).await?),
        None => JournalView::All(repo::list_entries(&state.db, user_id, None).await?),
    };
    Ok(Json(view))
}

/// Every user's entries, newest day first.
#[instrument(skip(state))]
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<JournalEntry>>, ApiError> {
    Ok(Json(repo::list_all_entries(&state.db).await?))
}

/// Idempotent: deleting an unknown id still answers 204.
#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if repo::delete_entry(&state.db, entry_id).await? {
        info!(%entry_id, "journal entry deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
