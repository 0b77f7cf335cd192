use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            DiningHallRequest, DiningHallResponse, FavoriteRequest, FavoritesResponse, GetOrCreateUserRequest,
            RegisterUserRequest, UserIdResponse,
        },
        repo,
        repo_types::{AllergyPreferences, User},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(get_or_create_user))
        .route("/users/register", post(register_user))
        .route("/users/:user", get(get_user))
        .route(
            "/users/:user/dining-hall",
            get(get_dining_hall).put(update_dining_hall),
        )
        .route("/users/:user/favorites", get(get_favorites).post(add_favorite))
        .route("/users/:user/favorites/:dish", delete(remove_favorite))
        .route(
            "/users/:user/allergies",
            get(get_allergy_preferences).put(update_allergy_preferences),
        )
}

pub(crate) fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::BadRequest("email is required".into()));
    }
    Ok(email)
}

#[instrument(skip(state, payload))]
pub async fn get_or_create_user(
    State(state): State<AppState>,
    Json(payload): Json<GetOrCreateUserRequest>,
) -> Result<Json<UserIdResponse>, ApiError> {
    let email = normalize_email(&payload.email)?;
    let user_id = repo::get_or_create_user(&state.db, &email, payload.username.as_deref()).await?;
    Ok(Json(UserIdResponse { user_id }))
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<UserIdResponse>, ApiError> {
    let email = normalize_email(&payload.email)?;
    let prefs = AllergyPreferences {
        allergens: payload.allergens,
        restrictions: payload.restrictions,
    };
    let user_id = repo::register_user(&state.db, &email, &payload.dining_hall, &prefs).await?;
    info!(user_id, email = %email, "user registered");
    Ok(Json(UserIdResponse { user_id }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    let email = normalize_email(&email)?;
    repo::find_by_email(&state.db, &email)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no user registered for {email}")))
}

#[instrument(skip(state))]
pub async fn get_dining_hall(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<DiningHallResponse>, ApiError> {
    let email = normalize_email(&email)?;
    let dining_hall = repo::get_dining_hall(&state.db, &email).await?;
    Ok(Json(DiningHallResponse { dining_hall }))
}

#[instrument(skip(state, payload))]
pub async fn update_dining_hall(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<DiningHallRequest>,
) -> Result<StatusCode, ApiError> {
    let email = normalize_email(&email)?;
    repo::update_dining_hall(&state.db, &email, &payload.dining_hall).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_favorites(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let email = normalize_email(&email)?;
    let favorites = repo::get_favorites(&state.db, &email).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[instrument(skip(state, payload))]
pub async fn add_favorite(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let email = normalize_email(&email)?;
    let favorites = repo::add_favorite(&state.db, &email, &payload.dish).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Path((email, dish)): Path<(String, String)>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let email = normalize_email(&email)?;
    let favorites = repo::remove_favorite(&state.db, &email, &dish).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[instrument(skip(state))]
pub async fn get_allergy_preferences(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AllergyPreferences>, ApiError> {
    let email = normalize_email(&email)?;
    Ok(Json(repo::get_allergy_preferences(&state.db, &email).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_allergy_preferences(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<AllergyPreferences>,
) -> Result<StatusCode, ApiError> {
    let email = normalize_email(&email)?;
    repo::update_allergy_preferences(&state.db, &email, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
