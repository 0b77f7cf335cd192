use serde::{Deserialize, Serialize};

/// Request body for the email lookup that creates a user on first sight.
#[derive(Debug, Deserialize)]
pub struct GetOrCreateUserRequest {
    pub email: String,
    pub username: Option<String>,
}

/// Request body for first-visit onboarding.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    #[serde(default)]
    pub dining_hall: String,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DiningHallRequest {
    pub dining_hall: String,
}

#[derive(Debug, Serialize)]
pub struct DiningHallResponse {
    pub dining_hall: String,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub dish: String,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<String>,
}
