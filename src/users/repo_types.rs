use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::error::ListDecodeError;

pub const DEFAULT_USERNAME: &str = "WellesleyUser";

/// `users` row as stored; list columns are still JSON text.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub email: String,
    pub username: Option<String>,
    pub dining_hall: Option<String>,
    pub allergens: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub favorites: Option<String>,
}

/// User profile with preference lists decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub dining_hall: String,
    pub allergens: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub favorites: Vec<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        let allergens = decode_list_or_empty(r.allergens.as_deref(), "allergens", &r.email);
        let dietary_restrictions = decode_list_or_empty(
            r.dietary_restrictions.as_deref(),
            "dietaryRestrictions",
            &r.email,
        );
        let favorites = decode_list_or_empty(r.favorites.as_deref(), "favorites", &r.email);
        Self {
            user_id: r.user_id,
            username: r.username.unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            dining_hall: r.dining_hall.unwrap_or_default(),
            email: r.email,
            allergens,
            dietary_restrictions,
            favorites,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllergyPreferences {
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
}

/// Decode a serialized list column. `NULL` and blank text are an empty list.
/// JSON arrays of strings are canonical; Python list literals such as
/// `['Peanuts', "Soy"]` written by older clients are read as well.
pub fn decode_list(raw: Option<&str>) -> Result<Vec<String>, ListDecodeError> {
    let text = match raw.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(text) => text,
    };
    serde_json::from_str::<Vec<String>>(text).or_else(|e| {
        parse_python_list(text).ok_or_else(|| ListDecodeError(e.to_string()))
    })
}

/// `[ 'a', "b", ]` with backslash escapes inside quotes. `None` for anything else.
fn parse_python_list(text: &str) -> Option<Vec<String>> {
    let mut chars = text.strip_prefix('[')?.strip_suffix(']')?.chars().peekable();
    let mut items = Vec::new();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let quote = match chars.next() {
            None => return Some(items),
            Some(q @ ('\'' | '"')) => q,
            Some(_) => return None,
        };
        let mut item = String::new();
        loop {
            match chars.next()? {
                '\\' => item.push(chars.next()?),
                c if c == quote => break,
                c => item.push(c),
            }
        }
        items.push(item);
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Some(items),
            Some(',') => {}
            Some(_) => return None,
        }
    }
}

pub fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_list_or_empty(raw: Option<&str>, column: &str, email: &str) -> Vec<String> {
    decode_list(raw).unwrap_or_else(|e| {
        warn!(error = %e, column, email, "unreadable preference list, using empty list");
        Vec::new()
    })
}
