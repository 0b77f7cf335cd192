use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::StorageError;
use crate::users::repo_types::{
    decode_list_or_empty, encode_list, AllergyPreferences, User, UserRow, DEFAULT_USERNAME,
};

/// Return the id for `email`, inserting the user on first sight. One statement,
/// so two callers racing on the same email still end up with one row.
pub async fn get_or_create_user(
    db: &SqlitePool,
    email: &str,
    username: Option<&str>,
) -> Result<i64, StorageError> {
    let (user_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, username)
        VALUES (?1, ?2)
        ON CONFLICT (email) DO UPDATE SET email = excluded.email
        RETURNING user_id
        "#,
    )
    .bind(email)
    .bind(username.unwrap_or(DEFAULT_USERNAME))
    .fetch_one(db)
    .await?;
    debug!(user_id, email, "resolved user");
    Ok(user_id)
}

/// Onboarding: create the user if needed and store the initial preferences.
pub async fn register_user(
    db: &SqlitePool,
    email: &str,
    dining_hall: &str,
    prefs: &AllergyPreferences,
) -> Result<i64, StorageError> {
    let (user_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, username, diningHall, allergens, dietaryRestrictions)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (email) DO UPDATE SET
            diningHall = excluded.diningHall,
            allergens = excluded.allergens,
            dietaryRestrictions = excluded.dietaryRestrictions
        RETURNING user_id
        "#,
    )
    .bind(email)
    .bind(DEFAULT_USERNAME)
    .bind(dining_hall)
    .bind(encode_list(&prefs.allergens))
    .bind(encode_list(&prefs.restrictions))
    .fetch_one(db)
    .await?;
    Ok(user_id)
}

pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, StorageError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT user_id, email, username, diningHall AS dining_hall, allergens,
               dietaryRestrictions AS dietary_restrictions, favorites
        FROM users
        WHERE email = ?1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(row.map(User::from))
}

/// Preferred dining hall, or an empty string when unknown.
pub async fn get_dining_hall(db: &SqlitePool, email: &str) -> Result<String, StorageError> {
    let hall: Option<Option<String>> =
        sqlx::query_scalar("SELECT diningHall FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(db)
            .await?;
    Ok(hall.flatten().unwrap_or_default())
}

pub async fn update_dining_hall(
    db: &SqlitePool,
    email: &str,
    hall: &str,
) -> Result<(), StorageError> {
    let result = sqlx::query("UPDATE users SET diningHall = ?1 WHERE email = ?2")
        .bind(hall)
        .bind(email)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::UnknownUser(email.to_string()));
    }
    Ok(())
}

pub async fn get_favorites(db: &SqlitePool, email: &str) -> Result<Vec<String>, StorageError> {
    let mut conn = db.acquire().await?;
    Ok(load_favorites(&mut conn, email).await?.unwrap_or_default())
}

/// Append `dish` unless it is already a favorite; returns the resulting list.
pub async fn add_favorite(
    db: &SqlitePool,
    email: &str,
    dish: &str,
) -> Result<Vec<String>, StorageError> {
    let mut tx = db.begin().await?;
    let mut favorites = lock_favorites(&mut tx, email)
        .await?
        .ok_or_else(|| StorageError::UnknownUser(email.to_string()))?;

    if !favorites.iter().any(|f| f == dish) {
        favorites.push(dish.to_string());
        store_favorites(&mut tx, email, &favorites).await?;
    }
    tx.commit().await?;
    Ok(favorites)
}

/// Drop `dish` from the favorites if present; returns the resulting list.
pub async fn remove_favorite(
    db: &SqlitePool,
    email: &str,
    dish: &str,
) -> Result<Vec<String>, StorageError> {
    let mut tx = db.begin().await?;
    let mut favorites = lock_favorites(&mut tx, email)
        .await?
        .ok_or_else(|| StorageError::UnknownUser(email.to_string()))?;

    if let Some(pos) = favorites.iter().position(|f| f == dish) {
        favorites.remove(pos);
        store_favorites(&mut tx, email, &favorites).await?;
    }
    tx.commit().await?;
    Ok(favorites)
}

pub async fn get_allergy_preferences(
    db: &SqlitePool,
    email: &str,
) -> Result<AllergyPreferences, StorageError> {
    let row: Option<(Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT allergens, dietaryRestrictions FROM users WHERE email = ?1",
    )
    .bind(email)
    .fetch_optional(db)
    .await?;

    let Some((allergens, restrictions)) = row else {
        return Ok(AllergyPreferences::default());
    };
    Ok(AllergyPreferences {
        allergens: decode_list_or_empty(allergens.as_deref(), "allergens", email),
        restrictions: decode_list_or_empty(restrictions.as_deref(), "dietaryRestrictions", email),
    })
}

pub async fn update_allergy_preferences(
    db: &SqlitePool,
    email: &str,
    prefs: &AllergyPreferences,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        "UPDATE users SET allergens = ?1, dietaryRestrictions = ?2 WHERE email = ?3",
    )
    .bind(encode_list(&prefs.allergens))
    .bind(encode_list(&prefs.restrictions))
    .bind(email)
    .execute(db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::UnknownUser(email.to_string()));
    }
    Ok(())
}

/// Read the favorites through a no-op write so the transaction holds the
/// write lock before it reads. `None` when the user does not exist.
async fn lock_favorites(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<Vec<String>>, StorageError> {
    let raw: Option<Option<String>> = sqlx::query_scalar(
        "UPDATE users SET favorites = favorites WHERE email = ?1 RETURNING favorites",
    )
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(raw.map(|r| decode_list_or_empty(r.as_deref(), "favorites", email)))
}

/// `None` when the user does not exist.
async fn load_favorites(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<Vec<String>>, StorageError> {
    let raw: Option<Option<String>> =
        sqlx::query_scalar("SELECT favorites FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(raw.map(|r| decode_list_or_empty(r.as_deref(), "favorites", email)))
}

async fn store_favorites(
    conn: &mut SqliteConnection,
    email: &str,
    favorites: &[String],
) -> Result<(), StorageError> {
    sqlx::query("UPDATE users SET favorites = ?1 WHERE email = ?2")
        .bind(encode_list(favorites))
        .bind(email)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{file_pool, memory_pool};

    const EMAIL: &str = "student@wellesley.edu";

    async fn user_count(db: &SqlitePool, email: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
            .bind(email)
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn get_or_create_returns_stable_id() {
        let db = memory_pool().await;
        let first = get_or_create_user(&db, EMAIL, None).await.unwrap();
        let second = get_or_create_user(&db, EMAIL, Some("Someone Else")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(user_count(&db, EMAIL).await, 1);

        let user = find_by_email(&db, EMAIL).await.unwrap().unwrap();
        assert_eq!(user.username, DEFAULT_USERNAME);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_lookups_create_one_row() {
        let (db, _dir) = file_pool(8).await;
        let calls: Vec<_> = (0..16)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { get_or_create_user(&db, EMAIL, None).await })
            })
            .collect();
        let mut ids = Vec::new();
        for call in calls {
            ids.push(call.await.unwrap().unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(user_count(&db, EMAIL).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_favorite_edits_all_land() {
        let (db, _dir) = file_pool(8).await;
        get_or_create_user(&db, EMAIL, None).await.unwrap();

        let adds: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move { add_favorite(&db, EMAIL, &format!("Dish {i}")).await })
            })
            .collect();
        for add in adds {
            add.await.unwrap().unwrap();
        }
        let mut favorites = get_favorites(&db, EMAIL).await.unwrap();
        favorites.sort();
        let expected: Vec<String> = (0..8).map(|i| format!("Dish {i}")).collect();
        assert_eq!(favorites, expected);

        let removes: Vec<_> = (0..4)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move { remove_favorite(&db, EMAIL, &format!("Dish {i}")).await })
            })
            .collect();
        for remove in removes {
            remove.await.unwrap().unwrap();
        }
        let mut favorites = get_favorites(&db, EMAIL).await.unwrap();
        favorites.sort();
        assert_eq!(favorites, expected[4..].to_vec());
    }

    #[tokio::test]
    async fn distinct_emails_get_distinct_ids() {
        let db = memory_pool().await;
        let a = get_or_create_user(&db, "a@wellesley.edu", None).await.unwrap();
        let b = get_or_create_user(&db, "b@wellesley.edu", None).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn register_then_lookup_keeps_id_and_preferences() {
        let db = memory_pool().await;
        let existing = get_or_create_user(&db, EMAIL, None).await.unwrap();
        let prefs = AllergyPreferences {
            allergens: vec!["Peanuts".into()],
            restrictions: vec!["Vegetarian".into()],
        };
        let id = register_user(&db, EMAIL, "Bates", &prefs).await.unwrap();
        assert_eq!(id, existing);

        let user = find_by_email(&db, EMAIL).await.unwrap().unwrap();
        assert_eq!(user.dining_hall, "Bates");
        assert_eq!(user.allergens, prefs.allergens);
        assert_eq!(user.dietary_restrictions, prefs.restrictions);
        assert!(user.favorites.is_empty());
    }

    #[tokio::test]
    async fn dining_hall_round_trip() {
        let db = memory_pool().await;
        assert_eq!(get_dining_hall(&db, EMAIL).await.unwrap(), "");
        get_or_create_user(&db, EMAIL, None).await.unwrap();
        assert_eq!(get_dining_hall(&db, EMAIL).await.unwrap(), "");

        update_dining_hall(&db, EMAIL, "Tower").await.unwrap();
        assert_eq!(get_dining_hall(&db, EMAIL).await.unwrap(), "Tower");
    }

    #[tokio::test]
    async fn updates_on_unknown_email_are_reported() {
        let db = memory_pool().await;
        let err = update_dining_hall(&db, "ghost@wellesley.edu", "Bae").await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownUser(_)));

        let err = add_favorite(&db, "ghost@wellesley.edu", "Soup").await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownUser(_)));

        let err = update_allergy_preferences(&db, "ghost@wellesley.edu", &AllergyPreferences::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownUser(_)));
    }

    #[tokio::test]
    async fn add_favorite_is_idempotent() {
        let db = memory_pool().await;
        get_or_create_user(&db, EMAIL, None).await.unwrap();

        add_favorite(&db, EMAIL, "Mac and Cheese").await.unwrap();
        let after = add_favorite(&db, EMAIL, "Mac and Cheese").await.unwrap();
        assert_eq!(after, vec!["Mac and Cheese".to_string()]);
        assert_eq!(get_favorites(&db, EMAIL).await.unwrap(), after);
    }

    #[tokio::test]
    async fn remove_favorite_ignores_missing_dish() {
        let db = memory_pool().await;
        get_or_create_user(&db, EMAIL, None).await.unwrap();
        add_favorite(&db, EMAIL, "Pho").await.unwrap();
        add_favorite(&db, EMAIL, "Waffles").await.unwrap();

        let unchanged = remove_favorite(&db, EMAIL, "Sushi").await.unwrap();
        assert_eq!(unchanged, vec!["Pho".to_string(), "Waffles".to_string()]);

        let after = remove_favorite(&db, EMAIL, "Pho").await.unwrap();
        assert_eq!(after, vec!["Waffles".to_string()]);
        assert_eq!(get_favorites(&db, EMAIL).await.unwrap(), after);
    }

    #[tokio::test]
    async fn favorites_for_unknown_user_are_empty() {
        let db = memory_pool().await;
        assert!(get_favorites(&db, "nobody@wellesley.edu").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn legacy_and_malformed_stored_lists() {
        let db = memory_pool().await;
        sqlx::query(
            "INSERT INTO users (email, allergens, dietaryRestrictions, favorites) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(EMAIL)
        .bind("['Peanuts']")
        .bind("[\"Halal\"]")
        .bind("{broken")
        .execute(&db)
        .await
        .unwrap();

        let prefs = get_allergy_preferences(&db, EMAIL).await.unwrap();
        assert_eq!(prefs.allergens, vec!["Peanuts".to_string()]);
        assert_eq!(prefs.restrictions, vec!["Halal".to_string()]);
        assert!(get_favorites(&db, EMAIL).await.unwrap().is_empty());

        // a write on top of garbage starts from the empty list
        let favorites = add_favorite(&db, EMAIL, "Falafel").await.unwrap();
        assert_eq!(favorites, vec!["Falafel".to_string()]);
    }

    #[tokio::test]
    async fn allergy_preferences_round_trip() {
        let db = memory_pool().await;
        get_or_create_user(&db, EMAIL, None).await.unwrap();
        assert_eq!(
            get_allergy_preferences(&db, EMAIL).await.unwrap(),
            AllergyPreferences::default()
        );

        let prefs = AllergyPreferences {
            allergens: vec!["Shellfish".into(), "Sesame".into()],
            restrictions: vec!["Gluten Free".into()],
        };
        update_allergy_preferences(&db, EMAIL, &prefs).await.unwrap();
        assert_eq!(get_allergy_preferences(&db, EMAIL).await.unwrap(), prefs);
    }
}
