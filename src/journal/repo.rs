use sqlx::{SqliteConnection, SqlitePool};
use time::{macros::format_description, Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use crate::error::StorageError;
use crate::journal::repo_types::{JournalEntry, JournalEntryRow, NewEntry};

/// Insert one entry stamped with the current time.
pub async fn add_entry(db: &SqlitePool, entry: &NewEntry) -> Result<Uuid, StorageError> {
    let mut conn = db.acquire().await?;
    insert_entry(&mut conn, entry, OffsetDateTime::now_utc()).await
}

/// `created_at` as stored: UTC with nanoseconds always written out, so text
/// order is time order.
pub fn format_created_at(at: OffsetDateTime) -> Result<String, StorageError> {
    Ok(at.to_offset(UtcOffset::UTC).format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
    ))?)
}

/// Insert with an explicit creation time so a batch can share one stamp.
pub async fn insert_entry(
    conn: &mut SqliteConnection,
    entry: &NewEntry,
    created_at: OffsetDateTime,
) -> Result<Uuid, StorageError> {
    let entry_id = Uuid::new_v4();
    let created_at = format_created_at(created_at)?;
    sqlx::query(
        r#"
        INSERT INTO food_journal
            (entry_id, user_id, date, meal_type, food_item, dining_hall, notes,
             calories, protein, carbs, fat, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(entry_id.to_string())
    .bind(entry.user_id)
    .bind(entry.date)
    .bind(&entry.meal_type)
    .bind(&entry.food_item)
    .bind(&entry.dining_hall)
    .bind(&entry.notes)
    .bind(entry.nutrition.calories)
    .bind(entry.nutrition.protein)
    .bind(entry.nutrition.carbs)
    .bind(entry.nutrition.fat)
    .bind(&created_at)
    .execute(&mut *conn)
    .await?;
    Ok(entry_id)
}

/// A user's entries, newest day first when `date` is `None`. Within a day
/// entries run Breakfast, Lunch, Dinner, Snack, then any other meal type
/// alphabetically; inside a meal the latest log comes first and items logged
/// together keep their order.
pub async fn list_entries(
    db: &SqlitePool,
    user_id: i64,
    date: Option<Date>,
) -> Result<Vec<JournalEntry>, StorageError> {
    let rows = sqlx::query_as::<_, JournalEntryRow>(
        r#"
        SELECT entry_id, user_id, date, meal_type, food_item, dining_hall, notes,
               calories, protein, carbs, fat, created_at
        FROM food_journal
        WHERE user_id = ?1 AND (?2 IS NULL OR date = ?2)
        ORDER BY date DESC,
                 CASE meal_type
                     WHEN 'Breakfast' THEN 0
                     WHEN 'Lunch' THEN 1
                     WHEN 'Dinner' THEN 2
                     WHEN 'Snack' THEN 3
                     ELSE 4
                 END,
                 meal_type,
                 created_at DESC,
                 rowid ASC
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;

    rows.into_iter().map(JournalEntry::try_from).collect()
}

/// Every entry across users, newest first.
pub async fn list_all_entries(db: &SqlitePool) -> Result<Vec<JournalEntry>, StorageError> {
    let rows = sqlx::query_as::<_, JournalEntryRow>(
        r#"
        SELECT entry_id, user_id, date, meal_type, food_item, dining_hall, notes,
               calories, protein, carbs, fat, created_at
        FROM food_journal
        ORDER BY date DESC, user_id, created_at DESC, rowid ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    rows.into_iter().map(JournalEntry::try_from).collect()
}

/// Remove an entry. Returns whether a row was deleted; a missing id is not an error.
pub async fn delete_entry(db: &SqlitePool, entry_id: Uuid) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM food_journal WHERE entry_id = ?1")
        .bind(entry_id.to_string())
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
