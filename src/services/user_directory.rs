use chrono::Utc;
use itertools::Itertools;
use sqlx::{QueryBuilder, Sqlite};

use crate::database::{DbPool, ReplicaRouter};
use crate::models::user::{NewUser, User, UserSummary};
use crate::utils::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, login, name, last_name, description, photo_file, created_at";

pub async fn get(pool: &DbPool, id: i64) -> AppResult<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Users for the given ids, in no particular order. Unknown ids are skipped.
pub async fn get_by_ids(pool: &DbPool, ids: &[i64]) -> AppResult<Vec<User>> {
    let ids: Vec<i64> = ids.iter().copied().unique().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM users WHERE id IN (",
        USER_COLUMNS
    ));
    let mut separated = query.separated(", ");
    for id in &ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let users = query
        .build_query_as::<User>()
        .fetch_all(pool.as_ref())
        .await?;

    Ok(users)
}

pub async fn exists(pool: &DbPool, id: i64) -> AppResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(pool.as_ref())
        .await?;

    Ok(count > 0)
}

pub async fn create(pool: &DbPool, user: &NewUser) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO users (login, name, last_name, password_hash, description, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.login)
    .bind(&user.name)
    .bind(&user.last_name)
    .bind(&user.password_hash)
    .bind(&user.description)
    .bind(Utc::now())
    .execute(pool.as_ref())
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Validation(format!("Login [{}] is already taken", user.login))
        }
        other => AppError::Database(other),
    })?;

    Ok(result.last_insert_rowid())
}

/// One page of the directory, ascending by id, starting after `min_id`.
pub async fn list(pool: &DbPool, min_id: i64, limit: i64) -> AppResult<Vec<UserSummary>> {
    if limit <= 0 {
        return Ok(Vec::new());
    }

    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, last_name FROM users WHERE id > ? ORDER BY id ASC LIMIT ?",
    )
    .bind(min_id)
    .bind(limit)
    .fetch_all(pool.as_ref())
    .await?;

    Ok(users)
}

/// Escapes LIKE wildcards so the prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Users whose first or last name starts with `prefix`, with `id > min_id`,
/// ascending by id. Served by a randomly chosen member of the read set, so
/// recent registrations may not be visible yet.
#[tracing::instrument(skip(router))]
pub async fn find_by_name_prefix(
    router: &ReplicaRouter,
    prefix: &str,
    min_id: i64,
    limit: i64,
) -> AppResult<Vec<UserSummary>> {
    let pattern = like_prefix(prefix);
    let target = router.pick();
    tracing::debug!(member = target.index, primary = target.is_primary, "Routed directory search");

    let users = sqlx::query_as::<_, UserSummary>(
        "SELECT id, name, last_name FROM users
         WHERE id > ? AND (name LIKE ? ESCAPE '\\' OR last_name LIKE ? ESCAPE '\\')
         ORDER BY id ASC
         LIMIT ?",
    )
    .bind(min_id)
    .bind(&pattern)
    .bind(&pattern)
    .bind(limit)
    .fetch_all(target.pool.as_ref())
    .await?;

    Ok(users)
}
