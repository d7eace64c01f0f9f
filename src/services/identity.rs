use crate::utils::error::{AppError, AppResult};

/// Orders an unordered pair of user ids as `(low, high)` so a chat between
/// two users is keyed the same way regardless of who asks.
pub fn canonicalize(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Rejects a pair that names the same user twice.
pub fn ensure_distinct(a: i64, b: i64) -> AppResult<()> {
    if a == b {
        return Err(AppError::Validation(
            "Cannot start a chat with yourself".to_string(),
        ));
    }
    Ok(())
}
