use crate::utils::error::{AppError, AppResult};

pub const MAX_MESSAGE_LEN: usize = 4000;
pub const MIN_SEARCH_PREFIX_CHARS: usize = 3;

pub fn validate_message_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "Message content cannot be empty".to_string(),
        ));
    }

    if content.len() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(format!(
            "Message content must be at most {} bytes long",
            MAX_MESSAGE_LEN
        )));
    }

    Ok(())
}

pub fn validate_search_prefix(prefix: &str) -> AppResult<()> {
    if prefix.chars().count() < MIN_SEARCH_PREFIX_CHARS {
        return Err(AppError::Validation(format!(
            "Search prefix must be at least {} characters long",
            MIN_SEARCH_PREFIX_CHARS
        )));
    }

    Ok(())
}
