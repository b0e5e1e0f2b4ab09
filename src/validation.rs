use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum task text length, in characters, after trimming.
pub const MAX_TASK_LENGTH: usize = 100;

/// Checks task text and returns it trimmed.
pub fn validate(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let len = trimmed.chars().count();
    if len > MAX_TASK_LENGTH {
        return Err(ValidationError::TooLong { len, max: MAX_TASK_LENGTH });
    }
    Ok(trimmed.to_string())
}

/// Trims and truncates text so it never exceeds `MAX_TASK_LENGTH`.
pub fn sanitize(text: &str) -> String {
    text.trim().chars().take(MAX_TASK_LENGTH).collect()
}

/// Generates a random task id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
