//! Boundary validation for user-authored input.
//!
//! Titles and message content are checked here before they reach the
//! registry or the message store. Errors are field-level so the UI can show
//! them next to the offending input.

pub const TITLE_MAX_CHARS: usize = 50;
pub const CONTENT_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Chatroom title is required")]
    TitleEmpty,
    #[error("Chatroom title must be at most 50 characters")]
    TitleTooLong,
    #[error("Message cannot be empty")]
    MessageEmpty,
    #[error("Message must be at most 1000 characters")]
    MessageTooLong,
}

impl ValidationError {
    /// Name of the input field the error belongs to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::TitleEmpty | Self::TitleTooLong => "title",
            Self::MessageEmpty | Self::MessageTooLong => "content",
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TitleEmpty => "E_TITLE_EMPTY",
            Self::TitleTooLong => "E_TITLE_TOO_LONG",
            Self::MessageEmpty => "E_MESSAGE_EMPTY",
            Self::MessageTooLong => "E_MESSAGE_TOO_LONG",
        }
    }
}

/// Trim and strip angle brackets.
#[must_use]
pub fn sanitize_input(input: &str) -> String {
    input.trim().replace(['<', '>'], "")
}

/// Sanitize a chatroom title and check its length (1-50 chars).
///
/// # Errors
///
/// Returns `TitleEmpty` or `TitleTooLong`.
pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = sanitize_input(raw);
    let len = title.chars().count();
    if len == 0 {
        return Err(ValidationError::TitleEmpty);
    }
    if len > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(title)
}

/// Trim message content and check it. Empty content is allowed only when an
/// image is attached.
///
/// # Errors
///
/// Returns `MessageEmpty` or `MessageTooLong`.
pub fn validate_content(raw: &str, has_image: bool) -> Result<String, ValidationError> {
    let content = raw.trim();
    if content.is_empty() && !has_image {
        return Err(ValidationError::MessageEmpty);
    }
    if content.chars().count() > CONTENT_MAX_CHARS {
        return Err(ValidationError::MessageTooLong);
    }
    Ok(content.to_owned())
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
