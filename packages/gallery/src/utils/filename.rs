use crate::error::PipelineError;

/// Longest accepted image or workspace name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Why a name cannot be used as a single object key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    Empty,
    TooLong,
    /// Contains `/` or `\`.
    ContainsPathSeparator,
    /// Is `.` or `..`.
    PathTraversal,
    /// Starts with `.`, which would collide with the workspace marker.
    Hidden,
    /// Contains NUL or another control character.
    ControlCharacter,
}

impl NameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "cannot be empty",
            Self::TooLong => "must be at most 255 bytes",
            Self::ContainsPathSeparator => "must not contain path separators",
            Self::PathTraversal => "must not be '.' or '..'",
            Self::Hidden => "must not start with '.'",
            Self::ControlCharacter => "must not contain control characters",
        }
    }
}

/// Validate a flat name (no directory components) and return it trimmed.
pub fn validate_flat_name(name: &str) -> Result<&str, NameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(NameError::ControlCharacter);
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(NameError::ContainsPathSeparator);
    }
    if trimmed == "." || trimmed == ".." {
        return Err(NameError::PathTraversal);
    }
    if trimmed.starts_with('.') {
        return Err(NameError::Hidden);
    }

    Ok(trimmed)
}

/// [`validate_flat_name`] mapped to a `Validation` error naming the field.
pub fn require_flat_name<'a>(field: &str, name: &'a str) -> Result<&'a str, PipelineError> {
    validate_flat_name(name)
        .map_err(|e| PipelineError::Validation(format!("{field} {}", e.message())))
}
