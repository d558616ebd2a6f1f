use std::borrow::Cow;

use validator::ValidationError;

/// Validate the text a quiz is generated from
///
/// # Examples
/// ```
/// use qf_api::validation::validate_source_text;
///
/// assert!(validate_source_text("Mitochondria produce ATP.").is_ok());
/// assert!(validate_source_text("   \n").is_err());
/// ```
pub fn validate_source_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("empty_source_text")
            .with_message(Cow::Borrowed("Source text cannot be empty")));
    }

    Ok(())
}

/// Validate that a title is not only whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("Value cannot be blank")));
    }

    Ok(())
}
