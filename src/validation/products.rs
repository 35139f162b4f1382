use crate::{
    error::{AppError, Result},
    models::product::ProductInput,
};

/// Validates a product payload, shared by create and update.
pub fn validate_product(input: &ProductInput) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    if input.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }

    // JSON happily encodes 1e999 as infinity; price must stay a real amount.
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(AppError::Validation(
            "Price must be a non-negative number".to_string(),
        ));
    }

    if input.image.as_deref().is_some_and(|image| image.trim().is_empty()) {
        return Err(AppError::Validation(
            "Image must not be empty when provided".to_string(),
        ));
    }

    Ok(())
}
