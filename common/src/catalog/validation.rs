// Field validation for catalog input

use crate::errors::ValidationError;
use crate::models::{NewCategory, NewResource};
use url::Url;

/// Trim a required text field, rejecting empty or blank values
pub fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Validate that `value` is an absolute http(s) URL with a host
pub fn absolute_url(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = required(field, value)?;

    let invalid = |reason: String| ValidationError::InvalidFieldValue {
        field: field.to_string(),
        reason,
    };

    let url = Url::parse(&trimmed).map_err(|e| {
        if !trimmed.contains("://") {
            invalid("URL must be absolute and include a scheme (http:// or https://)".into())
        } else {
            invalid(format!("Invalid URL: {e}"))
        }
    })?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(invalid(format!(
                "Invalid scheme '{scheme}'. Must be http or https"
            )))
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL must have a valid host".into()));
    }

    Ok(trimmed)
}

/// Normalised copy of a category ready for storage
pub fn category(input: &NewCategory) -> Result<NewCategory, ValidationError> {
    Ok(NewCategory {
        name: required("name", &input.name)?,
        description: input.description.trim().to_string(),
    })
}

/// Normalised copy of a resource ready for storage
pub fn resource(input: &NewResource) -> Result<NewResource, ValidationError> {
    Ok(NewResource {
        title: required("title", &input.title)?,
        description: required("description", &input.description)?,
        url: absolute_url("url", &input.url)?,
        category_id: input.category_id,
        featured: input.featured,
    })
}
