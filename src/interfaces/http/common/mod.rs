//! Shared HTTP building blocks: response envelope, error mapping and
//! validating extractors

mod error;
mod response;
mod validated_json;
mod validated_query;

pub use error::{error_response, ApiError};
pub use response::ApiResponse;
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
pub use validated_query::{ValidatedQuery, ValidatedQueryRejection};

/// Flatten `validator` field errors into one readable line.
pub(crate) fn describe_validation_errors(errors: &validator::ValidationErrors) -> String {
    let field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{:?}", e.code));
                format!("{}: {}", field, msg)
            })
        })
        .collect();

    if field_errors.is_empty() {
        "Validation failed".to_string()
    } else {
        field_errors.join("; ")
    }
}
