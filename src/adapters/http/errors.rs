use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use serde::Serialize;
use std::fmt;

use crate::domain::billing::BillingError;

use super::dtos::ErrorResponse;

/// API error type that maps domain errors to HTTP responses
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
  /// Validation error (400 Bad Request)
  Validation(String),

  /// Missing or unusable tenant/user identity (401 Unauthorized)
  Unauthorized(String),

  /// Referenced record does not exist for the tenant (404 Not Found)
  NotFound(String),

  /// Unresolved concurrent-issuance conflict (409 Conflict)
  Conflict(String),

  /// Internal server error (500 Internal Server Error)
  Internal(String),
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
      ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
      ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
      ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let (error_type, message) = match self {
      ApiError::Validation(msg) => ("validation_error", msg.clone()),
      ApiError::Unauthorized(msg) => ("unauthorized", msg.clone()),
      ApiError::NotFound(msg) => ("not_found", msg.clone()),
      ApiError::Conflict(msg) => ("conflict", msg.clone()),
      ApiError::Internal(msg) => {
        // Full detail goes to the log, the caller gets a generic message
        tracing::error!("Internal error: {}", msg);
        (
          "internal_error",
          "An internal server error occurred".to_string(),
        )
      }
    };

    let error_response = ErrorResponse {
      error: error_type.to_string(),
      message,
    };

    HttpResponse::build(status)
      .content_type(ContentType::json())
      .json(error_response)
  }
}

/// Convert BillingError to ApiError
impl From<BillingError> for ApiError {
  fn from(error: BillingError) -> Self {
    match error {
      BillingError::Validation(err) => ApiError::Validation(err.to_string()),
      err @ BillingError::CreditExceedsPaid { .. } => ApiError::Validation(err.to_string()),
      err @ BillingError::CurrencyMismatch { .. } => ApiError::Validation(err.to_string()),
      err @ BillingError::MissingCreditAccount(_) => ApiError::Validation(err.to_string()),
      BillingError::InvoiceNotFound(id) => ApiError::NotFound(format!("Invoice {} not found", id)),
      BillingError::CustomerNotFound(id) => {
        ApiError::NotFound(format!("Customer {} not found", id))
      }
      BillingError::Conflict(msg) => ApiError::Conflict(msg),
      BillingError::Database(err) => ApiError::Internal(err.to_string()),
      BillingError::Internal(msg) => ApiError::Internal(msg),
    }
  }
}

/// Convert validation errors from validator crate
///
/// Reports the first failing field with its message, matching the fail-fast
/// contract of the request schema.
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let message = errors
      .field_errors()
      .iter()
      .flat_map(|(field, errors)| {
        errors.iter().map(move |error| {
          error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Invalid field: {}", field))
        })
      })
      .next()
      .unwrap_or_else(|| "Invalid request".to_string());

    ApiError::Validation(message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;
  use uuid::Uuid;

  #[test]
  fn test_api_error_status_codes() {
    assert_eq!(
      ApiError::Validation("test".to_string()).status_code(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      ApiError::Unauthorized("test".to_string()).status_code(),
      StatusCode::UNAUTHORIZED
    );
    assert_eq!(
      ApiError::NotFound("test".to_string()).status_code(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      ApiError::Conflict("test".to_string()).status_code(),
      StatusCode::CONFLICT
    );
    assert_eq!(
      ApiError::Internal("test".to_string()).status_code(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn test_billing_error_conversion() {
    let api_error: ApiError = BillingError::InvoiceNotFound(Uuid::new_v4()).into();
    assert_eq!(api_error.status_code(), StatusCode::NOT_FOUND);

    let api_error: ApiError = BillingError::CreditExceedsPaid {
      requested: dec!(1500),
      paid: dec!(1000),
    }
    .into();
    assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);
    assert!(
      api_error
        .to_string()
        .contains("Credit amount (1500) cannot exceed paid amount (1000)")
    );

    let api_error: ApiError = BillingError::Conflict("numbering collision".to_string()).into();
    assert_eq!(api_error.status_code(), StatusCode::CONFLICT);
  }
}
