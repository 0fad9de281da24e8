use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::value_objects::ValueObjectError;

#[derive(Debug, Error)]
pub enum BillingError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Credit amount ({requested}) cannot exceed paid amount ({paid})")]
  CreditExceedsPaid { requested: Decimal, paid: Decimal },

  #[error("Currency mismatch: expected {expected}, got {actual}")]
  CurrencyMismatch { expected: String, actual: String },

  #[error("Invoice not found: {0}")]
  InvoiceNotFound(Uuid),

  #[error("Customer not found: {0}")]
  CustomerNotFound(Uuid),

  #[error("No credit account exists for customer {0}")]
  MissingCreditAccount(Uuid),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl BillingError {
  /// Transient storage conflicts (serialization failures, deadlocks,
  /// numbering collisions) are retried once by the issuance service.
  pub fn is_transient_conflict(&self) -> bool {
    matches!(self, BillingError::Conflict(_))
  }
}
