use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// One explicit line of a requested credit note.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditNoteLineItemRequest {
  /// What is being credited
  #[validate(length(
    min = 1,
    max = 500,
    message = "Line item description must be between 1 and 500 characters"
  ))]
  pub description: String,

  /// Credited quantity, must be positive
  #[validate(custom(function = validate_positive))]
  pub quantity: Decimal,

  /// Unit price, must not be negative
  #[validate(custom(function = validate_non_negative))]
  pub unit_price: Decimal,

  /// Line amount, must not be negative
  #[validate(custom(function = validate_non_negative))]
  pub amount: Decimal,
}

/// Request to issue a credit note against an invoice
///
/// `lineItems` is optional; when omitted a single line is synthesized from
/// the reason and the amount. `refundMethod` defaults to `credit_balance`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreditNoteRequest {
  /// Amount to credit, must be positive
  #[validate(custom(function = validate_positive))]
  pub amount: Decimal,

  /// Why the credit is issued
  #[validate(length(
    min = 1,
    max = 500,
    message = "Reason must be between 1 and 500 characters"
  ))]
  pub reason: String,

  /// Optional explicit line items
  #[validate(nested)]
  pub line_items: Option<Vec<CreditNoteLineItemRequest>>,

  /// cash | card | bank_transfer | credit_balance
  pub refund_method: Option<String>,

  /// External reference for the refund (receipt, transfer id)
  pub refund_reference: Option<String>,
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
  if *value <= Decimal::ZERO {
    let mut error = ValidationError::new("positive");
    error.message = Some("Value must be greater than zero".into());
    return Err(error);
  }
  Ok(())
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
  if value.is_sign_negative() {
    let mut error = ValidationError::new("non_negative");
    error.message = Some("Value cannot be negative".into());
    return Err(error);
  }
  Ok(())
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  /// Error type/code
  pub error: String,

  /// Human-readable error message
  pub message: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  fn valid_request() -> IssueCreditNoteRequest {
    IssueCreditNoteRequest {
      amount: dec!(400),
      reason: "Customer return".to_string(),
      line_items: None,
      refund_method: Some("cash".to_string()),
      refund_reference: None,
    }
  }

  #[test]
  fn test_valid_request() {
    assert!(valid_request().validate().is_ok());
  }

  #[test]
  fn test_zero_amount_is_rejected() {
    let mut request = valid_request();
    request.amount = dec!(0);
    assert!(request.validate().is_err());
  }

  #[test]
  fn test_negative_amount_is_rejected() {
    let mut request = valid_request();
    request.amount = dec!(-50);
    assert!(request.validate().is_err());
  }

  #[test]
  fn test_empty_reason_is_rejected() {
    let mut request = valid_request();
    request.reason = String::new();
    assert!(request.validate().is_err());
  }

  #[test]
  fn test_line_items_are_validated() {
    let mut request = valid_request();
    request.line_items = Some(vec![CreditNoteLineItemRequest {
      description: "Oud oil 12ml".to_string(),
      quantity: dec!(0),
      unit_price: dec!(100),
      amount: dec!(100),
    }]);
    assert!(request.validate().is_err());

    request.line_items = Some(vec![CreditNoteLineItemRequest {
      description: "Oud oil 12ml".to_string(),
      quantity: dec!(1),
      unit_price: dec!(100),
      amount: dec!(100),
    }]);
    assert!(request.validate().is_ok());
  }

  #[test]
  fn test_camel_case_deserialization() {
    let json = r#"{
      "amount": "400",
      "reason": "Customer return",
      "refundMethod": "credit_balance",
      "refundReference": "RF-1",
      "lineItems": [
        {"description": "Oud oil", "quantity": "1", "unitPrice": "400", "amount": "400"}
      ]
    }"#;
    let request: IssueCreditNoteRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.amount, dec!(400));
    assert_eq!(request.refund_method.as_deref(), Some("credit_balance"));
    assert_eq!(request.line_items.unwrap().len(), 1);
  }
}
