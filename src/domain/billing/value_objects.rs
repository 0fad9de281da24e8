use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid document number: {0}")]
  InvalidDocumentNumber(String),
  #[error("Invalid currency code: {0}")]
  InvalidCurrency(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Invalid credit reason: {0}")]
  InvalidReason(String),
  #[error("Invalid line item description: {0}")]
  InvalidDescription(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid invoice status: {0}")]
  InvalidStatus(String),
  #[error("Invalid invoice type: {0}")]
  InvalidInvoiceType(String),
  #[error("Invalid payment method: {0}")]
  InvalidPaymentMethod(String),
}

/// Document number of an invoice or credit note, e.g. `INV-0042` or `CN-0007`.
///
/// The numeric suffix after the last `-` is the per-tenant sequence value.
/// Padding is a minimum width: `CN-10000` is valid, the sequence is never
/// truncated to fit four digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNumber(String);

pub const CREDIT_NOTE_PREFIX: &str = "CN";

impl DocumentNumber {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidDocumentNumber(
        "Document number cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 100 {
      return Err(ValueObjectError::InvalidDocumentNumber(
        "Document number cannot exceed 100 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  /// Formats a credit-note number from a sequence value, zero-padded to a
  /// minimum of 4 digits.
  pub fn credit_note(sequence: i64) -> Self {
    Self(format!("{}-{:04}", CREDIT_NOTE_PREFIX, sequence))
  }

  /// Parses the numeric sequence suffix after the last `-`.
  ///
  /// Returns `None` for numbers without a parseable suffix, in which case
  /// callers treat the sequence as unseeded.
  pub fn sequence_suffix(&self) -> Option<i64> {
    self.0.rsplit('-').next()?.parse::<i64>().ok()
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for DocumentNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Invoice Type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
  Standard,
  CreditNote,
}

impl InvoiceType {
  pub fn as_str(&self) -> &'static str {
    match self {
      InvoiceType::Standard => "standard",
      InvoiceType::CreditNote => "credit_note",
    }
  }
}

impl FromStr for InvoiceType {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "standard" => Ok(InvoiceType::Standard),
      "credit_note" => Ok(InvoiceType::CreditNote),
      _ => Err(ValueObjectError::InvalidInvoiceType(format!(
        "Unknown invoice type: {}",
        s
      ))),
    }
  }
}

// Invoice Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
  Draft,
  Sent,
  PartiallyPaid,
  Paid,
  Overdue,
  CreditNote,
  Cancelled,
}

impl InvoiceStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      InvoiceStatus::Draft => "draft",
      InvoiceStatus::Sent => "sent",
      InvoiceStatus::PartiallyPaid => "partially_paid",
      InvoiceStatus::Paid => "paid",
      InvoiceStatus::Overdue => "overdue",
      InvoiceStatus::CreditNote => "credit_note",
      InvoiceStatus::Cancelled => "cancelled",
    }
  }

  /// Settlement status derived from the monetary fields after a mutation.
  ///
  /// Once payments exist the status is never set arbitrarily; it always
  /// follows from `balance_due` and `paid_amount`:
  /// - balance outstanding and something paid: `PartiallyPaid`
  /// - balance outstanding and nothing paid: `Sent`
  /// - balance fully covered: `Paid`
  pub fn derive_settlement(balance_due: Decimal, paid_amount: Decimal) -> Self {
    if balance_due > Decimal::ZERO {
      if paid_amount > Decimal::ZERO {
        InvoiceStatus::PartiallyPaid
      } else {
        InvoiceStatus::Sent
      }
    } else {
      InvoiceStatus::Paid
    }
  }
}

impl FromStr for InvoiceStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "draft" => Ok(InvoiceStatus::Draft),
      "sent" => Ok(InvoiceStatus::Sent),
      "partially_paid" => Ok(InvoiceStatus::PartiallyPaid),
      "paid" => Ok(InvoiceStatus::Paid),
      "overdue" => Ok(InvoiceStatus::Overdue),
      "credit_note" => Ok(InvoiceStatus::CreditNote),
      "cancelled" => Ok(InvoiceStatus::Cancelled),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown status: {}",
        s
      ))),
    }
  }
}

// Payment Method - channel through which money moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  Cash,
  Card,
  BankTransfer,
  CreditBalance,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Cash => "cash",
      PaymentMethod::Card => "card",
      PaymentMethod::BankTransfer => "bank_transfer",
      PaymentMethod::CreditBalance => "credit_balance",
    }
  }
}

impl Default for PaymentMethod {
  fn default() -> Self {
    PaymentMethod::CreditBalance
  }
}

impl FromStr for PaymentMethod {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "cash" => Ok(PaymentMethod::Cash),
      "card" => Ok(PaymentMethod::Card),
      "bank_transfer" => Ok(PaymentMethod::BankTransfer),
      "credit_balance" => Ok(PaymentMethod::CreditBalance),
      _ => Err(ValueObjectError::InvalidPaymentMethod(format!(
        "Unknown payment method: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PaymentMethod::Cash => write!(f, "Cash"),
      PaymentMethod::Card => write!(f, "Card"),
      PaymentMethod::BankTransfer => write!(f, "Bank Transfer"),
      PaymentMethod::CreditBalance => write!(f, "Credit Balance"),
    }
  }
}

// Currency - ISO 4217, Gulf retail set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
  AED,
  SAR,
  OMR,
  USD,
  EUR,
  GBP,
}

impl Currency {
  pub fn as_str(&self) -> &'static str {
    match self {
      Currency::AED => "AED",
      Currency::SAR => "SAR",
      Currency::OMR => "OMR",
      Currency::USD => "USD",
      Currency::EUR => "EUR",
      Currency::GBP => "GBP",
    }
  }
}

impl FromStr for Currency {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "AED" => Ok(Currency::AED),
      "SAR" => Ok(Currency::SAR),
      "OMR" => Ok(Currency::OMR),
      "USD" => Ok(Currency::USD),
      "EUR" => Ok(Currency::EUR),
      "GBP" => Ok(Currency::GBP),
      _ => Err(ValueObjectError::InvalidCurrency(format!(
        "Unsupported currency: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for Currency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

// Money - Non-negative amount with currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
  pub amount: Decimal,
  pub currency: Currency,
}

impl Money {
  pub fn new(amount: Decimal, currency: Currency) -> Result<Self, ValueObjectError> {
    if amount.is_sign_negative() {
      return Err(ValueObjectError::InvalidAmount(
        "Amount cannot be negative".to_string(),
      ));
    }
    Ok(Self { amount, currency })
  }

  pub fn zero(currency: Currency) -> Self {
    Self {
      amount: Decimal::ZERO,
      currency,
    }
  }

  pub fn is_zero(&self) -> bool {
    self.amount.is_zero()
  }

  pub fn add(&self, other: &Money) -> Result<Money, ValueObjectError> {
    if self.currency != other.currency {
      return Err(ValueObjectError::InvalidAmount(
        "Cannot add amounts with different currencies".to_string(),
      ));
    }
    Ok(Money {
      amount: self.amount + other.amount,
      currency: self.currency,
    })
  }

  /// Checked subtraction; the result must stay non-negative.
  pub fn subtract(&self, other: &Money) -> Result<Money, ValueObjectError> {
    if self.currency != other.currency {
      return Err(ValueObjectError::InvalidAmount(
        "Cannot subtract amounts with different currencies".to_string(),
      ));
    }
    let amount = self.amount - other.amount;
    if amount.is_sign_negative() {
      return Err(ValueObjectError::InvalidAmount(
        "Subtraction would produce a negative amount".to_string(),
      ));
    }
    Ok(Money {
      amount,
      currency: self.currency,
    })
  }

  pub fn multiply(&self, factor: Decimal) -> Money {
    Money {
      amount: self.amount * factor,
      currency: self.currency,
    }
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.2} {}", self.amount, self.currency.as_str())
  }
}

// Credit Reason - Mandatory free-text justification for a credit note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditReason(String);

impl CreditReason {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidReason(
        "Credit reason cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 500 {
      return Err(ValueObjectError::InvalidReason(
        "Credit reason cannot exceed 500 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for CreditReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Line Item Description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDescription(String);

impl LineItemDescription {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 500 {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot exceed 500 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

// Quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value <= Decimal::ZERO {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity must be positive".to_string(),
      ));
    }
    // Max 4 decimal places
    if value.scale() > 4 {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity cannot have more than 4 decimal places".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn one() -> Self {
    Self(Decimal::ONE)
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}
