use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::BillingError;
use super::value_objects::{
  CreditReason, Currency, DocumentNumber, InvoiceStatus, InvoiceType, LineItemDescription, Money,
  PaymentMethod, Quantity, ValueObjectError,
};

// Customer - Read-side projection used for response summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub name: String,
  pub email: Option<String>,
  pub phone: Option<String>,
}

/// Invoice - Billing document, either a standard invoice or a credit note.
///
/// Monetary invariants, enforced by the mutation methods:
/// - `total_amount = subtotal + tax_amount - discount`
/// - `balance_due = total_amount - paid_amount`
/// - `paid_amount` and `balance_due` never go negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub customer_id: Uuid,
  pub invoice_number: DocumentNumber,
  pub invoice_type: InvoiceType,
  pub status: InvoiceStatus,
  pub issue_date: DateTime<Utc>,
  pub due_date: DateTime<Utc>,
  pub currency: Currency,
  pub subtotal: Decimal,
  pub tax_amount: Decimal,
  pub discount: Decimal,
  pub total_amount: Decimal,
  pub paid_amount: Decimal,
  pub balance_due: Decimal,
  pub paid_at: Option<DateTime<Utc>>,
  pub notes: Option<String>,
  pub related_invoice_id: Option<Uuid>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Invoice {
  /// Builds the credit-note invoice issued against `original`.
  ///
  /// A credit note is settled the instant it is issued: its total, subtotal
  /// and paid amount all equal the credited amount, the balance is zero and
  /// `paid_at` is set. The notes carry a human-readable audit trail naming
  /// the original invoice, the reason and the refund channel.
  pub fn credit_note(
    number: DocumentNumber,
    original: &Invoice,
    amount: Money,
    reason: &CreditReason,
    refund_method: PaymentMethod,
    refund_reference: Option<&str>,
    created_by: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Self, BillingError> {
    if amount.currency != original.currency {
      return Err(BillingError::CurrencyMismatch {
        expected: original.currency.as_str().to_string(),
        actual: amount.currency.as_str().to_string(),
      });
    }
    if amount.is_zero() {
      return Err(BillingError::Validation(ValueObjectError::InvalidAmount(
        "Credit amount must be greater than zero".to_string(),
      )));
    }

    let notes = format!(
      "Credit note for invoice {}\nReason: {}\nRefund method: {}\nReference: {}",
      original.invoice_number,
      reason,
      refund_method,
      refund_reference.unwrap_or("-"),
    );

    Ok(Self {
      id: Uuid::new_v4(),
      tenant_id: original.tenant_id,
      customer_id: original.customer_id,
      invoice_number: number,
      invoice_type: InvoiceType::CreditNote,
      status: InvoiceStatus::Paid,
      issue_date: now,
      due_date: now,
      currency: original.currency,
      subtotal: amount.amount,
      tax_amount: Decimal::ZERO,
      discount: Decimal::ZERO,
      total_amount: amount.amount,
      paid_amount: amount.amount,
      balance_due: Decimal::ZERO,
      paid_at: Some(now),
      notes: Some(notes),
      related_invoice_id: Some(original.id),
      created_by,
      created_at: now,
      updated_at: now,
    })
  }

  /// The amount still refundable against this invoice.
  pub fn refundable(&self) -> Money {
    Money {
      amount: self.paid_amount,
      currency: self.currency,
    }
  }

  /// Applies a credit of `amount` issued as `credit_note_number` to this
  /// invoice: decrements the paid amount, recomputes the balance, derives
  /// the new status and appends an audit line to the notes.
  ///
  /// The caller must have verified `amount <= paid_amount`; the check is
  /// repeated here because concurrent credits may have shrunk the paid
  /// amount between the caller's read and the locked re-read.
  pub fn apply_credit(
    &mut self,
    amount: Decimal,
    credit_note_number: &DocumentNumber,
    now: DateTime<Utc>,
  ) -> Result<(), BillingError> {
    if amount <= Decimal::ZERO {
      return Err(BillingError::Validation(ValueObjectError::InvalidAmount(
        "Credit amount must be greater than zero".to_string(),
      )));
    }
    if amount > self.paid_amount {
      return Err(BillingError::CreditExceedsPaid {
        requested: amount,
        paid: self.paid_amount,
      });
    }

    self.paid_amount -= amount;
    self.balance_due = self.total_amount - self.paid_amount;
    self.status = InvoiceStatus::derive_settlement(self.balance_due, self.paid_amount);
    if self.paid_amount.is_zero() {
      self.paid_at = None;
    }

    let audit = format!(
      "Credit note {} issued for {:.2} {}",
      credit_note_number, amount, self.currency
    );
    self.notes = Some(match self.notes.take() {
      Some(existing) => format!("{}\n{}", existing, audit),
      None => audit,
    });
    self.updated_at = now;

    Ok(())
  }

  pub fn is_credit_note(&self) -> bool {
    self.invoice_type == InvoiceType::CreditNote
  }
}

// Invoice Line Item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub id: Uuid,
  pub invoice_id: Uuid,
  pub description: LineItemDescription,
  pub quantity: Quantity,
  pub unit_price: Money,
  pub amount: Money,
  pub line_order: i32,
}

impl LineItem {
  pub fn new(
    invoice_id: Uuid,
    description: LineItemDescription,
    quantity: Quantity,
    unit_price: Money,
    amount: Money,
    line_order: i32,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      invoice_id,
      description,
      quantity,
      unit_price,
      amount,
      line_order,
    }
  }
}

/// Payment - Append-only ledger entry; never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub invoice_id: Uuid,
  pub amount: Money,
  pub method: PaymentMethod,
  pub reference: Option<String>,
  pub notes: Option<String>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
}

impl Payment {
  /// Builds the refund ledger entry recorded against a credit-note invoice.
  pub fn refund(
    tenant_id: Uuid,
    credit_note_id: Uuid,
    amount: Money,
    method: PaymentMethod,
    reference: Option<String>,
    reason: &CreditReason,
    created_by: Uuid,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      tenant_id,
      invoice_id: credit_note_id,
      amount,
      method,
      reference,
      notes: Some(format!("Credit note refund - {}", reason)),
      created_by,
      created_at: now,
    }
  }
}

/// Customer Credit - Per-customer store-credit accumulator.
///
/// This service only ever adds to it; consumption happens in the sales flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCredit {
  pub customer_id: Uuid,
  pub tenant_id: Uuid,
  pub credit_available: Decimal,
  pub updated_at: DateTime<Utc>,
}

impl CustomerCredit {
  pub fn new(tenant_id: Uuid, customer_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      customer_id,
      tenant_id,
      credit_available: Decimal::ZERO,
      updated_at: now,
    }
  }

  pub fn add_credit(&mut self, amount: Decimal, now: DateTime<Utc>) -> Result<(), BillingError> {
    if amount <= Decimal::ZERO {
      return Err(BillingError::Validation(ValueObjectError::InvalidAmount(
        "Credit top-up must be greater than zero".to_string(),
      )));
    }
    self.credit_available += amount;
    self.updated_at = now;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;
  use std::str::FromStr;

  fn paid_invoice(total: Decimal, paid: Decimal) -> Invoice {
    let now = Utc::now();
    Invoice {
      id: Uuid::new_v4(),
      tenant_id: Uuid::new_v4(),
      customer_id: Uuid::new_v4(),
      invoice_number: DocumentNumber::new("INV-0001".to_string()).unwrap(),
      invoice_type: InvoiceType::Standard,
      status: InvoiceStatus::derive_settlement(total - paid, paid),
      issue_date: now,
      due_date: now,
      currency: Currency::AED,
      subtotal: total,
      tax_amount: Decimal::ZERO,
      discount: Decimal::ZERO,
      total_amount: total,
      paid_amount: paid,
      balance_due: total - paid,
      paid_at: if paid > Decimal::ZERO { Some(now) } else { None },
      notes: None,
      related_invoice_id: None,
      created_by: Uuid::new_v4(),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn test_credit_note_is_settled_on_creation() {
    let original = paid_invoice(dec!(1000), dec!(1000));
    let amount = Money::new(dec!(400), Currency::AED).unwrap();
    let reason = CreditReason::new("Customer return".to_string()).unwrap();
    let now = Utc::now();

    let credit_note = Invoice::credit_note(
      DocumentNumber::credit_note(1),
      &original,
      amount,
      &reason,
      PaymentMethod::Cash,
      Some("RCPT-9"),
      Uuid::new_v4(),
      now,
    )
    .unwrap();

    assert_eq!(credit_note.invoice_type, InvoiceType::CreditNote);
    assert_eq!(credit_note.status, InvoiceStatus::Paid);
    assert_eq!(credit_note.total_amount, dec!(400));
    assert_eq!(credit_note.paid_amount, dec!(400));
    assert_eq!(credit_note.balance_due, dec!(0));
    assert_eq!(credit_note.tax_amount, dec!(0));
    assert_eq!(credit_note.paid_at, Some(now));
    assert_eq!(credit_note.related_invoice_id, Some(original.id));
    assert_eq!(credit_note.issue_date, credit_note.due_date);

    let notes = credit_note.notes.unwrap();
    assert!(notes.contains("INV-0001"));
    assert!(notes.contains("Customer return"));
    assert!(notes.contains("Cash"));
    assert!(notes.contains("RCPT-9"));
  }

  #[test]
  fn test_credit_note_rejects_currency_mismatch() {
    let original = paid_invoice(dec!(1000), dec!(1000));
    let amount = Money::new(dec!(400), Currency::USD).unwrap();
    let reason = CreditReason::new("Return".to_string()).unwrap();

    let result = Invoice::credit_note(
      DocumentNumber::credit_note(1),
      &original,
      amount,
      &reason,
      PaymentMethod::Cash,
      None,
      Uuid::new_v4(),
      Utc::now(),
    );
    assert!(matches!(result, Err(BillingError::CurrencyMismatch { .. })));
  }

  #[test]
  fn test_apply_credit_full_refund() {
    let mut invoice = paid_invoice(dec!(1000), dec!(1000));
    let number = DocumentNumber::credit_note(1);

    invoice.apply_credit(dec!(1000), &number, Utc::now()).unwrap();

    assert_eq!(invoice.paid_amount, dec!(0));
    assert_eq!(invoice.balance_due, dec!(1000));
    assert_eq!(invoice.status, InvoiceStatus::Sent);
    assert_eq!(invoice.paid_at, None);
    assert!(invoice.notes.unwrap().contains("CN-0001"));
  }

  #[test]
  fn test_apply_credit_partial_refund() {
    let mut invoice = paid_invoice(dec!(1000), dec!(1000));
    let number = DocumentNumber::credit_note(2);

    invoice.apply_credit(dec!(400), &number, Utc::now()).unwrap();

    assert_eq!(invoice.paid_amount, dec!(600));
    assert_eq!(invoice.balance_due, dec!(400));
    assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
    assert!(invoice.paid_at.is_some());
    // Conservation: balance_due == total_amount - paid_amount
    assert_eq!(invoice.balance_due, invoice.total_amount - invoice.paid_amount);
  }

  #[test]
  fn test_apply_credit_exceeding_paid_amount_is_rejected() {
    let mut invoice = paid_invoice(dec!(1000), dec!(1000));
    let before = invoice.clone();
    let number = DocumentNumber::credit_note(1);

    let err = invoice.apply_credit(dec!(1500), &number, Utc::now()).unwrap_err();
    assert!(matches!(err, BillingError::CreditExceedsPaid { .. }));
    assert!(
      err
        .to_string()
        .contains("Credit amount (1500) cannot exceed paid amount (1000)")
    );
    // No mutation on failure
    assert_eq!(invoice, before);
  }

  #[test]
  fn test_apply_credit_rejects_non_positive_amount() {
    let mut invoice = paid_invoice(dec!(1000), dec!(1000));
    let number = DocumentNumber::credit_note(1);

    assert!(invoice.apply_credit(dec!(0), &number, Utc::now()).is_err());
    assert!(invoice.apply_credit(dec!(-5), &number, Utc::now()).is_err());
  }

  #[test]
  fn test_apply_credit_appends_audit_line() {
    let mut invoice = paid_invoice(dec!(1000), dec!(1000));
    invoice.notes = Some("Imported from legacy system".to_string());
    let number = DocumentNumber::credit_note(3);

    invoice.apply_credit(dec!(100), &number, Utc::now()).unwrap();

    let notes = invoice.notes.unwrap();
    assert!(notes.starts_with("Imported from legacy system\n"));
    assert!(notes.contains("Credit note CN-0003 issued for 100.00 AED"));
  }

  #[test]
  fn test_consecutive_credits_accumulate() {
    let mut invoice = paid_invoice(dec!(1000), dec!(1000));

    invoice
      .apply_credit(dec!(300), &DocumentNumber::credit_note(1), Utc::now())
      .unwrap();
    invoice
      .apply_credit(dec!(700), &DocumentNumber::credit_note(2), Utc::now())
      .unwrap();

    assert_eq!(invoice.paid_amount, dec!(0));
    assert_eq!(invoice.balance_due, dec!(1000));
    assert_eq!(invoice.status, InvoiceStatus::Sent);
    assert_eq!(invoice.paid_at, None);
  }

  #[test]
  fn test_refund_payment_notes() {
    let reason = CreditReason::new("Damaged bottle".to_string()).unwrap();
    let payment = Payment::refund(
      Uuid::new_v4(),
      Uuid::new_v4(),
      Money::new(dec!(150), Currency::AED).unwrap(),
      PaymentMethod::BankTransfer,
      Some("TRX-100".to_string()),
      &reason,
      Uuid::new_v4(),
      Utc::now(),
    );

    assert_eq!(
      payment.notes.as_deref(),
      Some("Credit note refund - Damaged bottle")
    );
    assert_eq!(payment.reference.as_deref(), Some("TRX-100"));
    assert_eq!(payment.method, PaymentMethod::BankTransfer);
  }

  #[test]
  fn test_customer_credit_accumulates() {
    let mut credit = CustomerCredit::new(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
    assert_eq!(credit.credit_available, dec!(0));

    credit.add_credit(dec!(50), Utc::now()).unwrap();
    credit.add_credit(dec!(400), Utc::now()).unwrap();
    assert_eq!(credit.credit_available, dec!(450));

    assert!(credit.add_credit(dec!(0), Utc::now()).is_err());
  }

  #[test]
  fn test_status_round_trip() {
    for status in [
      InvoiceStatus::Draft,
      InvoiceStatus::Sent,
      InvoiceStatus::PartiallyPaid,
      InvoiceStatus::Paid,
      InvoiceStatus::Overdue,
      InvoiceStatus::CreditNote,
      InvoiceStatus::Cancelled,
    ] {
      assert_eq!(InvoiceStatus::from_str(status.as_str()).unwrap(), status);
    }
  }
}
