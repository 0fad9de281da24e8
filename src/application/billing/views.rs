use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::billing::{Customer, CustomerCredit, Invoice, LineItem, Payment};

/// Customer summary embedded in invoice payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummaryDto {
  pub id: Uuid,
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

impl From<&Customer> for CustomerSummaryDto {
  fn from(customer: &Customer) -> Self {
    Self {
      id: customer.id,
      name: customer.name.clone(),
      email: customer.email.clone(),
      phone: customer.phone.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDto {
  pub id: Uuid,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

impl From<&LineItem> for LineItemDto {
  fn from(item: &LineItem) -> Self {
    Self {
      id: item.id,
      description: item.description.value().to_string(),
      quantity: item.quantity.value(),
      unit_price: item.unit_price.amount,
      amount: item.amount.amount,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
  pub id: Uuid,
  pub invoice_id: Uuid,
  pub amount: Decimal,
  pub payment_method: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reference: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentDto {
  fn from(payment: &Payment) -> Self {
    Self {
      id: payment.id,
      invoice_id: payment.invoice_id,
      amount: payment.amount.amount,
      payment_method: payment.method.as_str().to_string(),
      reference: payment.reference.clone(),
      notes: payment.notes.clone(),
      created_by: payment.created_by,
      created_at: payment.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
  pub id: Uuid,
  pub invoice_number: String,
  pub invoice_type: String,
  pub status: String,
  pub issue_date: DateTime<Utc>,
  pub due_date: DateTime<Utc>,
  pub currency: String,
  pub subtotal: Decimal,
  pub tax_amount: Decimal,
  pub discount: Decimal,
  pub total_amount: Decimal,
  pub paid_amount: Decimal,
  pub balance_due: Decimal,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub paid_at: Option<DateTime<Utc>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub related_invoice_id: Option<Uuid>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub customer: Option<CustomerSummaryDto>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub line_items: Vec<LineItemDto>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub payments: Vec<PaymentDto>,
}

impl InvoiceDto {
  pub fn from_parts(
    invoice: &Invoice,
    customer: Option<&Customer>,
    line_items: &[LineItem],
    payments: &[Payment],
  ) -> Self {
    Self {
      id: invoice.id,
      invoice_number: invoice.invoice_number.value().to_string(),
      invoice_type: invoice.invoice_type.as_str().to_string(),
      status: invoice.status.as_str().to_string(),
      issue_date: invoice.issue_date,
      due_date: invoice.due_date,
      currency: invoice.currency.as_str().to_string(),
      subtotal: invoice.subtotal,
      tax_amount: invoice.tax_amount,
      discount: invoice.discount,
      total_amount: invoice.total_amount,
      paid_amount: invoice.paid_amount,
      balance_due: invoice.balance_due,
      paid_at: invoice.paid_at,
      notes: invoice.notes.clone(),
      related_invoice_id: invoice.related_invoice_id,
      created_by: invoice.created_by,
      created_at: invoice.created_at,
      updated_at: invoice.updated_at,
      customer: customer.map(CustomerSummaryDto::from),
      line_items: line_items.iter().map(LineItemDto::from).collect(),
      payments: payments.iter().map(PaymentDto::from).collect(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreditDto {
  pub customer_id: Uuid,
  pub credit_available: Decimal,
  pub updated_at: DateTime<Utc>,
}

impl From<&CustomerCredit> for CustomerCreditDto {
  fn from(credit: &CustomerCredit) -> Self {
    Self {
      customer_id: credit.customer_id,
      credit_available: credit.credit_available,
      updated_at: credit.updated_at,
    }
  }
}
