use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::billing::{
  BillingError, Currency, DocumentNumber, Invoice, InvoiceRepository, InvoiceStatus, InvoiceType,
  LineItem, LineItemDescription, Money, Payment, PaymentMethod, Quantity,
};

#[derive(Debug, FromRow)]
pub(crate) struct InvoiceRow {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub customer_id: Uuid,
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
  pub paid_at: Option<DateTime<Utc>>,
  pub notes: Option<String>,
  pub related_invoice_id: Option<Uuid>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
  type Error = BillingError;

  fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
    let invoice_number = DocumentNumber::new(row.invoice_number)?;
    let invoice_type = InvoiceType::from_str(&row.invoice_type)?;
    let status = InvoiceStatus::from_str(&row.status)?;
    let currency = Currency::from_str(&row.currency)?;

    Ok(Invoice {
      id: row.id,
      tenant_id: row.tenant_id,
      customer_id: row.customer_id,
      invoice_number,
      invoice_type,
      status,
      issue_date: row.issue_date,
      due_date: row.due_date,
      currency,
      subtotal: row.subtotal,
      tax_amount: row.tax_amount,
      discount: row.discount,
      total_amount: row.total_amount,
      paid_amount: row.paid_amount,
      balance_due: row.balance_due,
      paid_at: row.paid_at,
      notes: row.notes,
      related_invoice_id: row.related_invoice_id,
      created_by: row.created_by,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct LineItemRow {
  pub id: Uuid,
  pub invoice_id: Uuid,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
  pub currency: String,
  pub line_order: i32,
}

impl TryFrom<LineItemRow> for LineItem {
  type Error = BillingError;

  fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
    let currency = Currency::from_str(&row.currency)?;

    Ok(LineItem {
      id: row.id,
      invoice_id: row.invoice_id,
      description: LineItemDescription::new(row.description)?,
      quantity: Quantity::new(row.quantity)?,
      unit_price: Money::new(row.unit_price, currency)?,
      amount: Money::new(row.amount, currency)?,
      line_order: row.line_order,
    })
  }
}

#[derive(Debug, FromRow)]
pub(crate) struct PaymentRow {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub invoice_id: Uuid,
  pub amount: Decimal,
  pub currency: String,
  pub method: String,
  pub reference: Option<String>,
  pub notes: Option<String>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
  type Error = BillingError;

  fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
    let currency = Currency::from_str(&row.currency)?;

    Ok(Payment {
      id: row.id,
      tenant_id: row.tenant_id,
      invoice_id: row.invoice_id,
      amount: Money::new(row.amount, currency)?,
      method: PaymentMethod::from_str(&row.method)?,
      reference: row.reference,
      notes: row.notes,
      created_by: row.created_by,
      created_at: row.created_at,
    })
  }
}

pub(crate) const INVOICE_COLUMNS: &str = "id, tenant_id, customer_id, invoice_number, \
   invoice_type, status, issue_date, due_date, currency, subtotal, tax_amount, \
   discount, total_amount, paid_amount, balance_due, paid_at, notes, \
   related_invoice_id, created_by, created_at, updated_at";

pub struct PostgresInvoiceRepository {
  pool: PgPool,
}

impl PostgresInvoiceRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
  async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Invoice>, BillingError> {
    let row = sqlx::query_as::<_, InvoiceRow>(&format!(
      r#"
            SELECT {}
            FROM invoices
            WHERE tenant_id = $1 AND id = $2
            "#,
      INVOICE_COLUMNS
    ))
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    row.map(|r| r.try_into()).transpose()
  }

  async fn find_line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, BillingError> {
    let rows = sqlx::query_as::<_, LineItemRow>(
      r#"
            SELECT id, invoice_id, description, quantity, unit_price, amount,
                   currency, line_order
            FROM invoice_line_items
            WHERE invoice_id = $1
            ORDER BY line_order ASC
            "#,
    )
    .bind(invoice_id)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }

  async fn find_payments(
    &self,
    tenant_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<Vec<Payment>, BillingError> {
    let rows = sqlx::query_as::<_, PaymentRow>(
      r#"
            SELECT id, tenant_id, invoice_id, amount, currency, method,
                   reference, notes, created_by, created_at
            FROM payments
            WHERE tenant_id = $1 AND invoice_id = $2
            ORDER BY created_at ASC
            "#,
    )
    .bind(tenant_id)
    .bind(invoice_id)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }
}
