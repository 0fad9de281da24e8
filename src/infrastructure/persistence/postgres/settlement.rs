use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::billing::{
  BillingError, CustomerCredit, DocumentNumber, Invoice, InvoiceType, IssuanceOutcome,
  IssuancePlan, LineItem, MissingCreditAccountPolicy, Payment, PaymentMethod,
  SettlementUnitOfWork,
};

use super::invoice_repository::{INVOICE_COLUMNS, InvoiceRow};

/// Postgres codes that signal a transient collision between two concurrent
/// issuances: serialization failure, deadlock, unique violation on the
/// credit-note number.
const CONFLICT_CODES: [&str; 3] = ["40001", "40P01", "23505"];

/// Commits one credit-note issuance as a single transaction.
///
/// The original invoice row is locked with SELECT ... FOR UPDATE, so the
/// refundable check and the paid-amount update always see the latest
/// committed state. The per-tenant number counter is bumped under the same
/// transaction, which serializes concurrent issuances for a tenant.
pub struct PostgresSettlementUnitOfWork {
  pool: PgPool,
  policy: MissingCreditAccountPolicy,
}

impl PostgresSettlementUnitOfWork {
  pub fn new(pool: PgPool, policy: MissingCreditAccountPolicy) -> Self {
    Self { pool, policy }
  }

  async fn lock_invoice(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<Invoice, BillingError> {
    let row = sqlx::query_as::<_, InvoiceRow>(&format!(
      r#"
            SELECT {}
            FROM invoices
            WHERE tenant_id = $1 AND id = $2
            FOR UPDATE
            "#,
      INVOICE_COLUMNS
    ))
    .bind(tenant_id)
    .bind(invoice_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

    row.try_into()
  }

  /// Allocates the next credit-note sequence value for the tenant.
  ///
  /// When no counter row exists yet the counter is seeded from the suffix
  /// of the most recent credit-note number, so numbering continues where
  /// pre-counter data left off. The ON CONFLICT arm covers the race where
  /// another transaction inserts the seed row first.
  async fn next_sequence(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
  ) -> Result<i64, BillingError> {
    let current: Option<i64> = sqlx::query_scalar(
      r#"
            SELECT last_value FROM credit_note_sequences
            WHERE tenant_id = $1
            FOR UPDATE
            "#,
    )
    .bind(tenant_id)
    .fetch_optional(&mut **tx)
    .await?;

    if current.is_some() {
      let next: i64 = sqlx::query_scalar(
        r#"
                UPDATE credit_note_sequences
                SET last_value = last_value + 1
                WHERE tenant_id = $1
                RETURNING last_value
                "#,
      )
      .bind(tenant_id)
      .fetch_one(&mut **tx)
      .await?;
      return Ok(next);
    }

    let latest_number: Option<String> = sqlx::query_scalar(
      r#"
            SELECT invoice_number FROM invoices
            WHERE tenant_id = $1 AND invoice_type = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
    )
    .bind(tenant_id)
    .bind(InvoiceType::CreditNote.as_str())
    .fetch_optional(&mut **tx)
    .await?;

    let seed = latest_number
      .and_then(|n| DocumentNumber::new(n).ok())
      .and_then(|n| n.sequence_suffix())
      .unwrap_or(0);

    let next: i64 = sqlx::query_scalar(
      r#"
            INSERT INTO credit_note_sequences (tenant_id, last_value)
            VALUES ($1, $2)
            ON CONFLICT (tenant_id)
            DO UPDATE SET last_value = credit_note_sequences.last_value + 1
            RETURNING last_value
            "#,
    )
    .bind(tenant_id)
    .bind(seed + 1)
    .fetch_one(&mut **tx)
    .await?;

    Ok(next)
  }

  async fn insert_invoice(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    invoice: &Invoice,
  ) -> Result<(), BillingError> {
    sqlx::query(
      r#"
            INSERT INTO invoices (
                id, tenant_id, customer_id, invoice_number, invoice_type, status,
                issue_date, due_date, currency, subtotal, tax_amount, discount,
                total_amount, paid_amount, balance_due, paid_at, notes,
                related_invoice_id, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21)
            "#,
    )
    .bind(invoice.id)
    .bind(invoice.tenant_id)
    .bind(invoice.customer_id)
    .bind(invoice.invoice_number.value())
    .bind(invoice.invoice_type.as_str())
    .bind(invoice.status.as_str())
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.currency.as_str())
    .bind(invoice.subtotal)
    .bind(invoice.tax_amount)
    .bind(invoice.discount)
    .bind(invoice.total_amount)
    .bind(invoice.paid_amount)
    .bind(invoice.balance_due)
    .bind(invoice.paid_at)
    .bind(invoice.notes.as_deref())
    .bind(invoice.related_invoice_id)
    .bind(invoice.created_by)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
  }

  async fn insert_line_item(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    line: &LineItem,
  ) -> Result<(), BillingError> {
    sqlx::query(
      r#"
            INSERT INTO invoice_line_items (
                id, invoice_id, description, quantity, unit_price, amount,
                currency, line_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
    )
    .bind(line.id)
    .bind(line.invoice_id)
    .bind(line.description.value())
    .bind(line.quantity.value())
    .bind(line.unit_price.amount)
    .bind(line.amount.amount)
    .bind(line.amount.currency.as_str())
    .bind(line.line_order)
    .execute(&mut **tx)
    .await?;

    Ok(())
  }

  async fn insert_payment(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
  ) -> Result<(), BillingError> {
    sqlx::query(
      r#"
            INSERT INTO payments (
                id, tenant_id, invoice_id, amount, currency, method,
                reference, notes, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
    )
    .bind(payment.id)
    .bind(payment.tenant_id)
    .bind(payment.invoice_id)
    .bind(payment.amount.amount)
    .bind(payment.amount.currency.as_str())
    .bind(payment.method.as_str())
    .bind(payment.reference.as_deref())
    .bind(payment.notes.as_deref())
    .bind(payment.created_by)
    .bind(payment.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
  }

  async fn update_original_invoice(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    invoice: &Invoice,
  ) -> Result<(), BillingError> {
    sqlx::query(
      r#"
            UPDATE invoices
            SET status = $3, paid_amount = $4, balance_due = $5,
                paid_at = $6, notes = $7, updated_at = $8
            WHERE tenant_id = $1 AND id = $2
            "#,
    )
    .bind(invoice.tenant_id)
    .bind(invoice.id)
    .bind(invoice.status.as_str())
    .bind(invoice.paid_amount)
    .bind(invoice.balance_due)
    .bind(invoice.paid_at)
    .bind(invoice.notes.as_deref())
    .bind(invoice.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
  }

  /// Banks a credit-balance refund on the customer's credit account,
  /// following the configured policy when no account exists.
  async fn bank_customer_credit(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    plan: &IssuancePlan,
    customer_id: Uuid,
  ) -> Result<Option<CustomerCredit>, BillingError> {
    let now = Utc::now();

    let updated = sqlx::query_as::<_, (Uuid, Uuid, rust_decimal::Decimal, chrono::DateTime<Utc>)>(
      r#"
            UPDATE customer_credits
            SET credit_available = credit_available + $3, updated_at = $4
            WHERE tenant_id = $1 AND customer_id = $2
            RETURNING tenant_id, customer_id, credit_available, updated_at
            "#,
    )
    .bind(plan.tenant_id)
    .bind(customer_id)
    .bind(plan.amount.amount)
    .bind(now)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some((tenant_id, customer_id, credit_available, updated_at)) = updated {
      return Ok(Some(CustomerCredit {
        tenant_id,
        customer_id,
        credit_available,
        updated_at,
      }));
    }

    match self.policy {
      MissingCreditAccountPolicy::Skip => {
        tracing::warn!(
          tenant_id = %plan.tenant_id,
          customer_id = %customer_id,
          amount = %plan.amount,
          "customer has no credit account, refund not banked"
        );
        Ok(None)
      }
      MissingCreditAccountPolicy::Create => {
        let mut credit = CustomerCredit::new(plan.tenant_id, customer_id, now);
        credit.add_credit(plan.amount.amount, now)?;

        sqlx::query(
          r#"
                    INSERT INTO customer_credits (tenant_id, customer_id, credit_available, updated_at)
                    VALUES ($1, $2, $3, $4)
                    "#,
        )
        .bind(credit.tenant_id)
        .bind(credit.customer_id)
        .bind(credit.credit_available)
        .bind(credit.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(Some(credit))
      }
      MissingCreditAccountPolicy::Reject => Err(BillingError::MissingCreditAccount(customer_id)),
    }
  }

  async fn run(&self, plan: IssuancePlan) -> Result<IssuanceOutcome, BillingError> {
    let mut tx = self.pool.begin().await?;
    let now = Utc::now();

    let mut original = self
      .lock_invoice(&mut tx, plan.tenant_id, plan.original_invoice_id)
      .await?;

    // Re-check under lock; a concurrent credit may have shrunk the paid
    // amount since the service's read.
    if plan.amount.amount > original.paid_amount {
      return Err(BillingError::CreditExceedsPaid {
        requested: plan.amount.amount,
        paid: original.paid_amount,
      });
    }

    let sequence = self.next_sequence(&mut tx, plan.tenant_id).await?;
    let number = DocumentNumber::credit_note(sequence);

    let credit_note = Invoice::credit_note(
      number.clone(),
      &original,
      plan.amount.clone(),
      &plan.reason,
      plan.refund_method,
      plan.refund_reference.as_deref(),
      plan.created_by,
      now,
    )?;
    original.apply_credit(plan.amount.amount, &number, now)?;

    let lines: Vec<LineItem> = plan
      .lines
      .iter()
      .enumerate()
      .map(|(index, line)| {
        LineItem::new(
          credit_note.id,
          line.description.clone(),
          line.quantity.clone(),
          line.unit_price.clone(),
          line.amount.clone(),
          index as i32 + 1,
        )
      })
      .collect();

    let refund = Payment::refund(
      plan.tenant_id,
      credit_note.id,
      plan.amount.clone(),
      plan.refund_method,
      plan.refund_reference.clone(),
      &plan.reason,
      plan.created_by,
      now,
    );

    self.insert_invoice(&mut tx, &credit_note).await?;
    for line in &lines {
      self.insert_line_item(&mut tx, line).await?;
    }
    self.insert_payment(&mut tx, &refund).await?;
    self.update_original_invoice(&mut tx, &original).await?;

    let customer_credit = if plan.refund_method == PaymentMethod::CreditBalance {
      self
        .bank_customer_credit(&mut tx, &plan, original.customer_id)
        .await?
    } else {
      None
    };

    tx.commit().await?;

    Ok(IssuanceOutcome {
      credit_note,
      credit_note_lines: lines,
      refund,
      original_invoice: original,
      customer_credit,
    })
  }
}

#[async_trait]
impl SettlementUnitOfWork for PostgresSettlementUnitOfWork {
  async fn commit_issuance(&self, plan: IssuancePlan) -> Result<IssuanceOutcome, BillingError> {
    match self.run(plan).await {
      Err(BillingError::Database(err)) if is_conflict(&err) => {
        Err(BillingError::Conflict(err.to_string()))
      }
      other => other,
    }
  }
}

fn is_conflict(err: &sqlx::Error) -> bool {
  if let sqlx::Error::Database(db_err) = err {
    if let Some(code) = db_err.code() {
      return CONFLICT_CODES.contains(&code.as_ref());
    }
  }
  false
}
