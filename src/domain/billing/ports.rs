use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::entities::{Customer, CustomerCredit, Invoice, LineItem, Payment};
use super::errors::BillingError;
use super::value_objects::{
  CreditReason, LineItemDescription, Money, PaymentMethod, Quantity,
};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
  async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Invoice>, BillingError>;
  async fn find_line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, BillingError>;
  async fn find_payments(
    &self,
    tenant_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<Vec<Payment>, BillingError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
  async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Customer>, BillingError>;
}

/// Behavior when a credit-balance refund targets a customer without a
/// credit account. `Skip` preserves the legacy observable behavior (the
/// refund is not banked anywhere and a warning is logged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingCreditAccountPolicy {
  Skip,
  Create,
  Reject,
}

impl Default for MissingCreditAccountPolicy {
  fn default() -> Self {
    MissingCreditAccountPolicy::Skip
  }
}

/// One validated line of a credit note.
#[derive(Debug, Clone)]
pub struct CreditLine {
  pub description: LineItemDescription,
  pub quantity: Quantity,
  pub unit_price: Money,
  pub amount: Money,
}

/// Everything the storage layer needs to persist one issuance.
///
/// The plan deliberately carries no document number and no recomputed
/// invoice fields: both depend on state that must be read under lock
/// inside the transaction.
#[derive(Debug, Clone)]
pub struct IssuancePlan {
  pub tenant_id: Uuid,
  pub created_by: Uuid,
  pub original_invoice_id: Uuid,
  pub amount: Money,
  pub reason: CreditReason,
  pub refund_method: PaymentMethod,
  pub refund_reference: Option<String>,
  pub lines: Vec<CreditLine>,
}

/// State persisted by a committed issuance.
#[derive(Debug, Clone)]
pub struct IssuanceOutcome {
  pub credit_note: Invoice,
  pub credit_note_lines: Vec<LineItem>,
  pub refund: Payment,
  pub original_invoice: Invoice,
  pub customer_credit: Option<CustomerCredit>,
}

/// Transactional boundary around the writes of one credit-note issuance.
///
/// An implementation must apply the whole plan atomically: allocate the
/// next per-tenant credit-note number, insert the credit note and its
/// refund payment, update the original invoice, and (for credit-balance
/// refunds) top up the customer credit account. Either all of it commits
/// or none of it does. Concurrent issuances for the same tenant or the
/// same invoice must be serialized by the implementation; transient
/// collisions surface as [`BillingError::Conflict`].
#[async_trait]
pub trait SettlementUnitOfWork: Send + Sync {
  async fn commit_issuance(&self, plan: IssuancePlan) -> Result<IssuanceOutcome, BillingError>;
}
