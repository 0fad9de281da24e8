use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::entities::{Customer, CustomerCredit, Invoice, LineItem, Payment};
use super::errors::BillingError;
use super::ports::{
  CreditLine, CustomerRepository, InvoiceRepository, IssuancePlan, IssuanceOutcome,
  SettlementUnitOfWork,
};
use super::value_objects::{
  CreditReason, LineItemDescription, Money, PaymentMethod, Quantity, ValueObjectError,
};

/// One requested credit-note line, before the invoice currency is known.
#[derive(Debug, Clone)]
pub struct CreditLineData {
  pub description: LineItemDescription,
  pub quantity: Quantity,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

/// Validated credit-note request.
#[derive(Debug, Clone)]
pub struct CreditNoteRequest {
  pub amount: Decimal,
  pub reason: CreditReason,
  pub line_items: Option<Vec<CreditLineData>>,
  pub refund_method: PaymentMethod,
  pub refund_reference: Option<String>,
}

/// Full result of a successful issuance, ready for response assembly.
#[derive(Debug, Clone)]
pub struct CreditNoteIssuance {
  pub credit_note: Invoice,
  pub credit_note_lines: Vec<LineItem>,
  pub refund: Payment,
  pub original_invoice: Invoice,
  pub original_payments: Vec<Payment>,
  pub customer: Customer,
  pub customer_credit: Option<CustomerCredit>,
}

/// An invoice with its read-side context.
#[derive(Debug, Clone)]
pub struct InvoiceDetails {
  pub invoice: Invoice,
  pub customer: Customer,
  pub line_items: Vec<LineItem>,
  pub payments: Vec<Payment>,
}

pub struct CreditNoteService {
  invoice_repo: Arc<dyn InvoiceRepository>,
  customer_repo: Arc<dyn CustomerRepository>,
  settlement: Arc<dyn SettlementUnitOfWork>,
}

impl CreditNoteService {
  pub fn new(
    invoice_repo: Arc<dyn InvoiceRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    settlement: Arc<dyn SettlementUnitOfWork>,
  ) -> Self {
    Self {
      invoice_repo,
      customer_repo,
      settlement,
    }
  }

  /// Issues a credit note of `request.amount` against an invoice.
  ///
  /// Validation happens before any write: the invoice must exist for the
  /// tenant, the amount must be positive and must not exceed what was
  /// actually paid. The writes themselves are committed atomically by the
  /// settlement unit of work; a transient storage conflict (numbering or
  /// row-lock collision) is retried once before being surfaced.
  ///
  /// Issuance is intentionally not idempotent: repeating a call produces a
  /// second credit note with the next number and a second refund.
  pub async fn issue_credit_note(
    &self,
    tenant_id: Uuid,
    user_id: Uuid,
    invoice_id: Uuid,
    request: CreditNoteRequest,
  ) -> Result<CreditNoteIssuance, BillingError> {
    if request.amount <= Decimal::ZERO {
      return Err(BillingError::Validation(ValueObjectError::InvalidAmount(
        "Credit amount must be greater than zero".to_string(),
      )));
    }

    let invoice = self
      .invoice_repo
      .find_by_id(tenant_id, invoice_id)
      .await?
      .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

    if request.amount > invoice.paid_amount {
      return Err(BillingError::CreditExceedsPaid {
        requested: request.amount,
        paid: invoice.paid_amount,
      });
    }

    let amount = Money::new(request.amount, invoice.currency)?;

    // Explicit lines when given, otherwise a single synthetic line built
    // from the reason and the credited amount.
    let lines = match request.line_items {
      Some(items) if !items.is_empty() => items
        .into_iter()
        .map(|item| {
          Ok(CreditLine {
            description: item.description,
            quantity: item.quantity,
            unit_price: Money::new(item.unit_price, invoice.currency)?,
            amount: Money::new(item.amount, invoice.currency)?,
          })
        })
        .collect::<Result<Vec<_>, BillingError>>()?,
      _ => vec![CreditLine {
        description: LineItemDescription::new(request.reason.value().to_string())?,
        quantity: Quantity::one(),
        unit_price: amount.clone(),
        amount: amount.clone(),
      }],
    };

    let plan = IssuancePlan {
      tenant_id,
      created_by: user_id,
      original_invoice_id: invoice.id,
      amount,
      reason: request.reason,
      refund_method: request.refund_method,
      refund_reference: request.refund_reference,
      lines,
    };

    let outcome = self.commit_with_retry(plan).await?;

    let customer = self
      .customer_repo
      .find_by_id(tenant_id, outcome.original_invoice.customer_id)
      .await?
      .ok_or(BillingError::CustomerNotFound(
        outcome.original_invoice.customer_id,
      ))?;
    let original_payments = self.invoice_repo.find_payments(tenant_id, invoice_id).await?;

    tracing::info!(
      tenant_id = %tenant_id,
      invoice = %outcome.original_invoice.invoice_number,
      credit_note = %outcome.credit_note.invoice_number,
      amount = %outcome.refund.amount,
      method = outcome.refund.method.as_str(),
      "credit note issued"
    );

    Ok(CreditNoteIssuance {
      credit_note: outcome.credit_note,
      credit_note_lines: outcome.credit_note_lines,
      refund: outcome.refund,
      original_invoice: outcome.original_invoice,
      original_payments,
      customer,
      customer_credit: outcome.customer_credit,
    })
  }

  async fn commit_with_retry(
    &self,
    plan: IssuancePlan,
  ) -> Result<IssuanceOutcome, BillingError> {
    match self.settlement.commit_issuance(plan.clone()).await {
      Err(err) if err.is_transient_conflict() => {
        tracing::warn!(
          tenant_id = %plan.tenant_id,
          invoice_id = %plan.original_invoice_id,
          error = %err,
          "issuance conflict, retrying once"
        );
        self.settlement.commit_issuance(plan).await
      }
      other => other,
    }
  }

  /// Fetches an invoice with its customer summary, line items and full
  /// payment history.
  pub async fn get_invoice(
    &self,
    tenant_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<InvoiceDetails, BillingError> {
    let invoice = self
      .invoice_repo
      .find_by_id(tenant_id, invoice_id)
      .await?
      .ok_or(BillingError::InvoiceNotFound(invoice_id))?;

    let customer = self
      .customer_repo
      .find_by_id(tenant_id, invoice.customer_id)
      .await?
      .ok_or(BillingError::CustomerNotFound(invoice.customer_id))?;

    let line_items = self.invoice_repo.find_line_items(invoice_id).await?;
    let payments = self.invoice_repo.find_payments(tenant_id, invoice_id).await?;

    Ok(InvoiceDetails {
      invoice,
      customer,
      line_items,
      payments,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::billing::ports::MissingCreditAccountPolicy;
  use crate::domain::billing::value_objects::{Currency, DocumentNumber, InvoiceStatus, InvoiceType};
  use async_trait::async_trait;
  use chrono::Utc;
  use rust_decimal_macros::dec;
  use std::collections::HashMap;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Default)]
  struct StoreState {
    invoices: HashMap<Uuid, Invoice>,
    line_items: Vec<LineItem>,
    payments: Vec<Payment>,
    customers: HashMap<Uuid, Customer>,
    credits: HashMap<Uuid, CustomerCredit>,
    sequences: HashMap<Uuid, i64>,
  }

  /// In-memory stand-in for the Postgres adapters. The mutex plays the role
  /// of the database transaction: every issuance recomputes against current
  /// state and commits all writes while holding the lock, or none at all.
  struct InMemoryStore {
    state: Mutex<StoreState>,
    policy: MissingCreditAccountPolicy,
    conflicts_to_inject: AtomicUsize,
  }

  impl InMemoryStore {
    fn new(policy: MissingCreditAccountPolicy) -> Self {
      Self {
        state: Mutex::new(StoreState::default()),
        policy,
        conflicts_to_inject: AtomicUsize::new(0),
      }
    }
  }

  #[async_trait]
  impl InvoiceRepository for InMemoryStore {
    async fn find_by_id(
      &self,
      tenant_id: Uuid,
      id: Uuid,
    ) -> Result<Option<Invoice>, BillingError> {
      let state = self.state.lock().unwrap();
      Ok(
        state
          .invoices
          .get(&id)
          .filter(|invoice| invoice.tenant_id == tenant_id)
          .cloned(),
      )
    }

    async fn find_line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, BillingError> {
      let state = self.state.lock().unwrap();
      Ok(
        state
          .line_items
          .iter()
          .filter(|item| item.invoice_id == invoice_id)
          .cloned()
          .collect(),
      )
    }

    async fn find_payments(
      &self,
      tenant_id: Uuid,
      invoice_id: Uuid,
    ) -> Result<Vec<Payment>, BillingError> {
      let state = self.state.lock().unwrap();
      Ok(
        state
          .payments
          .iter()
          .filter(|payment| payment.tenant_id == tenant_id && payment.invoice_id == invoice_id)
          .cloned()
          .collect(),
      )
    }
  }

  #[async_trait]
  impl CustomerRepository for InMemoryStore {
    async fn find_by_id(
      &self,
      tenant_id: Uuid,
      id: Uuid,
    ) -> Result<Option<Customer>, BillingError> {
      let state = self.state.lock().unwrap();
      Ok(
        state
          .customers
          .get(&id)
          .filter(|customer| customer.tenant_id == tenant_id)
          .cloned(),
      )
    }
  }

  #[async_trait]
  impl SettlementUnitOfWork for InMemoryStore {
    async fn commit_issuance(&self, plan: IssuancePlan) -> Result<IssuanceOutcome, BillingError> {
      if self
        .conflicts_to_inject
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
      {
        return Err(BillingError::Conflict(
          "simulated serialization failure".to_string(),
        ));
      }

      let mut state = self.state.lock().unwrap();
      let now = Utc::now();

      let mut original = state
        .invoices
        .get(&plan.original_invoice_id)
        .filter(|invoice| invoice.tenant_id == plan.tenant_id)
        .cloned()
        .ok_or(BillingError::InvoiceNotFound(plan.original_invoice_id))?;

      let next = state.sequences.get(&plan.tenant_id).copied().unwrap_or(0) + 1;
      let number = DocumentNumber::credit_note(next);

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
      let lines: Vec<LineItem> = plan
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
          LineItem::new(
            credit_note.id,
            line.description.clone(),
            line.quantity.clone(),
            line.unit_price.clone(),
            line.amount.clone(),
            (i + 1) as i32,
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

      original.apply_credit(plan.amount.amount, &number, now)?;

      let customer_credit = if plan.refund_method == PaymentMethod::CreditBalance {
        match state.credits.get(&original.customer_id).cloned() {
          Some(mut credit) => {
            credit.add_credit(plan.amount.amount, now)?;
            Some(credit)
          }
          None => match self.policy {
            MissingCreditAccountPolicy::Skip => None,
            MissingCreditAccountPolicy::Create => {
              let mut credit =
                CustomerCredit::new(plan.tenant_id, original.customer_id, now);
              credit.add_credit(plan.amount.amount, now)?;
              Some(credit)
            }
            MissingCreditAccountPolicy::Reject => {
              return Err(BillingError::MissingCreditAccount(original.customer_id));
            }
          },
        }
      } else {
        None
      };

      // Commit point: everything validated, apply all writes together.
      state.sequences.insert(plan.tenant_id, next);
      state.invoices.insert(credit_note.id, credit_note.clone());
      state.line_items.extend(lines.clone());
      state.payments.push(refund.clone());
      state.invoices.insert(original.id, original.clone());
      if let Some(credit) = &customer_credit {
        state.credits.insert(credit.customer_id, credit.clone());
      }

      Ok(IssuanceOutcome {
        credit_note,
        credit_note_lines: lines,
        refund,
        original_invoice: original,
        customer_credit,
      })
    }
  }

  struct Fixture {
    store: Arc<InMemoryStore>,
    service: CreditNoteService,
    tenant_id: Uuid,
    user_id: Uuid,
    invoice_id: Uuid,
    customer_id: Uuid,
  }

  fn fixture(policy: MissingCreditAccountPolicy) -> Fixture {
    let store = Arc::new(InMemoryStore::new(policy));
    let tenant_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let customer_id = Uuid::new_v4();
    let now = Utc::now();

    let invoice = Invoice {
      id: Uuid::new_v4(),
      tenant_id,
      customer_id,
      invoice_number: DocumentNumber::new("INV-0001".to_string()).unwrap(),
      invoice_type: InvoiceType::Standard,
      status: InvoiceStatus::Paid,
      issue_date: now,
      due_date: now,
      currency: Currency::AED,
      subtotal: dec!(1000),
      tax_amount: dec!(0),
      discount: dec!(0),
      total_amount: dec!(1000),
      paid_amount: dec!(1000),
      balance_due: dec!(0),
      paid_at: Some(now),
      notes: None,
      related_invoice_id: None,
      created_by: user_id,
      created_at: now,
      updated_at: now,
    };
    let invoice_id = invoice.id;

    let customer = Customer {
      id: customer_id,
      tenant_id,
      name: "Al Noor Perfumes LLC".to_string(),
      email: Some("accounts@alnoor.example".to_string()),
      phone: None,
    };

    {
      let mut state = store.state.lock().unwrap();
      state.invoices.insert(invoice.id, invoice);
      state.customers.insert(customer.id, customer);
    }

    let service = CreditNoteService::new(store.clone(), store.clone(), store.clone());
    Fixture {
      store,
      service,
      tenant_id,
      user_id,
      invoice_id,
      customer_id,
    }
  }

  fn request(amount: Decimal, method: PaymentMethod) -> CreditNoteRequest {
    CreditNoteRequest {
      amount,
      reason: CreditReason::new("Customer return".to_string()).unwrap(),
      line_items: None,
      refund_method: method,
      refund_reference: None,
    }
  }

  #[tokio::test]
  async fn full_cash_refund_reopens_the_invoice() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let issuance = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(1000), PaymentMethod::Cash),
      )
      .await
      .unwrap();

    assert_eq!(issuance.credit_note.invoice_number.value(), "CN-0001");
    assert_eq!(issuance.credit_note.total_amount, dec!(1000));
    assert_eq!(issuance.credit_note.paid_amount, dec!(1000));
    assert_eq!(issuance.credit_note.balance_due, dec!(0));

    assert_eq!(issuance.original_invoice.paid_amount, dec!(0));
    assert_eq!(issuance.original_invoice.balance_due, dec!(1000));
    assert_eq!(issuance.original_invoice.status, InvoiceStatus::Sent);
    assert_eq!(issuance.original_invoice.paid_at, None);

    assert_eq!(issuance.refund.method, PaymentMethod::Cash);
    assert!(issuance.customer_credit.is_none());
    assert_eq!(issuance.customer.name, "Al Noor Perfumes LLC");
  }

  #[tokio::test]
  async fn partial_credit_balance_refund_tops_up_the_customer() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);
    {
      let mut state = fx.store.state.lock().unwrap();
      let mut credit = CustomerCredit::new(fx.tenant_id, fx.customer_id, Utc::now());
      credit.add_credit(dec!(50), Utc::now()).unwrap();
      state.credits.insert(fx.customer_id, credit);
    }

    let issuance = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(400), PaymentMethod::CreditBalance),
      )
      .await
      .unwrap();

    assert_eq!(issuance.original_invoice.paid_amount, dec!(600));
    assert_eq!(issuance.original_invoice.balance_due, dec!(400));
    assert_eq!(
      issuance.original_invoice.status,
      InvoiceStatus::PartiallyPaid
    );
    assert_eq!(
      issuance.customer_credit.unwrap().credit_available,
      dec!(450)
    );
  }

  #[tokio::test]
  async fn credit_exceeding_paid_amount_writes_nothing() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let err = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(1500), PaymentMethod::Cash),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, BillingError::CreditExceedsPaid { .. }));
    let state = fx.store.state.lock().unwrap();
    assert_eq!(state.invoices.len(), 1);
    assert!(state.payments.is_empty());
    assert_eq!(state.invoices[&fx.invoice_id].paid_amount, dec!(1000));
  }

  #[tokio::test]
  async fn unknown_invoice_is_not_found() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let err = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        Uuid::new_v4(),
        request(dec!(100), PaymentMethod::Cash),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, BillingError::InvoiceNotFound(_)));
  }

  #[tokio::test]
  async fn invoice_of_another_tenant_is_not_found() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let err = fx
      .service
      .issue_credit_note(
        Uuid::new_v4(),
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::Cash),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, BillingError::InvoiceNotFound(_)));
  }

  #[tokio::test]
  async fn non_positive_amount_is_rejected_before_any_read() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let err = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(0), PaymentMethod::Cash),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, BillingError::Validation(_)));
  }

  #[tokio::test]
  async fn omitted_line_items_synthesize_one_from_the_reason() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let issuance = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(250), PaymentMethod::Cash),
      )
      .await
      .unwrap();

    assert_eq!(issuance.credit_note_lines.len(), 1);
    let line = &issuance.credit_note_lines[0];
    assert_eq!(line.description.value(), "Customer return");
    assert_eq!(line.quantity.value(), dec!(1));
    assert_eq!(line.unit_price.amount, dec!(250));
    assert_eq!(line.amount.amount, dec!(250));
  }

  #[tokio::test]
  async fn explicit_line_items_are_preserved_in_order() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);
    let mut req = request(dec!(300), PaymentMethod::Cash);
    req.line_items = Some(vec![
      CreditLineData {
        description: LineItemDescription::new("Oud oil 12ml".to_string()).unwrap(),
        quantity: Quantity::new(dec!(2)).unwrap(),
        unit_price: dec!(100),
        amount: dec!(200),
      },
      CreditLineData {
        description: LineItemDescription::new("Gift wrap".to_string()).unwrap(),
        quantity: Quantity::one(),
        unit_price: dec!(100),
        amount: dec!(100),
      },
    ]);

    let issuance = fx
      .service
      .issue_credit_note(fx.tenant_id, fx.user_id, fx.invoice_id, req)
      .await
      .unwrap();

    assert_eq!(issuance.credit_note_lines.len(), 2);
    assert_eq!(issuance.credit_note_lines[0].line_order, 1);
    assert_eq!(issuance.credit_note_lines[0].description.value(), "Oud oil 12ml");
    assert_eq!(issuance.credit_note_lines[1].line_order, 2);
  }

  #[tokio::test]
  async fn issuance_is_not_idempotent_and_numbers_are_monotonic() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let first = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::Cash),
      )
      .await
      .unwrap();
    let second = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::Cash),
      )
      .await
      .unwrap();

    assert_eq!(first.credit_note.invoice_number.value(), "CN-0001");
    assert_eq!(second.credit_note.invoice_number.value(), "CN-0002");
    assert_ne!(first.credit_note.id, second.credit_note.id);
    // Two identical calls decrement twice
    assert_eq!(second.original_invoice.paid_amount, dec!(800));
  }

  #[tokio::test]
  async fn transient_conflict_is_retried_once() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);
    fx.store.conflicts_to_inject.store(1, Ordering::SeqCst);

    let issuance = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::Cash),
      )
      .await
      .unwrap();

    assert_eq!(issuance.credit_note.invoice_number.value(), "CN-0001");
  }

  #[tokio::test]
  async fn persistent_conflict_surfaces_after_one_retry() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);
    fx.store.conflicts_to_inject.store(2, Ordering::SeqCst);

    let err = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::Cash),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, BillingError::Conflict(_)));
  }

  #[tokio::test]
  async fn missing_credit_account_is_skipped_by_default() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);

    let issuance = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::CreditBalance),
      )
      .await
      .unwrap();

    // Issuance succeeds, nothing is banked anywhere
    assert!(issuance.customer_credit.is_none());
    let state = fx.store.state.lock().unwrap();
    assert!(state.credits.is_empty());
  }

  #[tokio::test]
  async fn missing_credit_account_can_be_created() {
    let fx = fixture(MissingCreditAccountPolicy::Create);

    let issuance = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::CreditBalance),
      )
      .await
      .unwrap();

    assert_eq!(
      issuance.customer_credit.unwrap().credit_available,
      dec!(100)
    );
  }

  #[tokio::test]
  async fn missing_credit_account_can_reject_the_issuance() {
    let fx = fixture(MissingCreditAccountPolicy::Reject);

    let err = fx
      .service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::CreditBalance),
      )
      .await
      .unwrap_err();

    assert!(matches!(err, BillingError::MissingCreditAccount(_)));
    let state = fx.store.state.lock().unwrap();
    assert_eq!(state.invoices.len(), 1);
    assert!(state.payments.is_empty());
  }

  #[tokio::test]
  async fn get_invoice_returns_payment_history() {
    let fx = fixture(MissingCreditAccountPolicy::Skip);
    fx.service
      .issue_credit_note(
        fx.tenant_id,
        fx.user_id,
        fx.invoice_id,
        request(dec!(100), PaymentMethod::Cash),
      )
      .await
      .unwrap();

    let details = fx
      .service
      .get_invoice(fx.tenant_id, fx.invoice_id)
      .await
      .unwrap();

    assert_eq!(details.invoice.paid_amount, dec!(900));
    assert_eq!(details.customer.id, fx.customer_id);
    // The refund payment hangs off the credit note, not the original
    assert!(details.payments.is_empty());

    let err = fx
      .service
      .get_invoice(fx.tenant_id, Uuid::new_v4())
      .await
      .unwrap_err();
    assert!(matches!(err, BillingError::InvoiceNotFound(_)));
  }
}
