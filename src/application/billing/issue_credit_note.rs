use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::billing::{
  BillingError, CreditLineData, CreditNoteRequest, CreditNoteService, CreditReason,
  LineItemDescription, PaymentMethod, Quantity,
};

use super::views::{CustomerCreditDto, InvoiceDto};

#[derive(Debug, Deserialize)]
pub struct CreditNoteLineDto {
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct IssueCreditNoteCommand {
  pub tenant_id: Uuid,
  pub user_id: Uuid,
  pub invoice_id: Uuid,
  pub amount: Decimal,
  pub reason: String,
  pub line_items: Option<Vec<CreditNoteLineDto>>,
  pub refund_method: Option<String>,
  pub refund_reference: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreditNoteResponse {
  pub message: String,
  pub credit_note: InvoiceDto,
  pub original_invoice: InvoiceDto,
  pub refund_method: String,
  pub refund_amount: Decimal,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub customer_credit: Option<CustomerCreditDto>,
}

pub struct IssueCreditNoteUseCase {
  credit_note_service: Arc<CreditNoteService>,
}

impl IssueCreditNoteUseCase {
  pub fn new(credit_note_service: Arc<CreditNoteService>) -> Self {
    Self {
      credit_note_service,
    }
  }

  pub async fn execute(
    &self,
    command: IssueCreditNoteCommand,
  ) -> Result<IssueCreditNoteResponse, BillingError> {
    let reason = CreditReason::new(command.reason)?;
    let refund_method = match command.refund_method.as_deref() {
      Some(value) => PaymentMethod::from_str(value)?,
      None => PaymentMethod::default(),
    };

    let line_items = command
      .line_items
      .map(|items| {
        items
          .into_iter()
          .map(|item| {
            Ok(CreditLineData {
              description: LineItemDescription::new(item.description)?,
              quantity: Quantity::new(item.quantity)?,
              unit_price: item.unit_price,
              amount: item.amount,
            })
          })
          .collect::<Result<Vec<_>, BillingError>>()
      })
      .transpose()?;

    let request = CreditNoteRequest {
      amount: command.amount,
      reason,
      line_items,
      refund_method,
      refund_reference: command.refund_reference,
    };

    let issuance = self
      .credit_note_service
      .issue_credit_note(
        command.tenant_id,
        command.user_id,
        command.invoice_id,
        request,
      )
      .await?;

    Ok(IssueCreditNoteResponse {
      message: format!(
        "Credit note {} issued against invoice {}",
        issuance.credit_note.invoice_number, issuance.original_invoice.invoice_number
      ),
      credit_note: InvoiceDto::from_parts(
        &issuance.credit_note,
        Some(&issuance.customer),
        &issuance.credit_note_lines,
        std::slice::from_ref(&issuance.refund),
      ),
      original_invoice: InvoiceDto::from_parts(
        &issuance.original_invoice,
        Some(&issuance.customer),
        &[],
        &issuance.original_payments,
      ),
      refund_method: issuance.refund.method.as_str().to_string(),
      refund_amount: issuance.refund.amount.amount,
      customer_credit: issuance.customer_credit.as_ref().map(CustomerCreditDto::from),
    })
  }
}
