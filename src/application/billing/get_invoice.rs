use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::billing::{BillingError, CreditNoteService};

use super::views::InvoiceDto;

#[derive(Debug, Deserialize)]
pub struct GetInvoiceCommand {
  pub tenant_id: Uuid,
  pub invoice_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailsResponse {
  pub invoice: InvoiceDto,
}

pub struct GetInvoiceUseCase {
  credit_note_service: Arc<CreditNoteService>,
}

impl GetInvoiceUseCase {
  pub fn new(credit_note_service: Arc<CreditNoteService>) -> Self {
    Self {
      credit_note_service,
    }
  }

  pub async fn execute(
    &self,
    command: GetInvoiceCommand,
  ) -> Result<InvoiceDetailsResponse, BillingError> {
    let details = self
      .credit_note_service
      .get_invoice(command.tenant_id, command.invoice_id)
      .await?;

    Ok(InvoiceDetailsResponse {
      invoice: InvoiceDto::from_parts(
        &details.invoice,
        Some(&details.customer),
        &details.line_items,
        &details.payments,
      ),
    })
  }
}
