use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
  adapters::http::{
    dtos::IssueCreditNoteRequest,
    errors::ApiError,
    middleware::context::{RequestContext, RequestContextExt},
  },
  application::billing::{
    CreditNoteLineDto, GetInvoiceCommand, GetInvoiceUseCase, IssueCreditNoteCommand,
    IssueCreditNoteUseCase,
  },
};

fn get_context(req: &HttpRequest) -> Result<RequestContext, ApiError> {
  req.request_context().ok_or_else(|| {
    ApiError::Internal("Request context missing - RequestContextMiddleware not applied".to_string())
  })
}

/// Issue a credit note against an invoice
/// POST /api/v1/invoices/:invoice_id/credit-note
pub async fn issue_credit_note_handler(
  invoice_id: web::Path<Uuid>,
  request: web::Json<IssueCreditNoteRequest>,
  use_case: web::Data<Arc<IssueCreditNoteUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let context = get_context(&http_req)?;
  let request = request.into_inner();

  let command = IssueCreditNoteCommand {
    tenant_id: context.tenant_id,
    user_id: context.user_id,
    invoice_id: *invoice_id,
    amount: request.amount,
    reason: request.reason,
    line_items: request.line_items.map(|items| {
      items
        .into_iter()
        .map(|item| CreditNoteLineDto {
          description: item.description,
          quantity: item.quantity,
          unit_price: item.unit_price,
          amount: item.amount,
        })
        .collect()
    }),
    refund_method: request.refund_method,
    refund_reference: request.refund_reference,
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Created().json(response))
}

/// Get invoice details with line items and payment history
/// GET /api/v1/invoices/:invoice_id
pub async fn get_invoice_handler(
  invoice_id: web::Path<Uuid>,
  use_case: web::Data<Arc<GetInvoiceUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let context = get_context(&http_req)?;

  let command = GetInvoiceCommand {
    tenant_id: context.tenant_id,
    invoice_id: *invoice_id,
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Ok().json(response))
}
