use actix_web::web;
use std::sync::Arc;

use crate::application::billing::{GetInvoiceUseCase, IssueCreditNoteUseCase};

use super::handlers::invoices::{get_invoice_handler, issue_credit_note_handler};

/// Configure invoice routes
///
/// Mounts all invoice-related endpoints under the provided scope.
/// All routes are prefixed with the scope path (e.g., /api/v1/invoices).
///
/// # Routes
///
/// - GET /:invoice_id - Get invoice details with line items and payments
/// - POST /:invoice_id/credit-note - Issue a credit note against an invoice
///
/// # Example
///
/// ```no_run
/// use actix_web::{App, web};
/// use std::sync::Arc;
/// # use attar_billing::application::billing::*;
/// # use attar_billing::adapters::http::routes::configure_invoice_routes;
///
/// # async fn example(
/// #   issue_use_case: Arc<IssueCreditNoteUseCase>,
/// #   get_use_case: Arc<GetInvoiceUseCase>,
/// # ) {
/// let app = App::new().service(
///   web::scope("/api/v1/invoices")
///     .configure(|cfg| configure_invoice_routes(cfg, issue_use_case, get_use_case)),
/// );
/// # }
/// ```
pub fn configure_invoice_routes(
  cfg: &mut web::ServiceConfig,
  issue_use_case: Arc<IssueCreditNoteUseCase>,
  get_use_case: Arc<GetInvoiceUseCase>,
) {
  // Store use cases in app data so handlers can access them
  cfg
    .app_data(web::Data::new(issue_use_case))
    .app_data(web::Data::new(get_use_case))
    .route("/{invoice_id}", web::get().to(get_invoice_handler))
    .route(
      "/{invoice_id}/credit-note",
      web::post().to(issue_credit_note_handler),
    );
}
