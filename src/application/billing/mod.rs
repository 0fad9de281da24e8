pub mod get_invoice;
pub mod issue_credit_note;
pub mod views;

pub use get_invoice::{GetInvoiceCommand, GetInvoiceUseCase, InvoiceDetailsResponse};
pub use issue_credit_note::{
  CreditNoteLineDto, IssueCreditNoteCommand, IssueCreditNoteResponse, IssueCreditNoteUseCase,
};
pub use views::{CustomerCreditDto, CustomerSummaryDto, InvoiceDto, LineItemDto, PaymentDto};
