pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{Customer, CustomerCredit, Invoice, LineItem, Payment};
pub use errors::BillingError;
pub use ports::{
  CreditLine, CustomerRepository, InvoiceRepository, IssuanceOutcome, IssuancePlan,
  MissingCreditAccountPolicy, SettlementUnitOfWork,
};
pub use services::{
  CreditLineData, CreditNoteIssuance, CreditNoteRequest, CreditNoteService, InvoiceDetails,
};
pub use value_objects::{
  CreditReason, Currency, DocumentNumber, InvoiceStatus, InvoiceType, LineItemDescription, Money,
  PaymentMethod, Quantity, ValueObjectError,
};
