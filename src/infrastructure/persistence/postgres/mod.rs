pub mod customer_repository;
pub mod invoice_repository;
pub mod settlement;

pub use customer_repository::PostgresCustomerRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use settlement::PostgresSettlementUnitOfWork;
