//! Application layer
//!
//! This layer contains use cases that orchestrate domain logic to implement
//! application-specific workflows. Use cases translate transport-level input
//! into domain types, invoke the domain services and shape the responses.

pub mod billing;
