//! Sales invoicing domain.
//!
//! Builds invoice records and their totals. Stock depletion for sold lines is
//! driven by the infrastructure layer's sale orchestrator, inside the same unit
//! of work that stores the invoice.

pub mod invoice;

pub use invoice::{CreateInvoice, Customer, Invoice, InvoiceLine, InvoiceTotals};
