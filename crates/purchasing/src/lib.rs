//! Purchasing domain: purchase orders and their one-way receipt transition.

pub mod purchase;

pub use purchase::{CreatePurchase, Purchase, PurchaseLine, PurchaseStatus};
