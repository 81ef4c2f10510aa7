//! `stockpilot-auth`: role-based authorization boundary.
//!
//! Roles are a closed set and map to permissions through a fixed capability
//! matrix. Authentication (session/token issuance) happens elsewhere; this crate
//! only answers "may this principal perform this operation?".

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize, ensure_active};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
