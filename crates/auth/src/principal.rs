use serde::{Deserialize, Serialize};

use stockpilot_core::UserId;

use crate::Role;

/// An authenticated actor, as resolved by the (external) session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    /// Deactivated accounts keep their role but are denied everything.
    pub active: bool,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            active: true,
        }
    }
}
