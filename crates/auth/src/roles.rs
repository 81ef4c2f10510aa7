use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role assigned to a user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Manager,
    Staff,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Owner, Role::Manager, Role::Staff];

    /// Capability matrix: the permissions granted to this role.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;

        match self {
            Role::Owner | Role::Manager => &Permission::ALL,
            Role::Staff => &[
                CreateInvoice,
                ViewInvoices,
                CreatePurchase,
                ViewPurchases,
                ViewLowStock,
                ManageProducts,
            ],
        }
    }

    pub fn allows(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = stockpilot_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(stockpilot_core::DomainError::validation(format!(
                "unknown role '{other}' (expected owner, manager or staff)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_manager_hold_every_permission() {
        for p in Permission::ALL {
            assert!(Role::Owner.allows(p), "owner lacks {p}");
            assert!(Role::Manager.allows(p), "manager lacks {p}");
        }
    }

    #[test]
    fn staff_cannot_receive_cancel_or_adjust() {
        assert!(!Role::Staff.allows(Permission::ReceivePurchase));
        assert!(!Role::Staff.allows(Permission::CancelPurchase));
        assert!(!Role::Staff.allows(Permission::AdjustStock));
        assert!(Role::Staff.allows(Permission::CreateInvoice));
    }

    #[test]
    fn parses_case_insensitively_and_rejects_unknown() {
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), "\"staff\"");
    }
}
