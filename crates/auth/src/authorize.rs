use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("account is deactivated")]
    Inactive,

    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden { role: Role, permission: Permission },
}

/// Reject deactivated accounts. Reads open to every role only need this.
pub fn ensure_active(principal: &Principal) -> Result<(), AuthzError> {
    if principal.active {
        Ok(())
    } else {
        Err(AuthzError::Inactive)
    }
}

/// Authorize a principal for one operation.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check against the role's capability matrix)
pub fn authorize(principal: &Principal, required: Permission) -> Result<(), AuthzError> {
    ensure_active(principal)?;

    if principal.role.allows(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            permission: required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpilot_core::UserId;

    #[test]
    fn staff_may_sell_but_not_adjust() {
        let staff = Principal::new(UserId::new(), Role::Staff);

        assert_eq!(authorize(&staff, Permission::CreateInvoice), Ok(()));
        assert_eq!(
            authorize(&staff, Permission::AdjustStock),
            Err(AuthzError::Forbidden {
                role: Role::Staff,
                permission: Permission::AdjustStock,
            })
        );
    }

    #[test]
    fn active_check_ignores_role() {
        let staff = Principal::new(UserId::new(), Role::Staff);
        assert_eq!(ensure_active(&staff), Ok(()));

        let mut former = Principal::new(UserId::new(), Role::Owner);
        former.active = false;
        assert_eq!(ensure_active(&former), Err(AuthzError::Inactive));
    }

    #[test]
    fn manager_may_receive() {
        let manager = Principal::new(UserId::new(), Role::Manager);
        assert!(authorize(&manager, Permission::ReceivePurchase).is_ok());
    }

    #[test]
    fn inactive_owner_is_denied() {
        let mut owner = Principal::new(UserId::new(), Role::Owner);
        owner.active = false;
        assert_eq!(
            authorize(&owner, Permission::ViewInvoices),
            Err(AuthzError::Inactive)
        );
    }
}
