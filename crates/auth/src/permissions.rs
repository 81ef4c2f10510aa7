use serde::{Deserialize, Serialize};

/// An operation that is subject to role-based access control.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateInvoice,
    ViewInvoices,
    CreatePurchase,
    ViewPurchases,
    ReceivePurchase,
    CancelPurchase,
    AdjustStock,
    ViewLowStock,
    ViewReports,
    ManageProducts,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::CreateInvoice,
        Permission::ViewInvoices,
        Permission::CreatePurchase,
        Permission::ViewPurchases,
        Permission::ReceivePurchase,
        Permission::CancelPurchase,
        Permission::AdjustStock,
        Permission::ViewLowStock,
        Permission::ViewReports,
        Permission::ManageProducts,
    ];

    /// Stable dotted name, e.g. `"stock.adjust"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::CreateInvoice => "invoices.create",
            Permission::ViewInvoices => "invoices.read",
            Permission::CreatePurchase => "purchases.create",
            Permission::ViewPurchases => "purchases.read",
            Permission::ReceivePurchase => "purchases.receive",
            Permission::CancelPurchase => "purchases.cancel",
            Permission::AdjustStock => "stock.adjust",
            Permission::ViewLowStock => "stock.low.read",
            Permission::ViewReports => "reports.read",
            Permission::ManageProducts => "products.write",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
