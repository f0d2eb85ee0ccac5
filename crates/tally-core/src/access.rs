//! # Access Policy
//!
//! Maps a user to a role and gates what each role may do.
//!
//! ## Role Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Role Resolution (at login)                      │
//! │                                                                     │
//! │  is_staff OR is_superuser OR in Owner group ──► Owner               │
//! │            │ no                                                     │
//! │            ▼                                                        │
//! │  in Manager group ──────────────────────────► Manager               │
//! │            │ no                                                     │
//! │            ▼                                                        │
//! │  in Shopkeeper group ───────────────────────► Shopkeeper            │
//! │            │ no                                                     │
//! │            ▼                                                        │
//! │  Unassigned (terminal - sent back to login)                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checks run in priority order, so a user in both the Owner and
//! Shopkeeper groups resolves to Owner. Previously these membership checks
//! were scattered across every handler; this module is the single place
//! they live now.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Group, ShopkeeperPermission, UserAccount};

// =============================================================================
// Role
// =============================================================================

/// Effective role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access: every dashboard, every admin action.
    Owner,
    /// Branch oversight without owner admin actions.
    Manager,
    /// Day-to-day sales recording.
    Shopkeeper,
    /// No recognized membership; only exit is back to login.
    Unassigned,
}

impl Role {
    /// Owner-tier accounts may administer shopkeepers and their
    /// permissions.
    #[inline]
    pub const fn is_owner_tier(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

// =============================================================================
// Dashboards
// =============================================================================

/// The role-specific dashboards served by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    Owner,
    Manager,
    Shopkeeper,
}

// =============================================================================
// Resolution & Gates
// =============================================================================

/// Resolves a user's effective role from account flags and group
/// membership, in priority order.
///
/// An inactive account always resolves to [`Role::Unassigned`].
pub fn resolve_role(user: &UserAccount, groups: &[Group]) -> Role {
    if !user.is_active {
        return Role::Unassigned;
    }

    if user.is_staff || user.is_superuser || groups.contains(&Group::Owner) {
        Role::Owner
    } else if groups.contains(&Group::Manager) {
        Role::Manager
    } else if groups.contains(&Group::Shopkeeper) {
        Role::Shopkeeper
    } else {
        Role::Unassigned
    }
}

/// The dashboard a freshly logged-in user lands on.
///
/// `None` means there is nothing to show; the caller redirects to login.
pub fn default_dashboard(role: Role) -> Option<Dashboard> {
    match role {
        Role::Owner => Some(Dashboard::Owner),
        Role::Manager => Some(Dashboard::Manager),
        Role::Shopkeeper => Some(Dashboard::Shopkeeper),
        Role::Unassigned => None,
    }
}

/// Whether a role may view a given dashboard.
///
/// Owners can inspect every dashboard; other roles only their own.
pub fn can_view_dashboard(role: Role, dashboard: Dashboard) -> bool {
    match role {
        Role::Owner => true,
        Role::Manager => dashboard == Dashboard::Manager,
        Role::Shopkeeper => dashboard == Dashboard::Shopkeeper,
        Role::Unassigned => false,
    }
}

/// Whether a caller may edit stock counts directly.
///
/// Owner-tier accounts always may. A shopkeeper needs their per-user
/// toggle set; the toggle missing (no permission row) means no.
pub fn can_edit_stock(role: Role, permission: Option<&ShopkeeperPermission>) -> bool {
    match role {
        Role::Owner => true,
        Role::Shopkeeper => permission.is_some_and(|p| p.can_edit_stock),
        Role::Manager | Role::Unassigned => false,
    }
}

/// Whether a caller may flip another shopkeeper's stock-edit toggle.
#[inline]
pub fn can_toggle_stock_permission(role: Role) -> bool {
    role.is_owner_tier()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_staff: bool, is_superuser: bool, is_active: bool) -> UserAccount {
        UserAccount {
            id: "u-1".to_string(),
            username: "ama".to_string(),
            email: "ama@example.com".to_string(),
            is_staff,
            is_superuser,
            is_active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_staff_and_superuser_resolve_to_owner() {
        assert_eq!(resolve_role(&user(true, false, true), &[]), Role::Owner);
        assert_eq!(resolve_role(&user(false, true, true), &[]), Role::Owner);
    }

    #[test]
    fn test_group_priority_order() {
        let u = user(false, false, true);

        assert_eq!(resolve_role(&u, &[Group::Owner]), Role::Owner);
        assert_eq!(resolve_role(&u, &[Group::Manager]), Role::Manager);
        assert_eq!(resolve_role(&u, &[Group::Shopkeeper]), Role::Shopkeeper);

        // Owner wins over every other membership.
        assert_eq!(
            resolve_role(&u, &[Group::Shopkeeper, Group::Owner]),
            Role::Owner
        );
        // Manager wins over Shopkeeper.
        assert_eq!(
            resolve_role(&u, &[Group::Shopkeeper, Group::Manager]),
            Role::Manager
        );
    }

    #[test]
    fn test_no_membership_is_unassigned() {
        let role = resolve_role(&user(false, false, true), &[]);
        assert_eq!(role, Role::Unassigned);
        assert_eq!(default_dashboard(role), None);
    }

    #[test]
    fn test_inactive_account_is_unassigned() {
        let role = resolve_role(&user(true, true, false), &[Group::Owner]);
        assert_eq!(role, Role::Unassigned);
    }

    #[test]
    fn test_dashboard_gates() {
        assert!(can_view_dashboard(Role::Owner, Dashboard::Shopkeeper));
        assert!(can_view_dashboard(Role::Owner, Dashboard::Manager));
        assert!(can_view_dashboard(Role::Manager, Dashboard::Manager));
        assert!(!can_view_dashboard(Role::Manager, Dashboard::Owner));
        assert!(can_view_dashboard(Role::Shopkeeper, Dashboard::Shopkeeper));
        assert!(!can_view_dashboard(Role::Shopkeeper, Dashboard::Owner));
        assert!(!can_view_dashboard(Role::Unassigned, Dashboard::Shopkeeper));
    }

    #[test]
    fn test_stock_edit_gate() {
        let granted = ShopkeeperPermission {
            shopkeeper_id: "u-1".to_string(),
            can_edit_stock: true,
        };
        let denied = ShopkeeperPermission {
            shopkeeper_id: "u-1".to_string(),
            can_edit_stock: false,
        };

        assert!(can_edit_stock(Role::Owner, None));
        assert!(can_edit_stock(Role::Shopkeeper, Some(&granted)));
        assert!(!can_edit_stock(Role::Shopkeeper, Some(&denied)));
        assert!(!can_edit_stock(Role::Shopkeeper, None));
        assert!(!can_edit_stock(Role::Manager, Some(&granted)));
    }

    #[test]
    fn test_toggle_gate_is_owner_only() {
        assert!(can_toggle_stock_permission(Role::Owner));
        assert!(!can_toggle_stock_permission(Role::Manager));
        assert!(!can_toggle_stock_permission(Role::Shopkeeper));
        assert!(!can_toggle_stock_permission(Role::Unassigned));
    }
}
