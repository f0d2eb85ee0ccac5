//! # User Repository
//!
//! Database operations for staff accounts, group membership, and the
//! per-shopkeeper stock-edit permission.
//!
//! ## Role Resolution
//! Group rows are plain data; the effective role comes from
//! `tally_core::access::resolve_role`, which this repository feeds with
//! the account and its group memberships. Policy decisions (who may
//! flip the stock-edit toggle, who may see which dashboard) live in
//! tally-core; this module only enforces them at the write path.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::access::{self, Role};
use tally_core::validation::validate_username;
use tally_core::{CoreError, Group, ShopkeeperPermission, UserAccount};

/// A shopkeeper account joined with its stock-edit permission, as shown
/// on the management screen.
#[derive(Debug, Clone, Serialize)]
pub struct ShopkeeperOverview {
    pub account: UserAccount,
    pub can_edit_stock: bool,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

const USER_COLUMNS: &str =
    "id, username, email, is_staff, is_superuser, is_active, created_at";

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a shopkeeper account.
    ///
    /// One transaction writes the account, the Shopkeeper group row,
    /// and a permission row with `can_edit_stock = false`. New
    /// shopkeepers cannot touch stock until an Owner grants it.
    pub async fn register_shopkeeper(&self, username: &str, email: &str) -> DbResult<UserAccount> {
        validate_username(username).map_err(CoreError::from)?;

        let user = UserAccount {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, is_staff, is_superuser, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_groups (user_id, group_name) VALUES (?1, ?2)")
            .bind(&user.id)
            .bind(Group::Shopkeeper)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO shopkeeper_permissions (shopkeeper_id, can_edit_stock) VALUES (?1, 0)",
        )
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id = %user.id, username = %user.username, "Registered shopkeeper");

        Ok(user)
    }

    /// Updates an account's username and email, as on the shopkeeper
    /// management screen. Group membership and permissions are managed
    /// separately.
    pub async fn update_account(&self, user_id: &str, username: &str, email: &str) -> DbResult<()> {
        validate_username(username).map_err(CoreError::from)?;

        debug!(user_id = %user_id, "Updating account");

        let result = sqlx::query("UPDATE users SET username = ?2, email = ?3 WHERE id = ?1")
            .bind(user_id)
            .bind(username)
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }

    /// Gets a user by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<UserAccount>> {
        let user = sqlx::query_as::<_, UserAccount>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<UserAccount>> {
        let user = sqlx::query_as::<_, UserAccount>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Group memberships for an account.
    pub async fn groups_for(&self, user_id: &str) -> DbResult<Vec<Group>> {
        let groups: Vec<(Group,)> =
            sqlx::query_as("SELECT group_name FROM user_groups WHERE user_id = ?1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(groups.into_iter().map(|(g,)| g).collect())
    }

    /// Adds a group membership (idempotent).
    pub async fn add_to_group(&self, user_id: &str, group: Group) -> DbResult<()> {
        debug!(user_id = %user_id, group = ?group, "Adding group membership");

        sqlx::query(
            "INSERT OR IGNORE INTO user_groups (user_id, group_name) VALUES (?1, ?2)",
        )
        .bind(user_id)
        .bind(group)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolves the effective role for an account from its flags and
    /// group memberships.
    pub async fn role_of(&self, user: &UserAccount) -> DbResult<Role> {
        let groups = self.groups_for(&user.id).await?;
        Ok(access::resolve_role(user, &groups))
    }

    /// Lists shopkeeper accounts with their stock-edit permission,
    /// ordered by username.
    pub async fn list_shopkeepers(&self) -> DbResult<Vec<ShopkeeperOverview>> {
        let accounts = sqlx::query_as::<_, UserAccount>(
            "SELECT u.id, u.username, u.email, u.is_staff, u.is_superuser, u.is_active, \
             u.created_at \
             FROM users u \
             JOIN user_groups g ON g.user_id = u.id AND g.group_name = 'shopkeeper' \
             ORDER BY u.username",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut overviews = Vec::with_capacity(accounts.len());
        for account in accounts {
            let permission = self.stock_permission(&account.id).await?;
            overviews.push(ShopkeeperOverview {
                can_edit_stock: permission.is_some_and(|p| p.can_edit_stock),
                account,
            });
        }

        Ok(overviews)
    }

    /// The stock-edit permission row for a shopkeeper, if one exists.
    pub async fn stock_permission(&self, user_id: &str) -> DbResult<Option<ShopkeeperPermission>> {
        let permission = sqlx::query_as::<_, ShopkeeperPermission>(
            "SELECT shopkeeper_id, can_edit_stock FROM shopkeeper_permissions \
             WHERE shopkeeper_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission)
    }

    /// Flips a shopkeeper's stock-edit toggle.
    ///
    /// Only Owner-tier callers may do this; anyone else gets
    /// `AccessDenied` and nothing changes. Returns the new toggle state.
    pub async fn toggle_stock_permission(
        &self,
        acting_role: Role,
        user_id: &str,
    ) -> DbResult<bool> {
        if !access::can_toggle_stock_permission(acting_role) {
            return Err(DbError::Domain(CoreError::AccessDenied {
                required: Role::Owner,
            }));
        }

        // Flip and read back in one statement: a concurrent toggle then
        // cannot slip between the write and the reported state.
        let enabled: bool = sqlx::query_scalar(
            "UPDATE shopkeeper_permissions SET can_edit_stock = NOT can_edit_stock \
             WHERE shopkeeper_id = ?1 \
             RETURNING can_edit_stock",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("ShopkeeperPermission", user_id))?;

        info!(user_id = %user_id, can_edit_stock = %enabled, "Toggled stock permission");

        Ok(enabled)
    }

    /// Reactivates an account.
    pub async fn activate(&self, user_id: &str) -> DbResult<()> {
        self.set_active(user_id, true).await
    }

    /// Deactivates an account. The account keeps its history but can no
    /// longer act; a user cannot deactivate themself.
    pub async fn deactivate(&self, acting_user_id: &str, user_id: &str) -> DbResult<()> {
        if acting_user_id == user_id {
            return Err(DbError::Domain(CoreError::SelfDeactivation));
        }
        self.set_active(user_id, false).await
    }

    async fn set_active(&self, user_id: &str, active: bool) -> DbResult<()> {
        debug!(user_id = %user_id, active = %active, "Setting account active flag");

        let result = sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
            .bind(user_id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }

    /// Counts shopkeeper accounts; `active_only` restricts to accounts
    /// that can still log in.
    pub async fn count_shopkeepers(&self, active_only: bool) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users u \
             JOIN user_groups g ON g.user_id = u.id AND g.group_name = 'shopkeeper' \
             WHERE (?1 = 0 OR u.is_active = 1)",
        )
        .bind(active_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
