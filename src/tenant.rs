//! Tenant scoping for partner-owned tables.
//!
//! Every tenant-owned row carries a nullable `partner_id`. Reads go through
//! one of two entry points so the authorization intent is visible where the
//! query is built:
//!
//! - [`for_tenant`] restricts rows to a single [`TenantScope`].
//! - [`all_tenants`] reads across every partner. Only administrative paths
//!   and cross-tenant lookups by primary key use it.
//!
//! The scope is always passed in explicitly; nothing here reads ambient
//! request state.

use crate::orm::{forum_comments, forum_topics, news, reports, users};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, Select};

/// Which partner's rows a query may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TenantScope {
    /// Rows belonging to this partner.
    Partner(i32),
    /// Rows not attached to any partner.
    Global,
}

impl TenantScope {
    /// Scope of a caller. Guests and users without a partner see global rows.
    pub fn for_user(user: Option<&users::Model>) -> Self {
        Self::from_partner_id(user.and_then(|u| u.partner_id))
    }

    pub fn from_partner_id(partner_id: Option<i32>) -> Self {
        match partner_id {
            Some(id) => Self::Partner(id),
            None => Self::Global,
        }
    }

    /// The `partner_id` value rows in this scope carry.
    pub fn partner_id(&self) -> Option<i32> {
        match self {
            Self::Partner(id) => Some(*id),
            Self::Global => None,
        }
    }

    /// Predicate selecting rows of `E` inside this scope.
    pub fn condition<E: TenantOwned>(&self) -> Condition {
        let col = E::partner_col();
        match self {
            Self::Partner(id) => Condition::all().add(col.eq(*id)),
            Self::Global => Condition::all().add(col.is_null()),
        }
    }
}

/// Entities whose rows belong to a partner.
pub trait TenantOwned: EntityTrait {
    fn partner_col() -> Self::Column;
}

impl TenantOwned for forum_topics::Entity {
    fn partner_col() -> Self::Column {
        forum_topics::Column::PartnerId
    }
}

impl TenantOwned for forum_comments::Entity {
    fn partner_col() -> Self::Column {
        forum_comments::Column::PartnerId
    }
}

impl TenantOwned for news::Entity {
    fn partner_col() -> Self::Column {
        news::Column::PartnerId
    }
}

impl TenantOwned for reports::Entity {
    fn partner_col() -> Self::Column {
        reports::Column::PartnerId
    }
}

impl TenantOwned for users::Entity {
    fn partner_col() -> Self::Column {
        users::Column::PartnerId
    }
}

/// Rows of `E` visible inside `scope`.
pub fn for_tenant<E: TenantOwned>(scope: TenantScope) -> Select<E> {
    E::find().filter(scope.condition::<E>())
}

/// Rows of `E` across every partner.
pub fn all_tenants<E: TenantOwned>() -> Select<E> {
    E::find()
}
