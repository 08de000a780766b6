// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// Roles form a flat list consulted by the per-route allow-list; there is no
/// hierarchy apart from `Admin` passing every gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Store and inventory management
    Manager,
    /// Point-of-sale operator
    Cashier,
    /// HR staff (attendance, payroll)
    Hr,
    /// Finance staff (expenses, payroll)
    Finance,
    /// Regular employee (own attendance only)
    Staff,
}

impl Role {
    /// Parse role from string (case-insensitive).
    /// Used when loading route-access overrides and user records.
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "cashier" => Some(Role::Cashier),
            "hr" => Some(Role::Hr),
            "finance" => Some(Role::Finance),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Staff (least privilege for authenticated users).
    fn default() -> Self {
        Role::Staff
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Manager => write!(f, "manager"),
            Role::Cashier => write!(f, "cashier"),
            Role::Hr => write!(f, "hr"),
            Role::Finance => write!(f, "finance"),
            Role::Staff => write!(f, "staff"),
        }
    }
}
