// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Records stored in the embedded operations database: products, stock
//! ledger entries, sales orders and the storefront mirror.
//!
//! Monetary amounts are kept in minor units (cents) and exposed to the API
//! as decimal strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A local inventory product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredProduct {
    /// Unique product identifier (UUID)
    pub product_id: String,
    /// Stock-keeping unit, unique across products
    pub sku: String,
    /// Display name
    pub name: String,
    /// Unit price in minor units
    pub price_minor: u64,
    /// Units currently in stock
    pub stock: u64,
    /// Unit of measure ("pcs", "box", ...)
    pub unit: String,
    /// Inactive products are hidden from POS
    pub is_active: bool,
    /// When the product was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl StoredProduct {
    /// Create a new active product with a generated id.
    pub fn new(sku: String, name: String, price_minor: u64, stock: u64, unit: String) -> Self {
        let now = Utc::now();
        Self {
            product_id: uuid::Uuid::new_v4().to_string(),
            sku,
            name,
            price_minor,
            stock,
            unit,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Reason a stock ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockReason {
    /// Stock sold through the POS
    Sale,
    /// Stock received from a supplier
    Restock,
    /// Manual correction
    Adjustment,
}

impl std::fmt::Display for StockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockReason::Sale => write!(f, "sale"),
            StockReason::Restock => write!(f, "restock"),
            StockReason::Adjustment => write!(f, "adjustment"),
        }
    }
}

/// An append-only stock movement record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockEntry {
    /// Unique entry identifier (UUID)
    pub entry_id: String,
    /// Product the movement applies to
    pub product_id: String,
    /// Signed quantity delta (negative for sales)
    pub delta: i64,
    /// Stock level after applying the delta
    pub balance_after: u64,
    /// Why the movement happened
    pub reason: StockReason,
    /// Related record (order id for sales), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Free-form note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the movement was recorded
    pub created_at: DateTime<Utc>,
}

impl StockEntry {
    /// Create a new ledger entry stamped with the current time.
    pub fn new(
        product_id: String,
        delta: i64,
        balance_after: u64,
        reason: StockReason,
        reference: Option<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            product_id,
            delta,
            balance_after,
            reason,
            reference,
            note,
            created_at: Utc::now(),
        }
    }
}

/// One line of a sales order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    /// Product sold
    pub product_id: String,
    /// Product name at sale time
    pub product_name: String,
    /// Units sold
    pub quantity: u64,
    /// Unit price at sale time, minor units
    pub unit_price_minor: u64,
}

impl OrderLine {
    /// Line total in minor units.
    pub fn total_minor(&self) -> u64 {
        self.quantity * self.unit_price_minor
    }
}

/// A point-of-sale order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredOrder {
    /// Unique order identifier (UUID)
    pub order_id: String,
    /// Cashier who recorded the sale
    pub cashier_user_id: String,
    /// Lines sold
    pub lines: Vec<OrderLine>,
    /// Order total in minor units
    pub total_minor: u64,
    /// When the sale was recorded
    pub created_at: DateTime<Utc>,
}

impl StoredOrder {
    /// Create a new order; the total is computed from the lines.
    pub fn new(cashier_user_id: String, lines: Vec<OrderLine>) -> Self {
        let total_minor = lines.iter().map(OrderLine::total_minor).sum();
        Self {
            order_id: uuid::Uuid::new_v4().to_string(),
            cashier_user_id,
            lines,
            total_minor,
            created_at: Utc::now(),
        }
    }
}

/// A mirrored storefront product, keyed by the remote numeric ID.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredStoreProduct {
    /// Remote product ID (upsert key)
    pub remote_id: u64,
    /// Remote product name
    pub name: String,
    /// Remote SKU (may be empty)
    pub sku: String,
    /// Remote price as a decimal string (as served by the store)
    pub price: String,
    /// Remote managed stock quantity, if any
    pub stock_quantity: Option<i64>,
    /// Remote publication status ("publish", "draft", ...)
    pub status: String,
    /// Remote product page URL
    pub permalink: String,
    /// Set when the row was absent from the latest full feed
    pub is_missing_from_store: bool,
    /// Last time this row appeared in a feed
    pub last_seen_at: DateTime<Utc>,
    /// Last time this row was written by a sync
    pub synced_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_total_is_sum_of_lines() {
        let order = StoredOrder::new(
            "cashier-1".to_string(),
            vec![
                OrderLine {
                    product_id: "p-1".to_string(),
                    product_name: "Widget".to_string(),
                    quantity: 3,
                    unit_price_minor: 1500,
                },
                OrderLine {
                    product_id: "p-2".to_string(),
                    product_name: "Gadget".to_string(),
                    quantity: 1,
                    unit_price_minor: 9900,
                },
            ],
        );
        assert_eq!(order.total_minor, 3 * 1500 + 9900);
    }

    #[test]
    fn new_product_is_active_with_fresh_id() {
        let p = StoredProduct::new("SKU-1".into(), "Widget".into(), 1000, 5, "pcs".into());
        assert!(p.is_active);
        assert!(!p.product_id.is_empty());
        assert_eq!(p.stock, 5);
    }

    #[test]
    fn stock_reason_display() {
        assert_eq!(StockReason::Sale.to_string(), "sale");
        assert_eq!(StockReason::Restock.to_string(), "restock");
        assert_eq!(StockReason::Adjustment.to_string(), "adjustment");
    }
}
