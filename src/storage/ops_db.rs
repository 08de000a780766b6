// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Embedded operations database backed by redb (pure Rust, ACID).
//!
//! Holds the tables that need multi-statement transactions: selling through
//! the POS decrements stock, appends a ledger entry and inserts the order in
//! a single commit, so stock can never go negative or drift from the ledger.
//!
//! ## Table Layout
//!
//! - `products`: product_id → serialized StoredProduct
//! - `product_sku_index`: sku → product_id
//! - `stock_ledger`: entry_id → serialized StockEntry
//! - `ledger_index`: composite key (product_id|!timestamp|entry_id) → reason
//! - `orders`: order_id → serialized StoredOrder
//! - `order_index`: composite key (!timestamp|order_id) → cashier_user_id
//! - `store_mirror`: remote_id (u64) → serialized StoredStoreProduct
//! - `sync_state`: key → value bytes (checkpoint state)

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::catalog::{
    OrderLine, StockEntry, StockReason, StoredOrder, StoredProduct, StoredStoreProduct,
};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: product_id → serialized StoredProduct (JSON bytes).
const PRODUCTS: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

/// Index: sku → product_id (uniqueness + lookup).
const PRODUCT_SKU_INDEX: TableDefinition<&str, &str> = TableDefinition::new("product_sku_index");

/// Primary table: entry_id → serialized StockEntry (JSON bytes).
const STOCK_LEDGER: TableDefinition<&str, &[u8]> = TableDefinition::new("stock_ledger");

/// Index: composite key → reason ("sale"|"restock"|"adjustment").
/// Key format: `product_id|!timestamp_be|entry_id` for newest-first scans.
const LEDGER_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("ledger_index");

/// Primary table: order_id → serialized StoredOrder (JSON bytes).
const ORDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Index: composite key → cashier_user_id.
/// Key format: `!timestamp_be|order_id` for newest-first scans.
const ORDER_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("order_index");

/// Storefront mirror: remote numeric ID → serialized StoredStoreProduct.
const STORE_MIRROR: TableDefinition<u64, &[u8]> = TableDefinition::new("store_mirror");

/// Sync state: key → value bytes (e.g., "last_sync_at" → RFC 3339 string).
const SYNC_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("sync_state");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OpsDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate SKU: {0}")]
    DuplicateSku(String),

    #[error("insufficient stock for {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: String,
        available: u64,
        requested: u64,
    },
}

pub type OpsDbResult<T> = Result<T, OpsDbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the ledger_index table.
///
/// Format: `product_id | inverted_timestamp_be_bytes | entry_id`
///
/// The inverted timestamp ensures newest-first ordering when scanning forward.
fn make_ledger_key(product_id: &str, timestamp: i64, entry_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(product_id.len() + 1 + 8 + 1 + entry_id.len());
    key.extend_from_slice(product_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(entry_id.as_bytes());
    key
}

/// Build a prefix key for range scanning a product's ledger entries.
fn make_ledger_prefix(product_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(product_id.len() + 1);
    prefix.extend_from_slice(product_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a ledger range scan.
fn make_ledger_prefix_end(product_id: &str) -> Vec<u8> {
    let mut end = make_ledger_prefix(product_id);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

/// Build a composite key for the order_index table.
///
/// Format: `inverted_timestamp_be_bytes | order_id`
fn make_order_key(timestamp: i64, order_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 1 + order_id.len());
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(order_id.as_bytes());
    key
}

/// Extract the record id after the last `|` of a composite index key.
fn extract_id_from_key(key: &[u8]) -> Option<String> {
    let pos = key.iter().rposition(|&b| b == b'|')?;
    String::from_utf8(key[pos + 1..].to_vec()).ok()
}

fn encode_cursor(key: &[u8]) -> String {
    hex::encode(key)
}

fn decode_cursor(cursor: &str) -> Option<Vec<u8>> {
    hex::decode(cursor).ok()
}

// =============================================================================
// OpsDatabase
// =============================================================================

/// Embedded ACID database for inventory, sales and the storefront mirror.
pub struct OpsDatabase {
    db: Database,
}

impl OpsDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> OpsDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS)?;
            let _ = write_txn.open_table(PRODUCT_SKU_INDEX)?;
            let _ = write_txn.open_table(STOCK_LEDGER)?;
            let _ = write_txn.open_table(LEDGER_INDEX)?;
            let _ = write_txn.open_table(ORDERS)?;
            let _ = write_txn.open_table(ORDER_INDEX)?;
            let _ = write_txn.open_table(STORE_MIRROR)?;
            let _ = write_txn.open_table(SYNC_STATE)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Insert a new product, enforcing SKU uniqueness.
    pub fn insert_product(&self, product: &StoredProduct) -> OpsDbResult<()> {
        let json = serde_json::to_vec(product)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut sku_table = write_txn.open_table(PRODUCT_SKU_INDEX)?;
            let taken = sku_table
                .get(product.sku.as_str())?
                .map(|v| v.value().to_string());
            if let Some(existing_id) = taken {
                if existing_id != product.product_id {
                    return Err(OpsDbError::DuplicateSku(product.sku.clone()));
                }
            }
            sku_table.insert(product.sku.as_str(), product.product_id.as_str())?;

            let mut table = write_txn.open_table(PRODUCTS)?;
            table.insert(product.product_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Update an existing product, keeping the SKU index consistent.
    pub fn update_product(&self, product: &StoredProduct) -> OpsDbResult<()> {
        let json = serde_json::to_vec(product)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PRODUCTS)?;
            let previous = {
                let existing = table.get(product.product_id.as_str())?.ok_or_else(|| {
                    OpsDbError::NotFound(format!("product {}", product.product_id))
                })?;
                serde_json::from_slice::<StoredProduct>(existing.value())?
            };

            let mut sku_table = write_txn.open_table(PRODUCT_SKU_INDEX)?;
            if previous.sku != product.sku {
                let taken = sku_table
                    .get(product.sku.as_str())?
                    .map(|v| v.value().to_string());
                if let Some(existing_id) = taken {
                    if existing_id != product.product_id {
                        return Err(OpsDbError::DuplicateSku(product.sku.clone()));
                    }
                }
                sku_table.remove(previous.sku.as_str())?;
                sku_table.insert(product.sku.as_str(), product.product_id.as_str())?;
            }

            table.insert(product.product_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a single product by id.
    pub fn get_product(&self, product_id: &str) -> OpsDbResult<Option<StoredProduct>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a single product by SKU.
    pub fn get_product_by_sku(&self, sku: &str) -> OpsDbResult<Option<StoredProduct>> {
        let read_txn = self.db.begin_read()?;
        let sku_table = read_txn.open_table(PRODUCT_SKU_INDEX)?;
        let product_id = match sku_table.get(sku)? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };
        let table = read_txn.open_table(PRODUCTS)?;
        match table.get(product_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List all products, sorted by name.
    pub fn list_products(&self) -> OpsDbResult<Vec<StoredProduct>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS)?;

        let mut products = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            products.push(serde_json::from_slice::<StoredProduct>(value.value())?);
        }
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    /// Number of products in the catalog.
    pub fn product_count(&self) -> OpsDbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS)?;
        let mut count = 0u64;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    // =========================================================================
    // Stock movements
    // =========================================================================

    /// Apply a signed stock delta and append the matching ledger entry in one
    /// transaction. Stock can never go below zero.
    pub fn apply_stock_delta(
        &self,
        product_id: &str,
        delta: i64,
        reason: StockReason,
        reference: Option<String>,
        note: Option<String>,
    ) -> OpsDbResult<(StoredProduct, StockEntry)> {
        let write_txn = self.db.begin_write()?;
        let (product, entry) = {
            let mut table = write_txn.open_table(PRODUCTS)?;
            let mut product = {
                let existing = table
                    .get(product_id)?
                    .ok_or_else(|| OpsDbError::NotFound(format!("product {product_id}")))?;
                serde_json::from_slice::<StoredProduct>(existing.value())?
            };

            let new_stock = apply_delta(product.stock, delta).ok_or_else(|| {
                OpsDbError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available: product.stock,
                    requested: delta.unsigned_abs(),
                }
            })?;
            product.stock = new_stock;
            product.updated_at = Utc::now();

            let json = serde_json::to_vec(&product)?;
            table.insert(product_id, json.as_slice())?;

            let entry = StockEntry::new(
                product_id.to_string(),
                delta,
                new_stock,
                reason,
                reference,
                note,
            );
            write_ledger_entry(&write_txn, &entry)?;

            (product, entry)
        };
        write_txn.commit()?;
        Ok((product, entry))
    }

    /// Record a POS sale: decrement stock for every line, append ledger
    /// entries and insert the order, all-or-nothing.
    ///
    /// `items` is a list of `(product_id, quantity)` pairs. Line prices and
    /// names are read inside the transaction, so the order snapshot matches
    /// the stock decrement exactly.
    pub fn record_sale(
        &self,
        cashier_user_id: &str,
        items: &[(String, u64)],
    ) -> OpsDbResult<StoredOrder> {
        let write_txn = self.db.begin_write()?;
        let order = {
            let mut table = write_txn.open_table(PRODUCTS)?;

            // Validate and snapshot every line before mutating anything
            let mut lines = Vec::with_capacity(items.len());
            for (product_id, quantity) in items {
                let product = {
                    let existing = table
                        .get(product_id.as_str())?
                        .ok_or_else(|| OpsDbError::NotFound(format!("product {product_id}")))?;
                    serde_json::from_slice::<StoredProduct>(existing.value())?
                };

                if !product.is_active {
                    return Err(OpsDbError::NotFound(format!(
                        "product {product_id} is inactive"
                    )));
                }
                if product.stock < *quantity {
                    return Err(OpsDbError::InsufficientStock {
                        product_id: product_id.clone(),
                        available: product.stock,
                        requested: *quantity,
                    });
                }

                lines.push(OrderLine {
                    product_id: product.product_id.clone(),
                    product_name: product.name.clone(),
                    quantity: *quantity,
                    unit_price_minor: product.price_minor,
                });
            }

            let order = StoredOrder::new(cashier_user_id.to_string(), lines);

            // Apply decrements and ledger entries
            for line in &order.lines {
                let mut product = {
                    let existing = table
                        .get(line.product_id.as_str())?
                        .ok_or_else(|| OpsDbError::NotFound(format!("product {}", line.product_id)))?;
                    serde_json::from_slice::<StoredProduct>(existing.value())?
                };
                // Re-check here: the same product may appear on several lines
                product.stock = product.stock.checked_sub(line.quantity).ok_or_else(|| {
                    OpsDbError::InsufficientStock {
                        product_id: line.product_id.clone(),
                        available: product.stock,
                        requested: line.quantity,
                    }
                })?;
                product.updated_at = Utc::now();
                let json = serde_json::to_vec(&product)?;
                table.insert(line.product_id.as_str(), json.as_slice())?;

                let entry = StockEntry::new(
                    line.product_id.clone(),
                    -(line.quantity as i64),
                    product.stock,
                    StockReason::Sale,
                    Some(order.order_id.clone()),
                    None,
                );
                write_ledger_entry(&write_txn, &entry)?;
            }

            // Insert the order and its listing index
            let json = serde_json::to_vec(&order)?;
            let mut orders = write_txn.open_table(ORDERS)?;
            orders.insert(order.order_id.as_str(), json.as_slice())?;

            let mut order_idx = write_txn.open_table(ORDER_INDEX)?;
            let key = make_order_key(order.created_at.timestamp(), &order.order_id);
            order_idx.insert(key.as_slice(), cashier_user_id)?;

            order
        };
        write_txn.commit()?;
        Ok(order)
    }

    /// Look up a single order by id.
    pub fn get_order(&self, order_id: &str) -> OpsDbResult<Option<StoredOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Paginated listing of orders, newest first.
    ///
    /// Returns `(orders, next_cursor)`.
    pub fn list_orders(
        &self,
        cursor: Option<&str>,
        limit: usize,
    ) -> OpsDbResult<(Vec<StoredOrder>, Option<String>)> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(ORDER_INDEX)?;
        let order_table = read_txn.open_table(ORDERS)?;

        let start: Vec<u8> = cursor
            .and_then(decode_cursor)
            .unwrap_or_default();

        let mut results = Vec::with_capacity(limit + 1);
        let mut skip_first = cursor.is_some();
        let mut last_key: Option<Vec<u8>> = None;

        for entry in idx_table.range(start.as_slice()..)? {
            let entry = entry?;
            let key_bytes = entry.0.value().to_vec();

            if skip_first {
                skip_first = false;
                continue;
            }

            if let Some(order_id) = extract_id_from_key(&key_bytes) {
                if let Some(value) = order_table.get(order_id.as_str())? {
                    results.push(serde_json::from_slice::<StoredOrder>(value.value())?);
                    last_key = Some(key_bytes);
                }
            }

            if results.len() >= limit {
                break;
            }
        }

        let next_cursor = if results.len() >= limit {
            last_key.map(|k| encode_cursor(&k))
        } else {
            None
        };

        Ok((results, next_cursor))
    }

    /// Number of recorded orders.
    pub fn order_count(&self) -> OpsDbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;
        let mut count = 0u64;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Paginated listing of a product's ledger entries, newest first.
    pub fn list_ledger(
        &self,
        product_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> OpsDbResult<(Vec<StockEntry>, Option<String>)> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(LEDGER_INDEX)?;
        let ledger_table = read_txn.open_table(STOCK_LEDGER)?;

        let prefix = make_ledger_prefix(product_id);
        let prefix_end = make_ledger_prefix_end(product_id);

        let start: Vec<u8> = cursor
            .and_then(decode_cursor)
            .unwrap_or_else(|| prefix.clone());

        let mut results = Vec::with_capacity(limit + 1);
        let mut skip_first = cursor.is_some();
        let mut last_key: Option<Vec<u8>> = None;

        for entry in idx_table.range(start.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let key_bytes = entry.0.value().to_vec();

            if skip_first {
                skip_first = false;
                continue;
            }

            if let Some(entry_id) = extract_id_from_key(&key_bytes) {
                if let Some(value) = ledger_table.get(entry_id.as_str())? {
                    results.push(serde_json::from_slice::<StockEntry>(value.value())?);
                    last_key = Some(key_bytes);
                }
            }

            if results.len() >= limit {
                break;
            }
        }

        let next_cursor = if results.len() >= limit {
            last_key.map(|k| encode_cursor(&k))
        } else {
            None
        };

        Ok((results, next_cursor))
    }

    // =========================================================================
    // Storefront mirror
    // =========================================================================

    /// Insert or update a mirrored product, keyed by remote ID.
    pub fn mirror_upsert(&self, product: &StoredStoreProduct) -> OpsDbResult<()> {
        let json = serde_json::to_vec(product)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(STORE_MIRROR)?;
            table.insert(product.remote_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a mirrored product by remote ID.
    pub fn mirror_get(&self, remote_id: u64) -> OpsDbResult<Option<StoredStoreProduct>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STORE_MIRROR)?;
        match table.get(remote_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Paginated listing of the mirror, ascending by remote ID.
    ///
    /// `cursor` is the last remote ID of the previous page.
    pub fn mirror_list(
        &self,
        cursor: Option<u64>,
        limit: usize,
    ) -> OpsDbResult<(Vec<StoredStoreProduct>, Option<u64>)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STORE_MIRROR)?;

        let start = cursor.map(|c| c.saturating_add(1)).unwrap_or(0);

        let mut results = Vec::with_capacity(limit + 1);
        for entry in table.range(start..)? {
            let (_, value) = entry?;
            results.push(serde_json::from_slice::<StoredStoreProduct>(value.value())?);
            if results.len() >= limit {
                break;
            }
        }

        let next_cursor = if results.len() >= limit {
            results.last().map(|p| p.remote_id)
        } else {
            None
        };

        Ok((results, next_cursor))
    }

    /// Mark every mirror row absent from `seen` as missing from the store.
    ///
    /// Returns the number of rows now flagged missing.
    pub fn mirror_mark_missing(&self, seen: &HashSet<u64>) -> OpsDbResult<usize> {
        // Collect the rows to flip in a read pass first
        let stale: Vec<StoredStoreProduct> = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(STORE_MIRROR)?;
            let mut stale = Vec::new();
            for entry in table.iter()? {
                let (_, value) = entry?;
                let product: StoredStoreProduct = serde_json::from_slice(value.value())?;
                if !seen.contains(&product.remote_id) {
                    stale.push(product);
                }
            }
            stale
        };

        let missing = stale.len();
        if !stale.is_empty() {
            let write_txn = self.db.begin_write()?;
            {
                let mut table = write_txn.open_table(STORE_MIRROR)?;
                for mut product in stale {
                    product.is_missing_from_store = true;
                    let json = serde_json::to_vec(&product)?;
                    table.insert(product.remote_id, json.as_slice())?;
                }
            }
            write_txn.commit()?;
        }

        Ok(missing)
    }

    /// Total and missing row counts for the mirror.
    pub fn mirror_counts(&self) -> OpsDbResult<(u64, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STORE_MIRROR)?;

        let mut total = 0u64;
        let mut missing = 0u64;
        for entry in table.iter()? {
            let (_, value) = entry?;
            total += 1;
            let product: StoredStoreProduct = serde_json::from_slice(value.value())?;
            if product.is_missing_from_store {
                missing += 1;
            }
        }
        Ok((total, missing))
    }

    // =========================================================================
    // Sync checkpoint
    // =========================================================================

    /// When the last full sync completed, if ever.
    pub fn get_last_sync_at(&self) -> OpsDbResult<Option<DateTime<Utc>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SYNC_STATE)?;
        match table.get("last_sync_at")? {
            Some(v) => {
                let raw = String::from_utf8_lossy(v.value()).to_string();
                Ok(DateTime::parse_from_rfc3339(&raw)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)))
            }
            None => Ok(None),
        }
    }

    /// Persist the completion time of a full sync.
    pub fn set_last_sync_at(&self, at: DateTime<Utc>) -> OpsDbResult<()> {
        let raw = at.to_rfc3339();
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SYNC_STATE)?;
            table.insert("last_sync_at", raw.as_bytes())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// The report of the last completed sync, if any.
    pub fn get_last_sync_report(&self) -> OpsDbResult<Option<serde_json::Value>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SYNC_STATE)?;
        match table.get("last_report")? {
            Some(v) => Ok(serde_json::from_slice(v.value()).ok()),
            None => Ok(None),
        }
    }

    /// Persist the report of a completed sync.
    pub fn set_last_sync_report(&self, report: &serde_json::Value) -> OpsDbResult<()> {
        let json = serde_json::to_vec(report)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SYNC_STATE)?;
            table.insert("last_report", json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Apply a signed delta to an unsigned stock level, refusing to go negative.
fn apply_delta(stock: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        stock.checked_add(delta as u64)
    } else {
        stock.checked_sub(delta.unsigned_abs())
    }
}

/// Insert a ledger entry and its index row inside an open write transaction.
fn write_ledger_entry(
    write_txn: &redb::WriteTransaction,
    entry: &StockEntry,
) -> OpsDbResult<()> {
    let json = serde_json::to_vec(entry)?;

    let mut ledger = write_txn.open_table(STOCK_LEDGER)?;
    ledger.insert(entry.entry_id.as_str(), json.as_slice())?;

    let mut idx = write_txn.open_table(LEDGER_INDEX)?;
    let key = make_ledger_key(
        &entry.product_id,
        entry.created_at.timestamp(),
        &entry.entry_id,
    );
    let reason = entry.reason.to_string();
    idx.insert(key.as_slice(), reason.as_str())?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
