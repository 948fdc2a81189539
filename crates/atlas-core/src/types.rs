//! # Domain Types
//!
//! Core domain records for Atlas POS: the product catalog and customer
//! orders. Print jobs live in [`crate::job`]; both ride on the record
//! envelope from [`crate::record`].
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Records                                  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │     Order       │   │   OrderItem     │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  meta (env.)    │   │  meta (env.)    │   │  product_id     │        │
//! │  │  name           │   │  items[]        │   │  quantity       │        │
//! │  │  price_cents    │   │  status         │   │  unit_price     │        │
//! │  │  category       │   │  total_cents    │   │  line_total     │        │
//! │  │  available      │   │  customer_name  │   │  requests       │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  All monetary fields are integer cents; [`Money`] wraps them for        │
//! │  arithmetic. Floats never touch money.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::record::RecordMeta;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Record envelope (id, timestamps, version, tombstone).
    #[serde(flatten)]
    pub meta: RecordMeta,

    /// Display name shown in the catalog and on tickets.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Catalog category ("coffee", "pastry", ...).
    pub category: String,

    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the product can currently be ordered.
    pub available: bool,
}

impl Product {
    /// Returns the price as a Money value.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Where an order is in its kitchen/service lifecycle.
///
/// This is DOMAIN state. Sync never touches it: an order stays
/// `pending` locally until a user command moves it, regardless of how
/// many times its creating transaction is pushed or retried remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet picked up by the kitchen.
    Pending,
    /// Being prepared.
    Preparing,
    /// Ready for pickup/serving.
    Ready,
    /// Served and closed out.
    Completed,
    /// Cancelled before completion.
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// A line item in an order.
///
/// Prices are snapshotted at order time so later catalog edits don't
/// rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// The ordered product.
    pub product_id: String,

    /// Product name at order time (frozen).
    pub name: String,

    /// Quantity ordered.
    pub quantity: i64,

    /// Unit price in cents at order time (frozen).
    pub unit_price_cents: i64,

    /// Line total (unit price × quantity).
    pub line_total_cents: i64,

    /// Customization option ids chosen for this line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<String>,

    /// Free-text requests ("no onions").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

impl OrderItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Record envelope (id, timestamps, version, tombstone).
    #[serde(flatten)]
    pub meta: RecordMeta,

    /// Ordered line items.
    pub items: Vec<OrderItem>,

    /// Kitchen/service status.
    pub status: OrderStatus,

    /// Order total in cents.
    pub total_cents: i64,

    /// Customer name for pickup calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    /// Table number for dine-in orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,

    /// Order-level notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Sums line totals into an order total.
pub fn order_total(items: &[OrderItem]) -> Money {
    items.iter().map(OrderItem::line_total).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
