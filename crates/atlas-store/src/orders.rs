//! # Order Service
//!
//! Order commands: place an order, move it through its lifecycle, read
//! it back. Every mutation is one atomic commit; status updates re-read
//! the order first so they never clobber a newer version with a stale
//! snapshot.

use std::sync::Arc;
use tracing::{debug, info};

use atlas_core::{
    collections, types::order_total, validation, Operation, Order, OrderItem, OrderStatus,
    RecordMeta,
};

use crate::error::{StoreError, StoreResult};
use crate::store::LocalStore;

// =============================================================================
// Service
// =============================================================================

/// Command/read surface over orders.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<LocalStore>,
}

impl OrderService {
    /// Creates a service over the store.
    pub fn new(store: Arc<LocalStore>) -> Self {
        OrderService { store }
    }

    /// Places an order from validated line items.
    ///
    /// Line totals and the order total are recomputed here from the
    /// frozen unit prices; whatever a cart UI computed is advisory.
    pub async fn create_order(
        &self,
        mut items: Vec<OrderItem>,
        customer_name: Option<String>,
        table_number: Option<u32>,
        notes: Option<String>,
    ) -> StoreResult<Order> {
        validation::validate_order_items(&items)?;

        for item in &mut items {
            item.line_total_cents = item.unit_price_cents * item.quantity;
        }
        let total = order_total(&items);

        let order = Order {
            meta: RecordMeta::generate(),
            items,
            status: OrderStatus::Pending,
            total_cents: total.cents(),
            customer_name,
            table_number,
            notes,
        };

        info!(
            id = %order.meta.id,
            items = order.items.len(),
            total = %order.total(),
            "Placing order"
        );

        self.store
            .commit(vec![Operation::create(
                collections::ORDERS,
                order.meta.id.clone(),
                serde_json::to_value(&order)?,
            )])
            .await?;

        Ok(order)
    }

    /// Moves an order to a new lifecycle status.
    ///
    /// Re-reads the order, bumps the envelope (version +1), and commits
    /// the update with the prior value attached.
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<Order> {
        let current: Order = self
            .store
            .get(collections::ORDERS, order_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collections::ORDERS.to_string(),
                id: order_id.to_string(),
            })?;

        let mut updated = current.clone();
        updated.status = status;
        updated.meta.bump();

        debug!(
            id = %order_id,
            from = ?current.status,
            to = ?status,
            version = updated.meta.version,
            "Updating order status"
        );

        self.store
            .commit(vec![Operation::update(
                collections::ORDERS,
                order_id,
                serde_json::to_value(&updated)?,
                serde_json::to_value(&current)?,
            )])
            .await?;

        Ok(updated)
    }

    /// Gets one order by id.
    pub async fn get(&self, order_id: &str) -> StoreResult<Option<Order>> {
        self.store.get(collections::ORDERS, order_id).await
    }

    /// Lists orders, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<OrderStatus>) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .store
            .query(collections::ORDERS, |o: &Order| {
                status.map_or(true, |s| o.status == s)
            })
            .await?;
        orders.sort_by(|a, b| b.meta.created_at.cmp(&a.meta.created_at));
        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
