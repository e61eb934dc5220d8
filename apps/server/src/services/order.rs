//! # Order Service
//!
//! Orders ("comandas") from creation to kitchen to payment.
//!
//! ```text
//!   create ──► add_item / add_items ──► send ──► viewed ──► finish
//!   (draft)        (draft only for        (draft=false)        (finished)
//!                   the batch add)
//! ```
//!
//! Every read returns an [`OrderView`]: the order with the lines that are
//! still owed and their total.

use serde::{Deserialize, Serialize};
use tracing::info;

use comanda_core::validation::{validate_name, validate_quantity};
use comanda_core::{Order, OrderDetail, OrderItem, OrderLine, OrderType};
use comanda_db::{Database, OrderFilter};

use crate::error::{ApiError, ApiResult};

/// An order as the floor sees it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    /// Unpaid lines only.
    pub items: Vec<OrderLine>,
    /// Sum of `items`.
    pub total_cents: i64,
}

impl From<OrderDetail> for OrderView {
    fn from(detail: OrderDetail) -> Self {
        let total_cents = detail.unpaid_total().cents();
        let items = detail.lines.into_iter().filter(|l| !l.is_paid).collect();
        OrderView {
            order: detail.order,
            items,
            total_cents,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    /// Table number, not id.
    pub table: Option<i32>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub command_number: Option<i32>,
    #[serde(default)]
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub product_id: String,
    pub amount: i64,
}

pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    // =========================================================================
    // Creation & items
    // =========================================================================

    /// Opens a draft order. An unknown table number leaves `table_id` unset.
    pub async fn create(&self, input: NewOrder) -> ApiResult<OrderView> {
        let mut order = Order::new(input.order_type);

        if let Some(number) = input.table {
            order.table_number = Some(number);
            order.table_id = self.db.tables().get_by_number(number).await?.map(|t| t.id);
        }
        order.name = non_blank(input.name);
        order.phone = non_blank(input.phone);
        order.command_number = input.command_number;

        self.db.orders().insert(&order).await?;
        info!(
            order_id = %order.id,
            table = ?order.table_number,
            order_type = %order.order_type,
            "Order created"
        );

        self.get(&order.id).await
    }

    pub async fn add_item(&self, order_id: &str, product_id: &str, amount: i64) -> ApiResult<OrderView> {
        validate_quantity(amount)?;
        self.require_order(order_id).await?;
        self.require_product(product_id).await?;

        let item = self.db.orders().add_item(order_id, product_id, amount).await?;
        info!(order_id = %order_id, item_id = %item.id, product_id = %product_id, amount, "Item added");

        self.get(order_id).await
    }

    /// Adds a batch of items to a draft order, all or nothing.
    pub async fn add_items(&self, order_id: &str, items: &[NewItem]) -> ApiResult<OrderView> {
        if items.is_empty() {
            return Err(ApiError::validation("items is required"));
        }
        for item in items {
            validate_quantity(item.amount)?;
        }

        let order = self.require_order(order_id).await?;
        if !order.draft {
            return Err(ApiError::invalid_operation(
                "Cannot add items to an order already sent to the kitchen",
            ));
        }

        for item in items {
            self.require_product(&item.product_id).await?;
        }

        let lines: Vec<(String, i64)> = items
            .iter()
            .map(|i| (i.product_id.clone(), i.amount))
            .collect();
        let added: Vec<OrderItem> = self.db.orders().add_items(order_id, &lines).await?;
        info!(order_id = %order_id, count = added.len(), "Items added");

        self.get(order_id).await
    }

    pub async fn remove_item(&self, item_id: &str) -> ApiResult<()> {
        self.db.orders().remove_item(item_id).await?;
        info!(item_id = %item_id, "Item removed");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// `Some(true)` lists drafts only; anything else lists every order.
    pub async fn list(&self, draft: Option<bool>) -> ApiResult<Vec<OrderView>> {
        let filter = OrderFilter {
            draft: draft.filter(|d| *d),
            ..OrderFilter::default()
        };
        self.list_with(&filter).await
    }

    pub async fn list_by_table(&self, table: i32, phone: Option<String>) -> ApiResult<Vec<OrderView>> {
        let filter = OrderFilter {
            table_number: Some(table),
            phone: non_blank(phone),
            ..OrderFilter::default()
        };
        self.list_with(&filter).await
    }

    /// Exact command number and/or case-insensitive name substring.
    pub async fn search(&self, command: Option<i32>, name: Option<String>) -> ApiResult<Vec<OrderView>> {
        let filter = OrderFilter {
            command_number: command,
            name_contains: non_blank(name),
            ..OrderFilter::default()
        };
        self.list_with(&filter).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<OrderView> {
        self.db
            .orders()
            .get_detail(id)
            .await?
            .map(OrderView::from)
            .ok_or_else(order_not_found)
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Sends the order to the kitchen.
    pub async fn send(&self, id: &str) -> ApiResult<OrderView> {
        self.db.orders().update_flags(id, Some(false), None, None).await?;
        info!(order_id = %id, "Order sent to kitchen");
        self.get(id).await
    }

    pub async fn finish(&self, id: &str) -> ApiResult<OrderView> {
        self.db.orders().update_flags(id, None, Some(true), None).await?;
        info!(order_id = %id, "Order finished");
        self.get(id).await
    }

    pub async fn mark_viewed(&self, id: &str) -> ApiResult<OrderView> {
        self.db.orders().update_flags(id, None, None, Some(true)).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.db.orders().delete(id).await?;
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    // =========================================================================
    // Customer info
    // =========================================================================

    pub async fn update_command_number(&self, id: &str, command: Option<i32>) -> ApiResult<OrderView> {
        let order = self.require_order(id).await?;
        self.db
            .orders()
            .update_info(id, order.name.as_deref(), command)
            .await?;
        self.get(id).await
    }

    /// ## Rules
    /// - `name` with text sets the (trimmed) name, `""` clears it
    /// - a present `command` sets the command number
    /// - both absent clears the command number
    pub async fn update_order_info(
        &self,
        id: &str,
        name: Option<String>,
        command: Option<i32>,
    ) -> ApiResult<OrderView> {
        let order = self.require_order(id).await?;

        let mut new_name = order.name;
        match name.as_deref() {
            Some("") => new_name = None,
            Some(n) if !n.trim().is_empty() => {
                validate_name("name", n)?;
                new_name = Some(n.trim().to_string());
            }
            _ => {}
        }

        let new_command = match (command, &name) {
            (Some(c), _) => Some(c),
            (None, None) => None,
            (None, Some(_)) => order.command_number,
        };

        self.db
            .orders()
            .update_info(id, new_name.as_deref(), new_command)
            .await?;
        self.get(id).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn list_with(&self, filter: &OrderFilter) -> ApiResult<Vec<OrderView>> {
        let details = self.db.orders().list_details(filter).await?;
        Ok(details.into_iter().map(OrderView::from).collect())
    }

    async fn require_order(&self, id: &str) -> ApiResult<Order> {
        self.db.orders().get(id).await?.ok_or_else(order_not_found)
    }

    async fn require_product(&self, id: &str) -> ApiResult<()> {
        match self.db.products().get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!("Product {id} not found"))),
        }
    }
}

fn order_not_found() -> ApiError {
    ApiError::not_found("Order not found")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::table::TableService;
    use crate::services::test_support;
    use comanda_core::new_id;

    fn at_table(table: i32) -> NewOrder {
        NewOrder {
            table: Some(table),
            phone: Some("11999990000".to_string()),
            ..NewOrder::default()
        }
    }

    #[tokio::test]
    async fn test_create_resolves_table() {
        let db = test_support::db().await;
        let table = TableService::new(db.clone()).create(7).await.unwrap();
        let service = OrderService::new(db);

        let view = service.create(at_table(7)).await.unwrap();
        assert_eq!(view.order.table_id.as_deref(), Some(table.id.as_str()));
        assert!(view.order.draft);
        assert_eq!(view.total_cents, 0);

        let view = service.create(at_table(99)).await.unwrap();
        assert_eq!(view.order.table_number, Some(99));
        assert!(view.order.table_id.is_none());
    }

    #[tokio::test]
    async fn test_items_and_totals() {
        let db = test_support::db().await;
        let burger = test_support::product(&db, "X-Burger", 1800).await;
        let soda = test_support::product(&db, "Refri", 600).await;
        let service = OrderService::new(db);

        let order = service.create(at_table(1)).await.unwrap();
        service.add_item(&order.order.id, &burger.id, 2).await.unwrap();
        let view = service
            .add_items(
                &order.order.id,
                &[NewItem {
                    product_id: soda.id.clone(),
                    amount: 3,
                }],
            )
            .await
            .unwrap();

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.total_cents, 2 * 1800 + 3 * 600);

        let err = service.add_item(&order.order.id, &burger.id, 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = service.add_item(&order.order.id, &new_id(), 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = service.add_item(&new_id(), &burger.id, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let item_id = view.items[0].id.clone();
        service.remove_item(&item_id).await.unwrap();
        assert_eq!(service.get(&order.order.id).await.unwrap().items.len(), 1);
        assert_eq!(
            service.remove_item(&item_id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_batch_add_requires_draft_and_is_atomic() {
        let db = test_support::db().await;
        let burger = test_support::product(&db, "X-Burger", 1800).await;
        let service = OrderService::new(db);
        let order = service.create(at_table(1)).await.unwrap();
        let id = order.order.id.clone();

        let err = service
            .add_items(
                &id,
                &[
                    NewItem {
                        product_id: burger.id.clone(),
                        amount: 1,
                    },
                    NewItem {
                        product_id: new_id(),
                        amount: 1,
                    },
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(service.get(&id).await.unwrap().items.is_empty());

        service.send(&id).await.unwrap();
        let err = service
            .add_items(
                &id,
                &[NewItem {
                    product_id: burger.id.clone(),
                    amount: 1,
                }],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOperation);
        assert_eq!(
            err.message,
            "Cannot add items to an order already sent to the kitchen"
        );
    }

    #[tokio::test]
    async fn test_status_changes_and_listing() {
        let service = OrderService::new(test_support::db().await);
        let a = service.create(at_table(3)).await.unwrap().order.id;
        let b = service.create(at_table(3)).await.unwrap().order.id;

        let sent = service.send(&a).await.unwrap();
        assert!(!sent.order.draft);
        assert!(service.mark_viewed(&a).await.unwrap().order.viewed);
        assert!(service.finish(&a).await.unwrap().order.finished);

        let drafts = service.list(Some(true)).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].order.id, b);
        assert_eq!(service.list(Some(false)).await.unwrap().len(), 2);
        assert_eq!(service.list(None).await.unwrap().len(), 2);

        let by_table = service
            .list_by_table(3, Some("11999990000".to_string()))
            .await
            .unwrap();
        assert_eq!(by_table.len(), 2);
        assert!(service
            .list_by_table(3, Some("000".to_string()))
            .await
            .unwrap()
            .is_empty());

        service.delete(&b).await.unwrap();
        assert_eq!(service.get(&b).await.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(service.send(&b).await.unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_order_info_rules() {
        let service = OrderService::new(test_support::db().await);
        let id = service.create(NewOrder::default()).await.unwrap().order.id;

        let view = service
            .update_order_info(&id, Some("  Dona Maria ".to_string()), Some(12))
            .await
            .unwrap();
        assert_eq!(view.order.name.as_deref(), Some("Dona Maria"));
        assert_eq!(view.order.command_number, Some(12));

        // name alone keeps the command
        let view = service
            .update_order_info(&id, Some("Maria".to_string()), None)
            .await
            .unwrap();
        assert_eq!(view.order.command_number, Some(12));

        // empty name clears the name
        let view = service.update_order_info(&id, Some(String::new()), None).await.unwrap();
        assert!(view.order.name.is_none());
        assert_eq!(view.order.command_number, Some(12));

        // nothing at all clears the command
        let view = service.update_order_info(&id, None, None).await.unwrap();
        assert!(view.order.command_number.is_none());

        let view = service.update_command_number(&id, Some(5)).await.unwrap();
        assert_eq!(view.order.command_number, Some(5));
    }

    #[tokio::test]
    async fn test_search() {
        let service = OrderService::new(test_support::db().await);
        service
            .create(NewOrder {
                name: Some("Joaquim".to_string()),
                command_number: Some(40),
                ..NewOrder::default()
            })
            .await
            .unwrap();
        service
            .create(NewOrder {
                name: Some("Ana".to_string()),
                command_number: Some(41),
                ..NewOrder::default()
            })
            .await
            .unwrap();

        assert_eq!(service.search(Some(40), None).await.unwrap().len(), 1);
        assert_eq!(service.search(None, Some("JOA".to_string())).await.unwrap().len(), 1);
        assert_eq!(service.search(Some(41), Some("joa".to_string())).await.unwrap().len(), 0);
        assert_eq!(service.search(None, Some("  ".to_string())).await.unwrap().len(), 2);
    }
}
