//! Order repository: placement, tracking, fulfilment and reporting.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use solera_core::checkout::normalize_phone;
use solera_core::pagination::{Page, Paginated};
use solera_core::pricing::{self, LineItem};
use solera_core::{
    AdminUserId, OrderId, OrderStatus, PaymentStatus, TrackingToken, UserId, VariantId,
};

use crate::RepositoryError;
use crate::models::order::format_order_number;
use crate::models::{
    Coupon, DashboardStats, NewOrder, Order, OrderDetail, OrderItem, OrderSummary,
    PlaceOrderError, PlacedOrder, ShipmentInfo, StatusHistoryEntry, StatusUpdateError,
};
use crate::repos::contains_pattern;
use crate::repos::coupons::normalize_code;

const ORDER_COLUMNS: &str = "id, order_number, tracking_token, user_id, email, full_name, phone, \
     city, district, address_line, postal_code, note, status, payment_method, payment_status, \
     subtotal, discount, shipping, total, currency, coupon_code, carrier, tracking_number, \
     paid_at, shipped_at, delivered_at, created_at, updated_at";

const SUMMARY_SELECT: &str = "SELECT o.id, o.order_number, o.tracking_token, o.full_name, \
     o.email, o.status, o.payment_status, o.total, o.currency, \
     COALESCE((SELECT SUM(oi.quantity) FROM shop.order_item oi WHERE oi.order_id = o.id), 0)::BIGINT \
       AS item_count, \
     o.created_at \
     FROM shop.order o";

/// Locked variant row used while placing an order.
#[derive(Debug, sqlx::FromRow)]
struct LockedVariant {
    id: VariantId,
    sku: String,
    size: String,
    color: String,
    stock: i32,
    unit_price: Decimal,
    product_name: String,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order in a single transaction.
    ///
    /// Variant rows are locked `FOR UPDATE` so two customers cannot both buy
    /// the last pair. Prices come from the database, never from the caller.
    ///
    /// # Errors
    ///
    /// - `PlaceOrderError::EmptyCart` if there are no lines
    /// - `PlaceOrderError::VariantUnavailable` if a variant is missing or
    ///   inactive
    /// - `PlaceOrderError::OutOfStock` if a line asks for more than is left
    /// - `PlaceOrderError::Coupon` if the coupon does not apply
    /// - `PlaceOrderError::Repository` for database errors
    #[tracing::instrument(skip(self, order), fields(lines = order.lines.len()))]
    pub async fn place(&self, order: &NewOrder) -> Result<PlacedOrder, PlaceOrderError> {
        // Merge duplicate lines so each variant is checked against stock once.
        let mut quantities: Vec<(VariantId, u32)> = Vec::new();
        for line in order.lines.iter().filter(|l| l.quantity > 0) {
            match quantities.iter_mut().find(|(id, _)| *id == line.variant_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => quantities.push((line.variant_id, line.quantity)),
            }
        }
        if quantities.is_empty() {
            return Err(PlaceOrderError::EmptyCart);
        }

        let mut tx = self.pool.begin().await?;

        let ids: Vec<i32> = quantities.iter().map(|(id, _)| id.as_i32()).collect();
        let locked: HashMap<VariantId, LockedVariant> = sqlx::query_as::<_, LockedVariant>(
            "SELECT v.id, v.sku, v.size, v.color, v.stock,
                    COALESCE(v.price, p.base_price) AS unit_price,
                    p.name AS product_name
             FROM shop.product_variant v
             JOIN shop.product p ON p.id = v.product_id
             WHERE v.id = ANY($1) AND v.is_active AND p.is_active
             ORDER BY v.id
             FOR UPDATE OF v",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

        let mut items = Vec::with_capacity(quantities.len());
        for (variant_id, quantity) in &quantities {
            let variant = locked
                .get(variant_id)
                .ok_or(PlaceOrderError::VariantUnavailable(*variant_id))?;
            if i64::from(variant.stock) < i64::from(*quantity) {
                return Err(PlaceOrderError::OutOfStock {
                    sku: variant.sku.clone(),
                    available: variant.stock,
                });
            }
            items.push(LineItem {
                variant_id: *variant_id,
                unit_price: variant.unit_price,
                quantity: *quantity,
            });
        }

        let coupon = match order.coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let coupon = sqlx::query_as::<_, Coupon>(
                    "SELECT id, code, kind, value, min_subtotal, max_discount, usage_limit,
                            used_count, starts_at, ends_at, is_active, created_at
                     FROM shop.coupon WHERE UPPER(code) = $1
                     FOR UPDATE",
                )
                .bind(normalize_code(code))
                .fetch_optional(&mut *tx)
                .await?;
                Some(coupon.ok_or(PlaceOrderError::Coupon(
                    solera_core::pricing::CouponError::NotFound,
                ))?)
            }
            _ => None,
        };

        let rule = coupon.as_ref().map(Coupon::rule);
        let totals = pricing::price_cart(&items, rule.as_ref(), &order.shipping, Utc::now());
        if let Some(err) = totals.coupon_error {
            return Err(PlaceOrderError::Coupon(err));
        }

        for item in &items {
            sqlx::query("UPDATE shop.product_variant SET stock = stock - $2 WHERE id = $1")
                .bind(item.variant_id)
                .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
                .execute(&mut *tx)
                .await?;
        }

        let seq: i64 = sqlx::query_scalar("SELECT nextval('shop.order_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let order_number = format_order_number(Utc::now().date_naive(), seq);
        let tracking_token = TrackingToken::generate();
        let phone = normalize_phone(&order.contact.phone)
            .unwrap_or_else(|| order.contact.phone.trim().to_owned());
        let status = OrderStatus::default();

        let order_id: OrderId = sqlx::query_scalar(
            "INSERT INTO shop.order
                (order_number, tracking_token, user_id, email, full_name, phone,
                 city, district, address_line, postal_code, note, status,
                 payment_method, payment_status, subtotal, discount, shipping, total,
                 currency, coupon_code)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18, $19, $20)
             RETURNING id",
        )
        .bind(&order_number)
        .bind(&tracking_token)
        .bind(order.user_id)
        .bind(order.contact.email.trim())
        .bind(order.contact.full_name.trim())
        .bind(&phone)
        .bind(order.address.city.trim())
        .bind(order.address.district.trim())
        .bind(order.address.address_line.trim())
        .bind(order.address.postal_code.trim())
        .bind(order.note.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .bind(status)
        .bind(order.payment_method)
        .bind(order.payment_method.initial_payment_status())
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.shipping)
        .bind(totals.total)
        .bind(order.currency.code())
        .bind(coupon.as_ref().map(|c| c.code.clone()))
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            let Some(variant) = locked.get(&item.variant_id) else {
                continue;
            };
            sqlx::query(
                "INSERT INTO shop.order_item
                    (order_id, variant_id, product_name, sku, size, color,
                     unit_price, quantity, line_total)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(order_id)
            .bind(item.variant_id)
            .bind(&variant.product_name)
            .bind(&variant.sku)
            .bind(&variant.size)
            .bind(&variant.color)
            .bind(item.unit_price)
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .bind(item.line_total())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO shop.order_status_history (order_id, status, note)
             VALUES ($1, $2, 'Order placed')",
        )
        .bind(order_id)
        .bind(status)
        .execute(&mut *tx)
        .await?;

        if let Some(coupon) = &coupon
            && totals.discount > Decimal::ZERO
        {
            sqlx::query("UPDATE shop.coupon SET used_count = used_count + 1 WHERE id = $1")
                .bind(coupon.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            order_number = %order_number,
            total = %totals.total,
            "order placed"
        );

        Ok(PlacedOrder {
            id: order_id,
            order_number,
            tracking_token,
            total: totals.total,
        })
    }

    async fn load_detail(&self, order: Order) -> Result<OrderDetail, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, variant_id, product_name, sku, size, color,
                    unit_price, quantity, line_total
             FROM shop.order_item WHERE order_id = $1 ORDER BY id",
        )
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        let history = sqlx::query_as::<_, StatusHistoryEntry>(
            "SELECT h.status, h.note, a.name AS admin_name, h.created_at
             FROM shop.order_status_history h
             LEFT JOIN admin.admin_user a ON a.id = h.admin_user_id
             WHERE h.order_id = $1
             ORDER BY h.created_at, h.id",
        )
        .bind(order.id)
        .fetch_all(self.pool)
        .await?;

        Ok(OrderDetail {
            order,
            items,
            history,
        })
    }

    /// Order by its tracking token, for the confirmation and tracking pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_tracking_token(
        &self,
        token: &TrackingToken,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE tracking_token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => Ok(Some(self.load_detail(order).await?)),
            None => Ok(None),
        }
    }

    /// Tracking token for an order number and the email it was placed with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_tracking_token(
        &self,
        order_number: &str,
        email: &str,
    ) -> Result<Option<TrackingToken>, RepositoryError> {
        let token: Option<String> = sqlx::query_scalar(
            "SELECT tracking_token FROM shop.order
             WHERE order_number = $1 AND LOWER(email) = LOWER($2)",
        )
        .bind(order_number.trim().to_uppercase())
        .bind(email.trim())
        .fetch_optional(self.pool)
        .await?;

        token
            .map(|t| {
                TrackingToken::parse(&t).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid tracking token: {e}"))
                })
            })
            .transpose()
    }

    /// Order by ID with lines and history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match order {
            Some(order) => Ok(Some(self.load_detail(order).await?)),
            None => Ok(None),
        }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            "{SUMMARY_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Admin order listing with an optional status filter and free-text
    /// search on order number, name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        q: Option<&str>,
        page: Page,
    ) -> Result<Paginated<OrderSummary>, RepositoryError> {
        let pattern = contains_pattern(q);
        let filter = "($1::shop.order_status IS NULL OR o.status = $1)
             AND ($2::TEXT IS NULL OR o.order_number ILIKE $2
                  OR o.full_name ILIKE $2 OR o.email ILIKE $2)";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM shop.order o WHERE {filter}"))
                .bind(status)
                .bind(&pattern)
                .fetch_one(self.pool)
                .await?;

        let items = sqlx::query_as::<_, OrderSummary>(&format!(
            "{SUMMARY_SELECT} WHERE {filter}
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(status)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated::new(items, page, total))
    }

    /// Move an order to a new status.
    ///
    /// The move is validated against the order lifecycle, recorded in the
    /// history, and has these side effects:
    /// - `Cancelled` puts every line's quantity back into stock
    /// - `Shipped` stamps `shipped_at` and stores carrier details
    /// - `Delivered` stamps `delivered_at`
    /// - `Refunded` marks a paid order's payment as refunded
    ///
    /// # Errors
    ///
    /// Returns `StatusUpdateError::Transition` for a disallowed move and
    /// `StatusUpdateError::Repository` with `NotFound` for an unknown order.
    #[tracing::instrument(skip(self, note, shipment))]
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
        note: Option<&str>,
        admin: Option<AdminUserId>,
        shipment: &ShipmentInfo,
    ) -> Result<Order, StatusUpdateError> {
        let mut tx = self.pool.begin().await?;

        let current: OrderStatus =
            sqlx::query_scalar("SELECT status FROM shop.order WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let next = current.transition(next)?;

        if next.releases_stock() {
            sqlx::query(
                "UPDATE shop.product_variant v
                 SET stock = v.stock + oi.quantity
                 FROM shop.order_item oi
                 WHERE oi.order_id = $1 AND oi.variant_id = v.id",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let carrier = shipment
            .carrier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let tracking_number = shipment
            .tracking_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE shop.order SET
                status = $2,
                shipped_at = CASE WHEN $2 = 'SHIPPED' THEN NOW() ELSE shipped_at END,
                delivered_at = CASE WHEN $2 = 'DELIVERED' THEN NOW() ELSE delivered_at END,
                carrier = CASE WHEN $2 = 'SHIPPED' THEN COALESCE($3, carrier) ELSE carrier END,
                tracking_number = CASE WHEN $2 = 'SHIPPED'
                    THEN COALESCE($4, tracking_number) ELSE tracking_number END,
                payment_status = CASE WHEN $2 = 'REFUNDED' AND payment_status = 'PAID'
                    THEN 'REFUNDED'::shop.payment_status ELSE payment_status END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .bind(carrier)
        .bind(tracking_number)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO shop.order_status_history (order_id, status, note, admin_user_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(next)
        .bind(note.map(str::trim).filter(|n| !n.is_empty()))
        .bind(admin)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, from = %current, to = %next, "order status changed");
        Ok(order)
    }

    /// Record payment for an order that is awaiting or failed payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist or is
    /// already paid or refunded.
    pub async fn mark_paid(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.order
             SET payment_status = $2, paid_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND payment_status IN ('PENDING', 'FAILED')",
        )
        .bind(id)
        .bind(PaymentStatus::Paid)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Headline numbers for the admin dashboard. Cancelled and refunded orders
    /// do not count towards revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            "SELECT
                COUNT(*) FILTER (WHERE o.created_at >= date_trunc('day', NOW())) AS orders_today,
                COALESCE(SUM(o.total) FILTER (
                    WHERE o.created_at >= date_trunc('day', NOW())
                      AND o.status NOT IN ('CANCELLED', 'REFUNDED')), 0) AS revenue_today,
                COALESCE(SUM(o.total) FILTER (
                    WHERE o.created_at >= NOW() - INTERVAL '30 days'
                      AND o.status NOT IN ('CANCELLED', 'REFUNDED')), 0) AS revenue_30d,
                COUNT(*) FILTER (WHERE o.created_at >= NOW() - INTERVAL '30 days') AS orders_30d,
                COUNT(*) FILTER (WHERE o.status = 'PENDING') AS pending_orders,
                COUNT(*) FILTER (
                    WHERE o.payment_status = 'PENDING'
                      AND o.status NOT IN ('CANCELLED', 'REFUNDED')) AS awaiting_payment,
                (SELECT COUNT(*) FROM shop.user) AS customers,
                (SELECT COUNT(*) FROM shop.product WHERE is_active) AS active_products
             FROM shop.order o",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }
}
