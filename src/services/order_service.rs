use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use rand::{Rng, SeedableRng, rngs::StdRng};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{
        ProductSnapshot,
        order::{
            OrderDraft, OrderLineSnapshot, OrderStatus, PaymentMethod, ShippingAddress,
            estimate_delivery, generate_order_number,
        },
    },
    dto::orders::{OrderList, OrderWithItems, PlaceOrderRequest, PlacedOrder, UpdateOrderStatusRequest},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::identity::Identity,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service::{find_cart, join_products, load_lines},
    state::AppState,
};

/// Attempts at drawing an unused order number before giving up.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

pub async fn place_order(
    state: &AppState,
    identity: &Identity,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    let mut rng = StdRng::from_entropy();
    place_order_with_rng(state, identity, payload, &mut rng).await
}

/// `place_order` drawing order numbers and delivery estimates from `rng`.
pub async fn place_order_with_rng<R: Rng + Send>(
    state: &AppState,
    identity: &Identity,
    payload: PlaceOrderRequest,
    rng: &mut R,
) -> AppResult<ApiResponse<PlacedOrder>> {
    payload.shipping_address.validate()?;
    payload.payment_method.ensure_supported()?;

    // Holding the cart lock keeps the cart stable between validation and clearing.
    let _guard = state.cart_locks.acquire(identity.user_id).await;

    let cart = find_cart(&state.orm, identity.user_id)
        .await?
        .ok_or_else(|| AppError::InvalidState("Cart is empty".to_string()))?;

    let txn = state.orm.begin().await?;
    let lines = load_lines(&txn, cart.id).await?;
    let priced: Vec<(ProductSnapshot, i32)> = join_products(&txn, lines)
        .await?
        .iter()
        .map(|(line, product)| (ProductSnapshot::from(product), line.quantity))
        .collect();
    let draft = OrderDraft::prepare(&state.config.pricing, &priced)?;

    let ordered_at = Utc::now();
    let delivery_date = estimate_delivery(ordered_at, &mut *rng);
    let order = insert_order(
        &txn,
        &mut *rng,
        NewOrder {
            user_id: identity.user_id,
            shipping_address: &payload.shipping_address,
            payment_method: payload.payment_method,
            draft: &draft,
            ordered_at,
            delivery_date,
        },
    )
    .await?;

    let rows = draft.lines.iter().map(|line| OrderItemActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        product_id: Set(line.product_id),
        name: Set(line.name.clone()),
        thumbnail: Set(line.thumbnail.clone()),
        price: Set(line.unit_price),
        quantity: Set(line.quantity),
    });
    OrderItems::insert_many(rows).exec(&txn).await?;

    for line in &draft.lines {
        take_stock(&txn, line).await?;
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %identity.user_id,
        order_number = %order.order_number,
        total = order.total_amount,
        "order placed"
    );
    if let Err(err) = log_audit(
        state,
        Some(identity.user_id),
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({ "order_number": order.order_number, "total": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed successfully",
        PlacedOrder {
            order_number: order.order_number,
            total_amount: order.total_amount,
            estimated_delivery: delivery_date,
            status: OrderStatus::Confirmed,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    identity: &Identity,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(identity.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::OrderedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::OrderedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if !ids.is_empty() {
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .all(&state.orm)
            .await?
        {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(order_item_from_entity(item));
        }
    }

    let items = orders
        .into_iter()
        .map(|order| {
            let lines = items_by_order.remove(&order.id).unwrap_or_default();
            Ok(OrderWithItems {
                order: order_from_entity(order)?,
                items: lines,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    identity: &Identity,
    order_number: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(identity.user_id))
                .add(OrderCol::OrderNumber.eq(order_number)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(order_not_found)?;

    let items = order_items(&state.orm, order.id)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    identity: &Identity,
    order_number: &str,
) -> AppResult<ApiResponse<Order>> {
    let order = transition_order(
        state,
        Some(identity.user_id),
        order_number,
        OrderStatus::Cancelled,
    )
    .await?;
    Ok(ApiResponse::success("Order cancelled", order, Some(Meta::empty())))
}

/// Operator-facing status change; not scoped to an identity.
pub async fn update_order_status(
    state: &AppState,
    order_number: &str,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = transition_order(state, None, order_number, payload.status).await?;
    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

async fn transition_order(
    state: &AppState,
    owner: Option<Uuid>,
    order_number: &str,
    target: OrderStatus,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;

    let mut condition = Condition::all().add(OrderCol::OrderNumber.eq(order_number));
    if let Some(owner) = owner {
        condition = condition.add(OrderCol::UserId.eq(owner));
    }
    let order = Orders::find()
        .filter(condition)
        .one(&txn)
        .await?
        .ok_or_else(order_not_found)?;

    let current = stored_status(&order)?;
    let next = current.transition_to(target)?;
    let now = Utc::now();

    // Compare-and-set on the old status so two concurrent transitions cannot both apply.
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now.fixed_offset()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq(current.as_str()))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::InvalidState(
            "Order status changed concurrently, retry".to_string(),
        ));
    }

    if next == OrderStatus::Cancelled {
        for item in order_items(&txn, order.id).await? {
            Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
                .filter(ProdCol::Id.eq(item.product_id))
                .exec(&txn)
                .await?;
        }
    }

    txn.commit().await?;

    tracing::info!(
        order_number = %order.order_number,
        from = %current,
        to = %next,
        "order status changed"
    );
    if let Err(err) = log_audit(
        state,
        owner,
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_number": order.order_number, "from": current, "to": next })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let mut updated = order_from_entity(order)?;
    updated.status = next;
    updated.updated_at = now;
    Ok(updated)
}

struct NewOrder<'a> {
    user_id: Uuid,
    shipping_address: &'a ShippingAddress,
    payment_method: PaymentMethod,
    draft: &'a OrderDraft,
    ordered_at: DateTime<Utc>,
    delivery_date: DateTime<Utc>,
}

/// Inserts the order under a fresh order number, drawing a new one when the
/// unique index reports a collision. Each attempt runs in its own savepoint so
/// a collision does not poison the enclosing transaction.
async fn insert_order<R: Rng + Send>(
    txn: &DatabaseTransaction,
    rng: &mut R,
    new: NewOrder<'_>,
) -> AppResult<OrderModel> {
    let shipping_address = serde_json::to_value(new.shipping_address)
        .map_err(|err| AppError::Internal(err.into()))?;

    for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
        let order_number = generate_order_number(new.ordered_at, &mut *rng);
        let savepoint = txn.begin().await?;
        let inserted = OrderActive {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            user_id: Set(new.user_id),
            shipping_address: Set(shipping_address.clone()),
            payment_method: Set(new.payment_method.as_str().to_string()),
            subtotal: Set(new.draft.summary.subtotal),
            shipping_charges: Set(new.draft.summary.shipping_charges),
            discount: Set(new.draft.summary.discount),
            total_amount: Set(new.draft.summary.total),
            status: Set(OrderStatus::Confirmed.as_str().to_string()),
            ordered_at: Set(new.ordered_at.into()),
            delivery_date: Set(new.delivery_date.into()),
            updated_at: Set(new.ordered_at.into()),
        }
        .insert(&savepoint)
        .await;

        match inserted {
            Ok(order) => {
                savepoint.commit().await?;
                return Ok(order);
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::warn!(%order_number, attempt, "order number collision, drawing another");
                savepoint.rollback().await?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "no unused order number after {MAX_ORDER_NUMBER_ATTEMPTS} attempts"
    )))
}

/// Conditional decrement: only succeeds while the product is available and has enough stock.
/// Callers run it inside the order transaction so a refusal rolls the whole order back.
pub async fn take_stock<C: ConnectionTrait>(db: &C, line: &OrderLineSnapshot) -> AppResult<()> {
    let result = Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
        .filter(ProdCol::Id.eq(line.product_id))
        .filter(ProdCol::IsAvailable.eq(true))
        .filter(ProdCol::Stock.gte(line.quantity))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(product_id = %line.product_id, quantity = line.quantity, "stock decrement refused");
        return Err(AppError::Unavailable(format!(
            "{} is not available or has insufficient stock",
            line.name
        )));
    }
    Ok(())
}

async fn order_items<C: ConnectionTrait>(db: &C, order_id: Uuid) -> AppResult<Vec<OrderItemModel>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(db)
        .await?)
}

fn stored_status(order: &OrderModel) -> AppResult<OrderStatus> {
    order.status.parse().map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "order {} has unknown status {}",
            order.order_number,
            order.status
        ))
    })
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    let status = stored_status(&model)?;
    let payment_method = model.payment_method.parse::<PaymentMethod>().map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "order {} has unknown payment method {}",
            model.order_number,
            model.payment_method
        ))
    })?;
    let shipping_address: ShippingAddress = serde_json::from_value(model.shipping_address)
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(Order {
        id: model.id,
        order_number: model.order_number,
        user_id: model.user_id,
        shipping_address,
        payment_method,
        subtotal: model.subtotal,
        shipping_charges: model.shipping_charges,
        discount: model.discount,
        total_amount: model.total_amount,
        status,
        ordered_at: model.ordered_at.with_timezone(&Utc),
        delivery_date: model.delivery_date.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        product_id: model.product_id,
        name: model.name,
        thumbnail: model.thumbnail,
        price: model.price,
        quantity: model.quantity,
    }
}
