use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    domain::{
        ProductSnapshot,
        cart::{CartLine, CartLines, validate_quantity},
        pricing::PricingPolicy,
    },
    dto::cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::identity::Identity,
    models::{CartItem, CartProduct},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_cart(state: &AppState, identity: &Identity) -> AppResult<ApiResponse<CartView>> {
    let cart = find_or_create_cart(&state.orm, identity.user_id).await?;
    let view = load_view(&state.orm, &state.config.pricing, cart.id).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

pub async fn add_item(
    state: &AppState,
    identity: &Identity,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartView>> {
    validate_quantity(payload.quantity)?;
    let _guard = state.cart_locks.acquire(identity.user_id).await;

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(product_not_found)?;

    // The cart row is only created once the line is known to be valid.
    let existing = find_cart(&txn, identity.user_id).await?;
    let mut lines = match &existing {
        Some(cart) => load_lines(&txn, cart.id).await?,
        None => CartLines::default(),
    };
    lines.add(&ProductSnapshot::from(&product), payload.quantity, Utc::now())?;

    let cart = match existing {
        Some(cart) => cart,
        None => insert_cart(&txn, identity.user_id).await?,
    };
    let cart_id = cart.id;
    save_lines(&txn, cart, &lines).await?;
    txn.commit().await?;

    tracing::debug!(
        user_id = %identity.user_id,
        product_id = %payload.product_id,
        quantity = payload.quantity,
        "cart item added"
    );
    if let Err(err) = log_audit(
        state,
        Some(identity.user_id),
        "cart_add",
        Some("carts"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let view = load_view(&state.orm, &state.config.pricing, cart_id).await?;
    Ok(ApiResponse::success("Item added to cart", view, Some(Meta::empty())))
}

pub async fn update_item(
    state: &AppState,
    identity: &Identity,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartView>> {
    validate_quantity(payload.quantity)?;
    let _guard = state.cart_locks.acquire(identity.user_id).await;

    let cart = find_cart(&state.orm, identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;
    let cart_id = cart.id;
    let txn = state.orm.begin().await?;

    let mut lines = load_lines(&txn, cart_id).await?;
    if lines.quantity_of(payload.product_id).is_none() {
        return Err(AppError::NotFound("Item not found in cart".to_string()));
    }
    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(product_not_found)?;

    lines.update(&ProductSnapshot::from(&product), payload.quantity)?;
    save_lines(&txn, cart, &lines).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        state,
        Some(identity.user_id),
        "cart_update",
        Some("carts"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let view = load_view(&state.orm, &state.config.pricing, cart_id).await?;
    Ok(ApiResponse::success("Cart updated", view, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    identity: &Identity,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let _guard = state.cart_locks.acquire(identity.user_id).await;

    let cart = find_or_create_cart(&state.orm, identity.user_id).await?;
    let cart_id = cart.id;
    let txn = state.orm.begin().await?;
    let mut lines = load_lines(&txn, cart_id).await?;
    let removed = lines.remove(product_id);
    if removed {
        save_lines(&txn, cart, &lines).await?;
    }
    txn.commit().await?;

    if removed {
        if let Err(err) = log_audit(
            state,
            Some(identity.user_id),
            "cart_remove",
            Some("carts"),
            Some(serde_json::json!({ "product_id": product_id })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }
    }

    let view = load_view(&state.orm, &state.config.pricing, cart_id).await?;
    Ok(ApiResponse::success("Item removed from cart", view, Some(Meta::empty())))
}

pub async fn clear_cart(state: &AppState, identity: &Identity) -> AppResult<ApiResponse<CartView>> {
    let _guard = state.cart_locks.acquire(identity.user_id).await;

    if let Some(cart) = find_cart(&state.orm, identity.user_id).await? {
        let txn = state.orm.begin().await?;
        let mut lines = load_lines(&txn, cart.id).await?;
        if !lines.is_empty() {
            lines.clear();
            save_lines(&txn, cart, &lines).await?;
        }
        txn.commit().await?;
    }

    Ok(ApiResponse::success("Cart cleared", CartView::empty(), Some(Meta::empty())))
}

pub(crate) async fn find_cart<C: ConnectionTrait>(db: &C, owner: Uuid) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(owner))
        .one(db)
        .await?)
}

/// Carts are created lazily; a concurrent creator losing the unique race re-reads the winner's row.
async fn find_or_create_cart(db: &DatabaseConnection, owner: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(db, owner).await? {
        return Ok(cart);
    }

    match insert_cart(db, owner).await {
        Ok(cart) => Ok(cart),
        Err(AppError::OrmError(err))
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            find_cart(db, owner).await?.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("cart for {owner} vanished after conflict"))
            })
        }
        Err(err) => Err(err),
    }
}

async fn insert_cart<C: ConnectionTrait>(db: &C, owner: Uuid) -> AppResult<CartModel> {
    let now = Utc::now();
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;
    tracing::debug!(user_id = %owner, cart_id = %cart.id, "cart created");
    Ok(cart)
}

pub(crate) async fn load_lines<C: ConnectionTrait>(db: &C, cart_id: Uuid) -> AppResult<CartLines> {
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::AddedAt)
        .all(db)
        .await?
        .into_iter()
        .map(|row| CartLine {
            product_id: row.product_id,
            quantity: row.quantity,
            added_at: row.added_at.with_timezone(&Utc),
        })
        .collect();
    Ok(CartLines::new(lines))
}

/// Pairs each line with the current product row. Lines whose product no longer exists are dropped.
pub(crate) async fn join_products<C: ConnectionTrait>(
    db: &C,
    lines: CartLines,
) -> AppResult<Vec<(CartLine, ProductModel)>> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = lines.lines().iter().map(|line| line.product_id).collect();
    let mut products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    Ok(lines
        .into_lines()
        .into_iter()
        .filter_map(|line| {
            let product = products.remove(&line.product_id)?;
            Some((line, product))
        })
        .collect())
}

/// Whole-cart save: the stored lines are replaced by `lines`.
async fn save_lines<C: ConnectionTrait>(db: &C, cart: CartModel, lines: &CartLines) -> AppResult<()> {
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(db)
        .await?;

    if !lines.is_empty() {
        let rows = lines.lines().iter().map(|line| CartItemActive {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            added_at: Set(line.added_at.into()),
        });
        CartItems::insert_many(rows).exec(db).await?;
    }

    let mut active: CartActive = cart.into();
    active.updated_at = Set(Utc::now().into());
    active.update(db).await?;
    Ok(())
}

async fn load_view<C: ConnectionTrait>(
    db: &C,
    policy: &PricingPolicy,
    cart_id: Uuid,
) -> AppResult<CartView> {
    let lines = load_lines(db, cart_id).await?;
    let joined = join_products(db, lines).await?;
    Ok(build_view(policy, &joined))
}

fn build_view(policy: &PricingPolicy, joined: &[(CartLine, ProductModel)]) -> CartView {
    let snapshots: Vec<(ProductSnapshot, i32)> = joined
        .iter()
        .map(|(line, product)| (ProductSnapshot::from(product), line.quantity))
        .collect();
    let summary = policy.summarize(snapshots.iter().map(|(product, quantity)| (product, *quantity)));

    let items = joined
        .iter()
        .map(|(line, product)| CartItem {
            product: CartProduct::from(product),
            quantity: line.quantity,
            added_at: line.added_at,
        })
        .collect();

    CartView { items, summary }
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}
