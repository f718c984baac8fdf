#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, Schema, Set,
};
use storefront_api::{
    config::AppConfig,
    domain::{order::ShippingAddress, pricing::discount_percent},
    entity::{
        addresses, audit_logs, cart_items, carts, categories, order_items, orders,
        products::{self, ActiveModel as ProductActive, Model as ProductModel},
    },
    middleware::identity::Identity,
    state::AppState,
};
use uuid::Uuid;

/// Fresh application state over a private in-memory SQLite database.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // One connection keeps every query on the same in-memory database.
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let orm = Database::connect(opts).await?;

    // Parents before children so foreign keys resolve.
    create_table(&orm, categories::Entity).await?;
    create_table(&orm, products::Entity).await?;
    create_table(&orm, carts::Entity).await?;
    create_table(&orm, cart_items::Entity).await?;
    create_table(&orm, orders::Entity).await?;
    create_table(&orm, order_items::Entity).await?;
    create_table(&orm, addresses::Entity).await?;
    create_table(&orm, audit_logs::Entity).await?;

    Ok(AppState::new(orm, AppConfig::with_database_url("sqlite::memory:")))
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let stmt = Schema::new(backend).create_table_from_entity(entity);
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

pub fn shopper() -> Identity {
    Identity::new(Uuid::new_v4())
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let slug = name.to_lowercase().replace(' ', "-");
    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug),
        image: Set(String::new()),
        description: Set(String::new()),
        parent_id: Set(None),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_product(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: i64,
    selling_price: i64,
    stock: i32,
) -> anyhow::Result<ProductModel> {
    let now = Utc::now();
    let slug = name.to_lowercase().replace(' ', "-");
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.clone()),
        description: Set(format!("{name} for tests")),
        category_id: Set(category_id),
        brand: Set("Acme".to_string()),
        price: Set(price),
        selling_price: Set(selling_price),
        discount: Set(discount_percent(price, selling_price)),
        thumbnail: Set(format!("/img/{slug}.png")),
        images: Set(serde_json::json!([])),
        stock: Set(stock),
        is_available: Set(true),
        rating_average: Set(0.0),
        rating_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn set_stock(state: &AppState, product: &ProductModel, stock: i32) -> anyhow::Result<()> {
    let mut active: ProductActive = product.clone().into();
    active.stock = Set(stock);
    active.update(&state.orm).await?;
    Ok(())
}

pub async fn set_available(
    state: &AppState,
    product: &ProductModel,
    is_available: bool,
) -> anyhow::Result<()> {
    let mut active: ProductActive = product.clone().into();
    active.is_available = Set(is_available);
    active.update(&state.orm).await?;
    Ok(())
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = products::Entity::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        phone: "9876543210".into(),
        address_line1: "12 MG Road".into(),
        address_line2: Some("Near the metro".into()),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        postal_code: "560001".into(),
    }
}

/// Stores a bare order under `order_number` so later placements collide with it.
pub async fn insert_order_numbered(
    state: &AppState,
    owner: &Identity,
    order_number: &str,
) -> anyhow::Result<()> {
    let now = Utc::now();
    orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number.to_string()),
        user_id: Set(owner.user_id),
        shipping_address: Set(serde_json::to_value(address())?),
        payment_method: Set("cod".to_string()),
        subtotal: Set(0),
        shipping_charges: Set(0),
        discount: Set(0),
        total_amount: Set(0),
        status: Set("confirmed".to_string()),
        ordered_at: Set(now.into()),
        delivery_date: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn cart_rows(state: &AppState, owner: &Identity) -> anyhow::Result<u64> {
    Ok(carts::Entity::find()
        .filter(carts::Column::UserId.eq(owner.user_id))
        .count(&state.orm)
        .await?)
}
