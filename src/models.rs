use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::order::{OrderStatus, PaymentMethod, ShippingAddress},
    entity::{addresses, categories, products},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub description: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category_id: Uuid,
    pub brand: String,
    pub price: i64,
    pub selling_price: i64,
    pub discount: i32,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub is_available: bool,
    pub in_stock: bool,
    pub rating_average: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Product fields joined into each cart line on read.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartProduct {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub brand: String,
    pub thumbnail: String,
    pub price: i64,
    pub selling_price: i64,
    pub discount: i32,
    pub stock: i32,
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product: CartProduct,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: i64,
    pub shipping_charges: i64,
    pub discount: i64,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub ordered_at: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub thumbnail: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            image: model.image,
            description: model.description,
            parent_id: model.parent_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            in_stock: model.stock > 0 && model.is_available,
            images: serde_json::from_value(model.images).unwrap_or_default(),
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            category_id: model.category_id,
            brand: model.brand,
            price: model.price,
            selling_price: model.selling_price,
            discount: model.discount,
            thumbnail: model.thumbnail,
            stock: model.stock,
            is_available: model.is_available,
            rating_average: model.rating_average,
            rating_count: model.rating_count,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<&products::Model> for CartProduct {
    fn from(model: &products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            slug: model.slug.clone(),
            brand: model.brand.clone(),
            thumbnail: model.thumbnail.clone(),
            price: model.price,
            selling_price: model.selling_price,
            discount: model.discount,
            stock: model.stock,
            is_available: model.is_available,
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            phone: model.phone,
            address_line1: model.address_line1,
            address_line2: model.address_line2,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            is_default: model.is_default,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
