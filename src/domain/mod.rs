//! Pure cart, pricing and order rules. Nothing in here touches the database;
//! services load rows, hand them to these types and persist the outcome.

pub mod cart;
pub mod order;
pub mod pricing;

use uuid::Uuid;

use crate::entity::products;

/// The slice of a catalog product the pricing and checkout rules look at.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub thumbnail: String,
    pub price: i64,
    pub selling_price: i64,
    pub stock: i32,
    pub is_available: bool,
}

impl ProductSnapshot {
    pub fn can_supply(&self, quantity: i32) -> bool {
        self.is_available && self.stock >= quantity
    }
}

impl From<&products::Model> for ProductSnapshot {
    fn from(model: &products::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            thumbnail: model.thumbnail.clone(),
            price: model.price,
            selling_price: model.selling_price,
            stock: model.stock,
            is_available: model.is_available,
        }
    }
}

#[cfg(test)]
pub(crate) fn snapshot(price: i64, selling_price: i64, stock: i32) -> ProductSnapshot {
    ProductSnapshot {
        id: Uuid::new_v4(),
        name: "Test Product".into(),
        thumbnail: "https://img.example.com/p.png".into(),
        price,
        selling_price,
        stock,
        is_available: true,
    }
}
