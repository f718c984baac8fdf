use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ProductSnapshot;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

/// Lines of one cart, at most one per product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartLines {
    lines: Vec<CartLine>,
}

pub fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::InvalidArgument(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

impl CartLines {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<i32> {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
    }

    /// Adds `quantity` of `product`, merging into an existing line.
    /// On error the lines are left exactly as they were.
    pub fn add(
        &mut self,
        product: &ProductSnapshot,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        validate_quantity(quantity)?;
        if !product.can_supply(quantity) {
            return Err(AppError::Unavailable(
                "Product is not available or has insufficient stock".to_string(),
            ));
        }

        match self.lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => {
                let merged = line
                    .quantity
                    .checked_add(quantity)
                    .filter(|merged| *merged <= product.stock)
                    .ok_or_else(|| {
                        AppError::StockExceeded(
                            "Requested quantity exceeds available stock".to_string(),
                        )
                    })?;
                line.quantity = merged;
            }
            None => self.lines.push(CartLine {
                product_id: product.id,
                quantity,
                added_at: now,
            }),
        }
        Ok(())
    }

    /// Sets the quantity of an existing line to exactly `quantity`.
    pub fn update(&mut self, product: &ProductSnapshot, quantity: i32) -> AppResult<()> {
        validate_quantity(quantity)?;
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
            .ok_or_else(|| AppError::NotFound("Item not found in cart".to_string()))?;

        if quantity > product.stock {
            return Err(AppError::StockExceeded(
                "Requested quantity exceeds available stock".to_string(),
            ));
        }
        line.quantity = quantity;
        Ok(())
    }

    /// Returns whether a line was removed.
    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
