use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{domain::order::ShippingAddress, models::Address};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddAddressRequest {
    #[serde(flatten)]
    pub address: ShippingAddress,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}

/// The resolved identity and what is stored for it.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub addresses: Vec<Address>,
}
