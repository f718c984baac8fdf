use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    dto::addresses::{AddAddressRequest, AddressList, UserProfile},
    entity::addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
    error::AppResult,
    middleware::identity::Identity,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_addresses(
    state: &AppState,
    identity: &Identity,
) -> AppResult<ApiResponse<AddressList>> {
    let items = addresses_for(&state.orm, identity.user_id).await?;
    Ok(ApiResponse::success("OK", AddressList { items }, Some(Meta::empty())))
}

pub async fn add_address(
    state: &AppState,
    identity: &Identity,
    payload: AddAddressRequest,
) -> AppResult<ApiResponse<AddressList>> {
    payload.address.validate()?;
    let address = payload.address;

    let txn = state.orm.begin().await?;
    if payload.is_default {
        Addresses::update_many()
            .col_expr(AddressCol::IsDefault, Expr::value(false))
            .filter(AddressCol::UserId.eq(identity.user_id))
            .exec(&txn)
            .await?;
    }

    AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(identity.user_id),
        full_name: Set(address.full_name),
        phone: Set(address.phone),
        address_line1: Set(address.address_line1),
        address_line2: Set(address.address_line2.filter(|line| !line.trim().is_empty())),
        city: Set(address.city),
        state: Set(address.state),
        postal_code: Set(address.postal_code),
        is_default: Set(payload.is_default),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let items = addresses_for(&state.orm, identity.user_id).await?;
    Ok(ApiResponse::success(
        "Address added successfully",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, identity: &Identity) -> AppResult<ApiResponse<UserProfile>> {
    let addresses = addresses_for(&state.orm, identity.user_id).await?;
    Ok(ApiResponse::success(
        "OK",
        UserProfile {
            user_id: identity.user_id,
            addresses,
        },
        Some(Meta::empty()),
    ))
}

/// Deleting an unknown address is not an error; the remaining list is returned either way.
pub async fn delete_address(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> AppResult<ApiResponse<AddressList>> {
    Addresses::delete_many()
        .filter(AddressCol::Id.eq(id))
        .filter(AddressCol::UserId.eq(identity.user_id))
        .exec(&state.orm)
        .await?;

    let items = addresses_for(&state.orm, identity.user_id).await?;
    Ok(ApiResponse::success(
        "Address deleted successfully",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

async fn addresses_for<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<Address>> {
    Ok(Addresses::find()
        .filter(AddressCol::UserId.eq(user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_asc(AddressCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Address::from)
        .collect())
}
