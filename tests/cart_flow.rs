mod common;

use common::{cart_rows, create_category, create_product, set_available, setup_state, shopper};
use storefront_api::{
    domain::pricing::PriceSummary,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppError,
    services::cart_service,
};
use uuid::Uuid;

#[tokio::test]
async fn repeated_adds_merge_and_summary_uses_live_prices() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Apparel").await?;
    let hoodie = create_product(&state, category, "Hoodie", 1000, 800, 10).await?;
    let user = shopper();

    for _ in 0..2 {
        cart_service::add_item(
            &state,
            &user,
            AddToCartRequest { product_id: hoodie.id, quantity: 1 },
        )
        .await?;
    }

    let view = cart_service::get_cart(&state, &user).await?.data.expect("cart view");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 2);
    assert_eq!(view.items[0].product.selling_price, 800);
    assert_eq!(
        view.summary,
        PriceSummary {
            total_items: 2,
            subtotal: 2000,
            discount: 400,
            shipping_charges: 0,
            total: 1600,
        }
    );
    Ok(())
}

#[tokio::test]
async fn small_cart_pays_shipping() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Stationery").await?;
    let pen = create_product(&state, category, "Pen", 100, 100, 1).await?;
    let user = shopper();

    let view = cart_service::add_item(&state, &user, AddToCartRequest { product_id: pen.id, quantity: 1 })
        .await?
        .data
        .expect("cart view");

    assert_eq!(view.summary.subtotal, 100);
    assert_eq!(view.summary.discount, 0);
    assert_eq!(view.summary.shipping_charges, 40);
    assert_eq!(view.summary.total, 140);
    Ok(())
}

#[tokio::test]
async fn merge_beyond_stock_is_rejected_and_keeps_quantity() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Kitchen").await?;
    let mug = create_product(&state, category, "Mug", 300, 250, 3).await?;
    let user = shopper();

    cart_service::add_item(&state, &user, AddToCartRequest { product_id: mug.id, quantity: 2 }).await?;
    let err = cart_service::add_item(&state, &user, AddToCartRequest { product_id: mug.id, quantity: 2 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StockExceeded(_)), "got {err:?}");

    let view = cart_service::get_cart(&state, &user).await?.data.expect("cart view");
    assert_eq!(view.items[0].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn add_rejects_unknown_unavailable_and_bad_quantity() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Garden").await?;
    let rake = create_product(&state, category, "Rake", 500, 450, 5).await?;
    set_available(&state, &rake, false).await?;
    let user = shopper();

    let err = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest { product_id: Uuid::new_v4(), quantity: 1 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let err = cart_service::add_item(&state, &user, AddToCartRequest { product_id: rake.id, quantity: 1 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)), "got {err:?}");

    let err = cart_service::add_item(&state, &user, AddToCartRequest { product_id: rake.id, quantity: 0 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn update_sets_absolute_quantity() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Books").await?;
    let book = create_product(&state, category, "Rust Book", 900, 700, 5).await?;
    let other = create_product(&state, category, "Go Book", 600, 600, 5).await?;
    let user = shopper();

    cart_service::add_item(&state, &user, AddToCartRequest { product_id: book.id, quantity: 3 }).await?;
    let view = cart_service::update_item(
        &state,
        &user,
        UpdateCartItemRequest { product_id: book.id, quantity: 1 },
    )
    .await?
    .data
    .expect("cart view");
    assert_eq!(view.items[0].quantity, 1);

    let err = cart_service::update_item(
        &state,
        &user,
        UpdateCartItemRequest { product_id: book.id, quantity: 6 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::StockExceeded(_)), "got {err:?}");

    let err = cart_service::update_item(
        &state,
        &user,
        UpdateCartItemRequest { product_id: other.id, quantity: 1 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let err = cart_service::update_item(
        &state,
        &user,
        UpdateCartItemRequest { product_id: book.id, quantity: 0 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn remove_is_idempotent_and_clear_empties_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Toys").await?;
    let ball = create_product(&state, category, "Ball", 200, 150, 10).await?;
    let kite = create_product(&state, category, "Kite", 400, 400, 10).await?;
    let user = shopper();

    cart_service::add_item(&state, &user, AddToCartRequest { product_id: ball.id, quantity: 1 }).await?;
    cart_service::add_item(&state, &user, AddToCartRequest { product_id: kite.id, quantity: 1 }).await?;

    let view = cart_service::remove_item(&state, &user, ball.id).await?.data.expect("cart view");
    assert_eq!(view.items.len(), 1);
    let again = cart_service::remove_item(&state, &user, ball.id).await?.data.expect("cart view");
    assert_eq!(again.items.len(), 1);
    assert_eq!(again.summary, view.summary);

    let cleared = cart_service::clear_cart(&state, &user).await?.data.expect("cart view");
    assert!(cleared.items.is_empty());
    assert_eq!(cleared.summary, PriceSummary::empty());

    let view = cart_service::get_cart(&state, &user).await?.data.expect("cart view");
    assert!(view.items.is_empty());
    assert_eq!(view.summary.shipping_charges, 0);
    Ok(())
}

#[tokio::test]
async fn carts_are_scoped_to_identity() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Audio").await?;
    let headphones = create_product(&state, category, "Headphones", 2000, 1500, 4).await?;
    let alice = shopper();
    let bob = shopper();

    cart_service::add_item(
        &state,
        &alice,
        AddToCartRequest { product_id: headphones.id, quantity: 1 },
    )
    .await?;

    let bobs = cart_service::get_cart(&state, &bob).await?.data.expect("cart view");
    assert!(bobs.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn cart_reflects_price_changes_after_add() -> anyhow::Result<()> {
    use sea_orm::{ActiveModelTrait, Set};
    use storefront_api::entity::products::ActiveModel as ProductActive;

    let state = setup_state().await?;
    let category = create_category(&state, "Snacks").await?;
    let chips = create_product(&state, category, "Chips", 100, 90, 10).await?;
    let user = shopper();

    cart_service::add_item(&state, &user, AddToCartRequest { product_id: chips.id, quantity: 2 }).await?;

    let mut active: ProductActive = chips.clone().into();
    active.selling_price = Set(80);
    active.update(&state.orm).await?;

    let view = cart_service::get_cart(&state, &user).await?.data.expect("cart view");
    assert_eq!(view.items[0].product.selling_price, 80);
    assert_eq!(view.summary.discount, 40);
    assert_eq!(view.summary.total, 200 - 40 + 40);
    Ok(())
}

#[tokio::test]
async fn rejected_add_creates_no_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state, "Bakery").await?;
    let bread = create_product(&state, category, "Bread", 60, 50, 2).await?;
    let user = shopper();

    let err = cart_service::add_item(
        &state,
        &user,
        AddToCartRequest { product_id: Uuid::new_v4(), quantity: 1 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    assert_eq!(cart_rows(&state, &user).await?, 0);

    let err = cart_service::add_item(&state, &user, AddToCartRequest { product_id: bread.id, quantity: 3 })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unavailable(_)), "got {err:?}");
    assert_eq!(cart_rows(&state, &user).await?, 0);

    cart_service::add_item(&state, &user, AddToCartRequest { product_id: bread.id, quantity: 2 }).await?;
    assert_eq!(cart_rows(&state, &user).await?, 1);
    Ok(())
}
