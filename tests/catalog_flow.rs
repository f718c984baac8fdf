mod common;

use common::{create_category, create_product, set_available, setup_state};
use storefront_api::{
    error::AppError,
    routes::params::{Pagination, ProductQuery, ProductSort},
    services::catalog_service,
};
use uuid::Uuid;

#[tokio::test]
async fn listing_filters_searches_and_sorts() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let apparel = create_category(&state, "Apparel").await?;
    let kitchen = create_category(&state, "Kitchen").await?;
    create_product(&state, apparel, "Ferris Hoodie", 1200, 900, 5).await?;
    create_product(&state, apparel, "Async Tee", 600, 450, 5).await?;
    create_product(&state, kitchen, "Ferris Mug", 300, 250, 5).await?;
    let hidden = create_product(&state, kitchen, "Ferris Plate", 200, 200, 5).await?;
    set_available(&state, &hidden, false).await?;

    let all = catalog_service::list_products(&state, ProductQuery::default()).await?;
    assert_eq!(all.meta.as_ref().and_then(|meta| meta.total), Some(3));

    let ferris = catalog_service::list_products(
        &state,
        ProductQuery {
            q: Some("FERRIS".into()),
            sort: Some(ProductSort::PriceAsc),
            ..ProductQuery::default()
        },
    )
    .await?
    .data
    .expect("products");
    let names: Vec<_> = ferris.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Ferris Mug", "Ferris Hoodie"]);

    let apparel_only = catalog_service::list_products(
        &state,
        ProductQuery {
            category: Some("apparel".into()),
            max_price: Some(500),
            ..ProductQuery::default()
        },
    )
    .await?
    .data
    .expect("products");
    assert_eq!(apparel_only.items.len(), 1);
    assert_eq!(apparel_only.items[0].name, "Async Tee");
    assert_eq!(apparel_only.items[0].discount, 25);

    let paged = catalog_service::list_products(
        &state,
        ProductQuery {
            page: Some(2),
            per_page: Some(2),
            ..ProductQuery::default()
        },
    )
    .await?;
    assert_eq!(paged.data.expect("products").items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn lookups_by_id_and_slug() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let books = create_category(&state, "Books").await?;
    let atlas = create_product(&state, books, "Atlas", 900, 900, 1).await?;

    let by_id = catalog_service::get_product(&state, atlas.id).await?.data.expect("product");
    assert_eq!(by_id.slug, "atlas");
    assert!(by_id.in_stock);

    let by_slug = catalog_service::get_product_by_slug(&state, "Atlas").await?.data.expect("product");
    assert_eq!(by_slug.id, atlas.id);

    let err = catalog_service::get_product(&state, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let category = catalog_service::get_category_by_slug(&state, "books").await?.data.expect("category");
    assert_eq!(category.id, books);
    let err = catalog_service::get_category(&state, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let categories = catalog_service::list_categories(&state).await?.data.expect("categories");
    assert_eq!(categories.items.len(), 1);

    let in_category =
        catalog_service::list_products_by_category(&state, books, Pagination::default()).await?;
    assert_eq!(in_category.data.expect("products").items.len(), 1);
    Ok(())
}
