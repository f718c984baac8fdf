use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    domain::pricing::discount_percent,
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
};
use uuid::Uuid;

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    brand: &'static str,
    price: i64,
    selling_price: i64,
    stock: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let apparel = ensure_category(&orm, "Apparel", "apparel").await?;
    let kitchen = ensure_category(&orm, "Kitchen", "kitchen").await?;

    seed_products(
        &orm,
        apparel,
        &[
            SeedProduct { name: "Ferris Hoodie", slug: "ferris-hoodie", brand: "Crab Co", price: 1200, selling_price: 900, stock: 50 },
            SeedProduct { name: "Async Tee", slug: "async-tee", brand: "Crab Co", price: 600, selling_price: 450, stock: 120 },
            SeedProduct { name: "Borrow Cap", slug: "borrow-cap", brand: "Lifetime", price: 350, selling_price: 350, stock: 80 },
        ],
    )
    .await?;
    seed_products(
        &orm,
        kitchen,
        &[
            SeedProduct { name: "Ferris Mug", slug: "ferris-mug", brand: "Crab Co", price: 300, selling_price: 250, stock: 200 },
            SeedProduct { name: "Unsafe Apron", slug: "unsafe-apron", brand: "Lifetime", price: 800, selling_price: 640, stock: 30 },
        ],
    )
    .await?;

    println!("Seed completed. Default user ID: {}", config.default_user_id);
    Ok(())
}

async fn ensure_category(orm: &DatabaseConnection, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    if let Some(existing) = Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let now = Utc::now();
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        image: Set(format!("/images/categories/{slug}.png")),
        description: Set(format!("{name} for Rustaceans")),
        parent_id: Set(None),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured category {slug}");
    Ok(category.id)
}

async fn seed_products(
    orm: &DatabaseConnection,
    category_id: Uuid,
    products: &[SeedProduct],
) -> anyhow::Result<()> {
    for product in products {
        let exists = Products::find()
            .filter(ProdCol::Slug.eq(product.slug))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = Utc::now();
        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(product.name.to_string()),
            slug: Set(product.slug.to_string()),
            description: Set(format!("{} by {}", product.name, product.brand)),
            category_id: Set(category_id),
            brand: Set(product.brand.to_string()),
            price: Set(product.price),
            selling_price: Set(product.selling_price),
            discount: Set(discount_percent(product.price, product.selling_price)),
            thumbnail: Set(format!("/images/products/{}.png", product.slug)),
            images: Set(serde_json::json!([format!("/images/products/{}.png", product.slug)])),
            stock: Set(product.stock),
            is_available: Set(true),
            rating_average: Set(0.0),
            rating_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded {} products", products.len());
    Ok(())
}
