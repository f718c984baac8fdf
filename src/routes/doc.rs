use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        order::{OrderStatus, PaymentMethod, ShippingAddress},
        pricing::PriceSummary,
    },
    dto::{
        addresses::{AddAddressRequest, AddressList, UserProfile},
        cart::{AddToCartRequest, CartView, UpdateCartItemRequest},
        catalog::{CategoryList, ProductList},
        orders::{OrderList, OrderWithItems, PlaceOrderRequest, PlacedOrder, UpdateOrderStatusRequest},
    },
    models::{Address, CartItem, CartProduct, Category, Order, OrderItem, Product},
    response::{ApiError, ApiResponse, Meta},
    routes::{addresses, admin, cart, categories, health, orders, params, products, user},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        categories::list_categories,
        categories::get_category,
        categories::get_category_by_slug,
        products::list_products,
        products::get_product,
        products::get_product_by_slug,
        products::list_products_by_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        user::get_profile,
        addresses::list_addresses,
        addresses::add_address,
        addresses::delete_address,
        admin::update_order_status
    ),
    components(
        schemas(
            Category,
            Product,
            CartProduct,
            CartItem,
            Order,
            OrderItem,
            Address,
            OrderStatus,
            PaymentMethod,
            ShippingAddress,
            PriceSummary,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartView,
            PlaceOrderRequest,
            PlacedOrder,
            UpdateOrderStatusRequest,
            AddAddressRequest,
            AddressList,
            UserProfile,
            CategoryList,
            ProductList,
            OrderList,
            OrderWithItems,
            params::ProductSort,
            params::SortOrder,
            Meta,
            ApiError,
            ApiResponse<CartView>,
            ApiResponse<PlacedOrder>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Categories", description = "Category catalog"),
        (name = "Products", description = "Product catalog"),
        (name = "Cart", description = "Per-user cart with live pricing"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "User", description = "Resolved identity profile"),
        (name = "Addresses", description = "Saved shipping addresses"),
        (name = "Admin", description = "Operator order management"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
