use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, AddressRequest},
        auth::{
            AuthStatus, LoginRequest, LoginResponse, OtpSent, RegisterRequest, SendOtpRequest,
            VerifyOtpRequest,
        },
        cart::{
            CartCount, CartLine, CartMap, CartMutation, CartView, SetQuantityRequest,
            UpdateQuantityRequest,
        },
        favorites::{AddFlavorRequest, FlavorList},
        orders::{CheckoutSummary, OrderList, OrderWithItems, PlaceOrderRequest, PlacedOrder},
        products::{ProductDetail, ProductList, SearchHit, SearchResults},
        profile::UpdateProfileRequest,
    },
    models::{Address, FavoriteFlavor, Order, OrderItem, Product, ProductCategory, User},
    response::{ApiResponse, Meta},
    routes::{
        addresses, auth, cart, favorites, health, orders, params, products as product_routes,
        profile,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        auth::send_otp,
        auth::verify_otp,
        auth::status,
        product_routes::list_products,
        product_routes::search_products,
        product_routes::get_product,
        cart::cart_list,
        cart::cart_count,
        cart::cart_map,
        cart::add_to_cart,
        cart::update_quantity,
        cart::set_quantity,
        cart::remove_item,
        orders::checkout,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        addresses::list_addresses,
        addresses::create_address,
        addresses::get_address,
        addresses::update_address,
        addresses::delete_address,
        profile::get_profile,
        profile::update_profile,
        profile::delete_account,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite
    ),
    components(
        schemas(
            User,
            Product,
            ProductCategory,
            Address,
            Order,
            OrderItem,
            FavoriteFlavor,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            SendOtpRequest,
            VerifyOtpRequest,
            OtpSent,
            AuthStatus,
            UpdateQuantityRequest,
            SetQuantityRequest,
            CartMutation,
            CartLine,
            CartView,
            CartCount,
            CartMap,
            PlaceOrderRequest,
            PlacedOrder,
            CheckoutSummary,
            OrderList,
            OrderWithItems,
            ProductList,
            ProductDetail,
            SearchHit,
            SearchResults,
            AddressRequest,
            AddressList,
            AddFlavorRequest,
            FlavorList,
            UpdateProfileRequest,
            params::ProductQuery,
            params::OrderListQuery,
            params::SearchQuery,
            params::SortOrder,
            params::ProductSortBy,
            health::HealthData,
            Meta,
            ApiResponse<CartView>,
            ApiResponse<CartMutation>,
            ApiResponse<PlacedOrder>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Auth", description = "Registration, password and OTP login"),
        (name = "Products", description = "Ice-cream catalog"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Addresses", description = "Delivery addresses"),
        (name = "Profile", description = "Account profile"),
        (name = "Favorites", description = "Favourite flavours"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health/ready",
            "/api/cart/products/{product_id}",
            "/api/cart/products/{product_id}/quantity",
            "/api/orders",
            "/api/checkout",
            "/api/auth/otp/verify",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
