//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, checkouts, health, stats, users};

/// Registers the JWT bearer scheme referenced by `security(("bearer_auth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

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
    modifiers(&SecurityAddon),
    info(
        title = "Librarium API",
        version = "0.3.0",
        description = "Library management REST API: catalog, users and the checkout ledger",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::me,
        auth::logout,
        auth::change_password,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::update_book_status,
        // Checkouts
        checkouts::list_checkouts,
        checkouts::create_checkout,
        checkouts::return_checkout,
        checkouts::overdue_checkouts,
        checkouts::user_checkouts,
        // Stats
        stats::overview,
        stats::monthly,
        stats::popular_books,
        stats::user_stats,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::update_user_role,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::AuthResponse,
            auth::MessageResponse,
            crate::models::user::ChangePassword,
            // Books
            books::BookListResponse,
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookStatus,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::UpdateBookStatus,
            // Checkouts
            checkouts::CheckoutListResponse,
            crate::models::checkout::CheckoutDetails,
            crate::models::checkout::CheckoutStatus,
            crate::models::checkout::CheckoutStatusFilter,
            crate::models::checkout::CheckoutQuery,
            crate::models::checkout::CreateCheckout,
            crate::models::checkout::ReturnCheckout,
            // Stats
            crate::models::stats::StatsOverview,
            crate::models::stats::DailyStats,
            crate::models::stats::MonthlyStats,
            crate::models::stats::PopularBook,
            crate::models::stats::UserCheckoutStats,
            // Users
            users::UserListResponse,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::Role,
            crate::models::user::UserQuery,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateRole,
            // Shared
            crate::models::pagination::Pagination,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "checkouts", description = "Borrowing and returns"),
        (name = "stats", description = "Statistics"),
        (name = "users", description = "User management (admin)")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
