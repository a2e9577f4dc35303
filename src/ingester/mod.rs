pub mod handlers;
pub mod routes;

pub use handlers::IngesterState;
pub use routes::create_router;
