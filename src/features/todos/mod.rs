pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use handlers::TodoState;
pub use routes::routes;
pub use services::TodoService;
