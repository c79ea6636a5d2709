pub mod auth;
pub mod todos;
