pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use models::User;
pub use repositories::{PgUserRepository, UserRepository};
pub use services::UserService;
