pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{User, AccountError};
pub use router::account_routes;
pub use services::AccountService;
