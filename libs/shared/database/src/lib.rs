pub mod error;
pub mod query;
pub mod rest;

pub use error::DatabaseError;
pub use query::Query;
pub use rest::DatabaseClient;
