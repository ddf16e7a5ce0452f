pub mod aggregate;
pub mod favorite;
pub mod review;

pub use aggregate::{aggregate_reviews, summarize, summary_for};
pub use favorite::FavoriteService;
pub use review::ReviewService;
