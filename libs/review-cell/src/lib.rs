pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Favorite, Review, ReviewError, ReviewSummary};
pub use router::{favorite_routes, review_routes};
pub use services::{aggregate_reviews, summary_for, FavoriteService, ReviewService};
