use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Review, ReviewSummary};

/// Count and mean of `ratings`; `0` / `0.0` when there are none.
pub fn summarize<I>(ratings: I) -> ReviewSummary
where
    I: IntoIterator<Item = u8>,
{
    let (count, total) = ratings
        .into_iter()
        .fold((0usize, 0u64), |(count, total), rating| (count + 1, total + rating as u64));

    ReviewSummary {
        review_count: count,
        average_rating: if count == 0 { 0.0 } else { total as f64 / count as f64 },
    }
}

/// Groups a single scan of reviews into per-entity summaries.
pub fn aggregate_reviews(reviews: &[Review]) -> HashMap<Uuid, ReviewSummary> {
    let mut ratings: HashMap<Uuid, Vec<u8>> = HashMap::new();
    for review in reviews {
        ratings.entry(review.entity_id).or_default().push(review.rating);
    }

    ratings
        .into_iter()
        .map(|(entity_id, ratings)| (entity_id, summarize(ratings)))
        .collect()
}

/// Looks up an entity in an aggregate, defaulting to an empty summary.
pub fn summary_for(aggregates: &HashMap<Uuid, ReviewSummary>, entity_id: &Uuid) -> ReviewSummary {
    aggregates.get(entity_id).copied().unwrap_or_default()
}
