//! Radius and category filtering of businesses around a query center.

use log::debug;
use model::{business::Business, WithDistance, WithId};
use utility::geo;

use crate::{database::CandidateFilter, query::QueryDescriptor};

/// What to ask the store for. The result is a superset of the final answer.
pub fn compose(query: &QueryDescriptor) -> CandidateFilter {
    let bounds = query.center.map(|center| {
        geo::calculate_bounding_box(center.latitude, center.longitude, query.radius_miles)
    });
    let filter = CandidateFilter {
        category: query.category.clone(),
        bounds,
    };
    debug!(
        "Composed candidate filter: category={:?} bounds={:?} (radius {} mi)",
        filter.category, filter.bounds, query.radius_miles
    );
    filter
}

/// Exact filter over candidates.
///
/// With a center, a business is kept iff it has a usable location at most
/// `radius_miles` away (inclusive) and is annotated with that distance.
/// Without a center every business passes with no distance. In both cases the
/// category filter applies.
pub fn filter(
    query: &QueryDescriptor,
    candidates: Vec<WithId<Business>>,
) -> Vec<WithDistance<WithId<Business>>> {
    candidates
        .into_iter()
        .filter(|business| {
            query
                .category
                .as_ref()
                .map_or(true, |category| &business.content.category == category)
        })
        .filter_map(|business| match &query.center {
            Some(center) => business
                .content
                .distance_miles_to(center)
                .filter(|distance| *distance <= query.radius_miles)
                .map(|distance| WithDistance::new(Some(distance), business)),
            None => Some(WithDistance::without_distance(business)),
        })
        .collect()
}
