use crate::matching::LocationMatcher;
use crate::route::Route;

/// Finds the segment of `route` that carries a traveler from `origin_term`
/// to `destination_term`, honoring the direction of travel.
///
/// The origin index is the FIRST point matching the origin term scanning
/// from the start of the route; the destination index is the FIRST point
/// matching the destination term strictly after the chosen origin. Requests
/// that would require traveling backward along the route resolve to `None`
/// even when both terms match somewhere.
pub fn resolve_segment(
    matcher: &LocationMatcher,
    route: &Route,
    origin_term: &str,
    destination_term: &str,
) -> Option<(usize, usize)> {
    let points = route.points();

    let origin_index = points.iter().position(|p| matcher.matches(p, origin_term))?;

    let destination_index = points
        .iter()
        .enumerate()
        .skip(origin_index + 1)
        .find(|(_, p)| matcher.matches(p, destination_term))
        .map(|(i, _)| i)?;

    tracing::debug!(
        origin_index,
        destination_index,
        "resolved journey segment on route"
    );

    Some((origin_index, destination_index))
}

/// Whether the ride's route can carry the requested journey at all.
pub fn accommodates(
    matcher: &LocationMatcher,
    route: &Route,
    origin_term: &str,
    destination_term: &str,
) -> bool {
    resolve_segment(matcher, route, origin_term, destination_term).is_some()
}
