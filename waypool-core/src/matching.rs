use crate::route::RoutePoint;
use serde::Deserialize;

/// A term shorter than this never takes the main-city fallback path.
const MIN_CITY_LEN: usize = 3;

/// Tunables for the fuzzy place-name cascade. The defaults reproduce the
/// behavior of the original deployment (Indian intercity routes); swap the
/// lists per region through configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Canonical city names recognized by the main-city extraction step.
    pub known_cities: Vec<String>,
    /// State/country tokens skipped when scanning address parts for a city.
    pub region_tokens: Vec<String>,
    /// Country tokens skipped by the first-substantial-part fallback.
    pub country_tokens: Vec<String>,
    /// Address parts starting with one of these are campus/venue names, not cities.
    pub venue_prefixes: Vec<String>,
    /// Address parts containing one of these are venue names, not cities.
    pub venue_markers: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let own = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            known_cities: own(&[
                "mumbai",
                "chennai",
                "tirupati",
                "kerala",
                "bangalore",
                "hyderabad",
                "delhi",
                "kolkata",
            ]),
            region_tokens: own(&[
                "india",
                "andhra pradesh",
                "tamil nadu",
                "maharashtra",
                "kerala",
            ]),
            country_tokens: own(&["india"]),
            venue_prefixes: own(&["iit"]),
            venue_markers: own(&["institute"]),
        }
    }
}

/// Fuzzy matcher for free-text place names against route points.
///
/// Place names entered by different users vary in granularity ("Mumbai" vs
/// "Mumbai, Maharashtra, India" vs "IIT Bombay, Mumbai"), so matching is an
/// ordered cascade that trades precision for recall. False positives are
/// bounded downstream by the journey ordering check.
#[derive(Debug, Clone)]
pub struct LocationMatcher {
    config: MatcherConfig,
}

/// Lowercase, trim, and collapse internal whitespace runs to a single space.
pub fn normalize(location: &str) -> String {
    location
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl LocationMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// First success wins: exact equality, containment either direction,
    /// then main-city extraction. Blank search terms never match.
    pub fn matches(&self, point: &RoutePoint, term: &str) -> bool {
        if term.trim().is_empty() {
            return false;
        }

        let search = normalize(term);
        let city = normalize(&point.city);
        let label = normalize(&point.label);

        if city == search || label == search {
            return true;
        }

        if city.contains(&search) || label.contains(&search) {
            return true;
        }

        if !city.is_empty() && search.contains(&city) {
            return true;
        }
        if !label.is_empty() && search.contains(&label) {
            return true;
        }

        // Fallback: reduce both sides to a canonical city token so that
        // "Mumbai, Maharashtra, India" still meets "IIT Bombay, Mumbai".
        let search_city = self.extract_main_city(term);
        if search_city.len() >= MIN_CITY_LEN {
            let city_main = self.extract_main_city(&point.city);
            let label_main = self.extract_main_city(&point.label);

            if city_main == search_city
                || label_main.contains(&search_city)
                || city_main.contains(&search_city)
                || search_city.contains(&city_main)
            {
                return true;
            }
        }

        false
    }

    /// Extracts the main city name from a full address.
    /// E.g., "Mumbai, Maharashtra, India" -> "mumbai"
    /// E.g., "IIT Bombay, Main Gate Road, Mumbai" -> "mumbai"
    fn extract_main_city(&self, location: &str) -> String {
        let normalized = normalize(location);
        if normalized.is_empty() {
            return normalized;
        }

        let parts: Vec<&str> = normalized.split(',').map(str::trim).collect();

        for &part in &parts {
            if part.len() < MIN_CITY_LEN {
                continue;
            }
            if self.config.region_tokens.iter().any(|t| part == t) {
                continue;
            }
            for city in &self.config.known_cities {
                if part.contains(city.as_str()) {
                    return city.clone();
                }
            }
        }

        // No recognized city: settle for the first substantial part that is
        // not a country name or a campus/venue label.
        for &part in &parts {
            if part.len() >= MIN_CITY_LEN
                && !self.config.country_tokens.iter().any(|t| part == t)
                && !self.config.venue_prefixes.iter().any(|v| part.starts_with(v.as_str()))
                && !self.config.venue_markers.iter().any(|v| part.contains(v.as_str()))
            {
                return part.to_string();
            }
        }

        normalized
    }
}

impl Default for LocationMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}
