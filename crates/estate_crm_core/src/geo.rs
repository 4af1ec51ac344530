//! crates/estate_crm_core/src/geo.rs
//!
//! Coordinate verification against a fixed gazetteer of Tunisian city
//! centers. The check is a degree-difference bounding box, not a great-circle
//! distance; that approximation is fine at this scope but should not be
//! reused for anything needing real geodesy.

/// A reference city with its center point and matching tolerance in degrees.
#[derive(Debug, Clone, Copy)]
pub struct GazetteerEntry {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub tolerance: f64,
}

/// The known city centers. Tunis gets a wider tolerance because the
/// metropolitan area sprawls well beyond the center point.
pub const GAZETTEER: &[GazetteerEntry] = &[
    GazetteerEntry { name: "Tunis", lat: 36.8065, lng: 10.1815, tolerance: 0.1 },
    GazetteerEntry { name: "La Marsa", lat: 36.8785, lng: 10.3247, tolerance: 0.05 },
    GazetteerEntry { name: "Sidi Bou Said", lat: 36.8675, lng: 10.3467, tolerance: 0.05 },
    GazetteerEntry { name: "Hammamet", lat: 36.4, lng: 10.6167, tolerance: 0.05 },
    GazetteerEntry { name: "Sousse", lat: 35.8256, lng: 10.6369, tolerance: 0.05 },
    GazetteerEntry { name: "Sfax", lat: 34.7406, lng: 10.7603, tolerance: 0.05 },
    GazetteerEntry { name: "Monastir", lat: 35.7643, lng: 10.8113, tolerance: 0.05 },
    GazetteerEntry { name: "Nabeul", lat: 36.4561, lng: 10.7376, tolerance: 0.05 },
    GazetteerEntry { name: "Bizerte", lat: 37.2744, lng: 9.8739, tolerance: 0.05 },
    GazetteerEntry { name: "Mahdia", lat: 35.5047, lng: 11.0622, tolerance: 0.05 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    High,
    Low,
}

impl Accuracy {
    pub fn label(&self) -> &'static str {
        match self {
            Accuracy::High => "high",
            Accuracy::Low => "low",
        }
    }
}

/// Outcome of a coordinate verification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateCheck {
    pub verified: bool,
    pub accuracy: Accuracy,
    pub city: Option<&'static str>,
}

impl CoordinateCheck {
    pub fn city_label(&self) -> &'static str {
        self.city.unwrap_or("unknown")
    }
}

/// Checks a free-text location against the gazetteer: the location must
/// contain the city name (case-insensitively) AND both coordinate deltas must
/// fall within the city's tolerance. The first matching entry wins.
pub fn verify_coordinates(location: &str, lat: f64, lng: f64) -> CoordinateCheck {
    let location_lower = location.to_lowercase();
    for entry in GAZETTEER {
        if location_lower.contains(&entry.name.to_lowercase()) {
            let lat_diff = (lat - entry.lat).abs();
            let lng_diff = (lng - entry.lng).abs();
            if lat_diff <= entry.tolerance && lng_diff <= entry.tolerance {
                return CoordinateCheck {
                    verified: true,
                    accuracy: Accuracy::High,
                    city: Some(entry.name),
                };
            }
        }
    }
    CoordinateCheck {
        verified: false,
        accuracy: Accuracy::Low,
        city: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn la_marsa_within_tolerance_verifies_high() {
        let check = verify_coordinates("La Marsa, Tunis", 36.8785 + 0.03, 10.3247 - 0.03);
        assert!(check.verified);
        assert_eq!(check.accuracy, Accuracy::High);
        assert_eq!(check.city_label(), "La Marsa");
    }

    #[test]
    fn point_a_degree_away_fails() {
        let check = verify_coordinates("La Marsa", 37.8785, 10.3247);
        assert!(!check.verified);
        assert_eq!(check.accuracy, Accuracy::Low);
        assert_eq!(check.city_label(), "unknown");
    }

    #[test]
    fn city_name_match_is_case_insensitive() {
        let check = verify_coordinates("appartement à SOUSSE centre", 35.83, 10.64);
        assert!(check.verified);
        assert_eq!(check.city, Some("Sousse"));
    }

    #[test]
    fn unknown_location_is_unverified_even_with_plausible_coordinates() {
        let check = verify_coordinates("Djerba", 36.8065, 10.1815);
        assert!(!check.verified);
    }

    #[test]
    fn la_marsa_location_string_matches_tunis_entry_only_if_both_present() {
        // "La Marsa, Tunis" also contains "Tunis"; the Tunis entry comes
        // first in the gazetteer, so a point near the Tunis center but far
        // from La Marsa still verifies as Tunis.
        let check = verify_coordinates("La Marsa, Tunis", 36.8065, 10.1815);
        assert!(check.verified);
        assert_eq!(check.city, Some("Tunis"));
    }
}
