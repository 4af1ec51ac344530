//! crates/estate_crm_core/src/matching.rs
//!
//! Property/prospect compatibility scoring ("AI Matching").
//!
//! Scoring is a pluggable strategy behind the `MatchScoringService` port.
//! `TableMatchScorer` reproduces the hand-authored demo results; the
//! `WeightedMatchScorer` is the computed strategy the demo left room for.

use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{Match, MatchScore, Property, Prospect};
use crate::ports::MatchScoringService;

//=========================================================================================
// Fixed-table scorer
//=========================================================================================

/// A scorer backed by a fixed `(property, prospect) -> (score, reasons)`
/// table. Pairs absent from the table are a no-match (`None`).
pub struct TableMatchScorer {
    table: HashMap<(Uuid, Uuid), MatchScore>,
}

impl TableMatchScorer {
    pub fn new(entries: impl IntoIterator<Item = (Uuid, Uuid, u8, Vec<String>)>) -> Self {
        let table = entries
            .into_iter()
            .map(|(property_id, prospect_id, score, reasons)| {
                ((property_id, prospect_id), MatchScore { score, reasons })
            })
            .collect();
        Self { table }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl MatchScoringService for TableMatchScorer {
    fn score_match(&self, property: &Property, prospect: &Prospect) -> Option<MatchScore> {
        self.table.get(&(property.id, prospect.id)).cloned()
    }
}

//=========================================================================================
// Weighted scorer
//=========================================================================================

/// A computed strategy: budget fit (40 points), location fit (30), property
/// type fit (30). Every pair scores, so this strategy never returns the
/// no-match sentinel.
pub struct WeightedMatchScorer;

impl MatchScoringService for WeightedMatchScorer {
    fn score_match(&self, property: &Property, prospect: &Prospect) -> Option<MatchScore> {
        let mut score: u8 = 0;
        let mut reasons = Vec::new();

        // Budget: full marks when the budget covers the asking price; partial
        // when the price overshoots by at most 10%.
        if prospect.budget >= property.price {
            score += 40;
            reasons.push("Budget compatible".to_string());
        } else if property.price <= prospect.budget.saturating_mul(110) / 100 {
            score += 25;
            reasons.push("Budget légèrement supérieur".to_string());
        } else {
            score += 10;
            reasons.push("Budget insuffisant".to_string());
        }

        let property_location = property.location.to_lowercase();
        let preferred_location = prospect.preferred_location.to_lowercase();
        if !preferred_location.is_empty()
            && (property_location.contains(&preferred_location)
                || preferred_location.contains(&property_location))
        {
            score += 30;
            reasons.push("Localisation idéale".to_string());
        } else {
            score += 10;
            reasons.push("Localisation différente".to_string());
        }

        if property.kind.label().eq_ignore_ascii_case(&prospect.preferred_type) {
            score += 30;
            reasons.push("Type de bien recherché".to_string());
        } else {
            score += 10;
            reasons.push("Type de bien différent".to_string());
        }

        Some(MatchScore { score, reasons })
    }
}

//=========================================================================================
// Pair scoring and threshold filtering
//=========================================================================================

/// Scores every property x prospect pair in input order, dropping no-match
/// pairs. The output order (property-major) is the tie-break order for
/// `filter_matches`.
pub fn score_all(
    scorer: &dyn MatchScoringService,
    properties: &[Property],
    prospects: &[Prospect],
) -> Vec<Match> {
    let mut matches = Vec::new();
    for property in properties {
        for prospect in prospects {
            if let Some(MatchScore { score, reasons }) = scorer.score_match(property, prospect) {
                matches.push(Match {
                    property_id: property.id,
                    prospect_id: prospect.id,
                    score,
                    reasons,
                });
            }
        }
    }
    matches
}

/// Keeps matches with `score >= threshold`, sorted descending by score.
/// The sort is stable, so ties keep their original order.
pub fn filter_matches(matches: &[Match], threshold: u8) -> Vec<Match> {
    let mut kept: Vec<Match> = matches
        .iter()
        .filter(|m| m.score >= threshold)
        .cloned()
        .collect();
    kept.sort_by(|a, b| b.score.cmp(&a.score));
    kept
}

//=========================================================================================
// Demo fixture data
//=========================================================================================

/// Stable ids for the demo entities, so match results can be correlated with
/// the returned properties and prospects across requests.
pub const DEMO_PROPERTY_IDS: [Uuid; 3] = [
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0a01),
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0a02),
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0a03),
];
pub const DEMO_PROSPECT_IDS: [Uuid; 3] = [
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0b01),
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0b02),
    Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0b03),
];

/// The hand-authored demo dataset: three properties, three prospects, and the
/// five fixture match results wired to their fixed ids.
pub fn demo_fixtures() -> (Vec<Property>, Vec<Prospect>, TableMatchScorer) {
    use crate::domain::{PropertyStatus, PropertyType, ProspectStatus};
    use chrono::Utc;

    let properties = vec![
        Property {
            id: DEMO_PROPERTY_IDS[0],
            title: "Villa Moderne avec Vue Mer".to_string(),
            kind: PropertyType::Villa,
            price: 850_000,
            currency: "EUR".to_string(),
            location: "La Marsa, Tunis".to_string(),
            bedrooms: 4,
            bathrooms: 3,
            area: 280,
            status: PropertyStatus::ForSale,
            image_url: "https://images.unsplash.com/photo-1613490493576-7fde63acd811?w=800&q=80"
                .to_string(),
        },
        Property {
            id: DEMO_PROPERTY_IDS[1],
            title: "Appartement de Luxe Centre-Ville".to_string(),
            kind: PropertyType::Apartment,
            price: 450_000,
            currency: "EUR".to_string(),
            location: "Lac 2, Tunis".to_string(),
            bedrooms: 3,
            bathrooms: 2,
            area: 150,
            status: PropertyStatus::ForSale,
            image_url: "https://images.unsplash.com/photo-1560448204-e02f11c3d0e2?w=800&q=80"
                .to_string(),
        },
        Property {
            id: DEMO_PROPERTY_IDS[2],
            title: "Maison Traditionnelle Rénovée".to_string(),
            kind: PropertyType::House,
            price: 1_200_000,
            currency: "TND".to_string(),
            location: "Sidi Bou Said, Tunis".to_string(),
            bedrooms: 5,
            bathrooms: 4,
            area: 320,
            status: PropertyStatus::ForSale,
            image_url: "https://images.unsplash.com/photo-1600585154340-be6161a56a0c?w=800&q=80"
                .to_string(),
        },
    ];

    let prospects = vec![
        Prospect {
            id: DEMO_PROSPECT_IDS[0],
            client: "Sophie Martin".to_string(),
            email: "sophie.martin@example.com".to_string(),
            phone: "+216 55 123 456".to_string(),
            budget: 900_000,
            currency: "EUR".to_string(),
            preferred_location: "La Marsa, Tunis".to_string(),
            preferred_type: "Villa".to_string(),
            status: ProspectStatus::HotRequest,
            notes: String::new(),
            created_at: Utc::now(),
        },
        Prospect {
            id: DEMO_PROSPECT_IDS[1],
            client: "Ahmed Ben Ali".to_string(),
            email: "ahmed.benali@example.com".to_string(),
            phone: "+216 99 876 543".to_string(),
            budget: 500_000,
            currency: "EUR".to_string(),
            preferred_location: "Lac 2, Tunis".to_string(),
            preferred_type: "Appartement".to_string(),
            status: ProspectStatus::Negotiating,
            notes: String::new(),
            created_at: Utc::now(),
        },
        Prospect {
            id: DEMO_PROSPECT_IDS[2],
            client: "Isabelle Dubois".to_string(),
            email: "isabelle.dubois@example.com".to_string(),
            phone: "+33 6 12 34 56 78".to_string(),
            budget: 1_500_000,
            currency: "TND".to_string(),
            preferred_location: "Sidi Bou Said, Tunis".to_string(),
            preferred_type: "Maison".to_string(),
            status: ProspectStatus::HotRequest,
            notes: String::new(),
            created_at: Utc::now(),
        },
    ];

    let full_match = |extra: bool| {
        let mut reasons = vec![
            "Budget compatible".to_string(),
            "Localisation idéale".to_string(),
            "Type de bien recherché".to_string(),
        ];
        if extra {
            reasons.push("Caractéristiques correspondantes".to_string());
        }
        reasons
    };

    let scorer = TableMatchScorer::new([
        (properties[0].id, prospects[0].id, 92, full_match(false)),
        (properties[1].id, prospects[1].id, 88, full_match(false)),
        (properties[2].id, prospects[2].id, 95, full_match(true)),
        (
            properties[0].id,
            prospects[1].id,
            65,
            vec![
                "Budget légèrement supérieur".to_string(),
                "Type de bien différent".to_string(),
            ],
        ),
        (
            properties[1].id,
            prospects[0].id,
            72,
            vec![
                "Budget compatible".to_string(),
                "Type de bien différent".to_string(),
            ],
        ),
    ]);

    (properties, prospects, scorer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_scorer_returns_none_for_unknown_pairs() {
        let (properties, prospects, scorer) = demo_fixtures();
        // prop3 x pros1 is not in the fixture table.
        assert!(scorer.score_match(&properties[2], &prospects[0]).is_none());
        let hit = scorer.score_match(&properties[0], &prospects[0]).unwrap();
        assert_eq!(hit.score, 92);
        assert_eq!(hit.reasons.len(), 3);
    }

    #[test]
    fn default_threshold_keeps_the_three_strong_fixtures() {
        let (properties, prospects, scorer) = demo_fixtures();
        let matches = score_all(&scorer, &properties, &prospects);
        assert_eq!(matches.len(), 5);

        let kept = filter_matches(&matches, 70);
        let scores: Vec<u8> = kept.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![95, 92, 88, 72]);
    }

    #[test]
    fn raising_the_threshold_never_grows_the_result() {
        let (properties, prospects, scorer) = demo_fixtures();
        let matches = score_all(&scorer, &properties, &prospects);

        let mut previous = usize::MAX;
        for threshold in (0..=100).step_by(5) {
            let size = filter_matches(&matches, threshold as u8).len();
            assert!(size <= previous, "threshold {threshold} grew the set");
            previous = size;
        }
        assert_eq!(filter_matches(&matches, 0).len(), 5);
        assert_eq!(filter_matches(&matches, 100).len(), 0);
    }

    #[test]
    fn ties_keep_input_order() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let matches: Vec<Match> = ids
            .iter()
            .map(|id| Match {
                property_id: *id,
                prospect_id: *id,
                score: 80,
                reasons: vec![],
            })
            .collect();
        let kept = filter_matches(&matches, 70);
        let kept_ids: Vec<Uuid> = kept.iter().map(|m| m.property_id).collect();
        assert_eq!(kept_ids, ids);
    }

    #[test]
    fn demo_ids_are_stable_across_calls() {
        let (props_a, pros_a, _) = demo_fixtures();
        let (props_b, pros_b, _) = demo_fixtures();

        for (a, b) in props_a.iter().zip(&props_b) {
            assert_eq!(a.id, b.id);
        }
        for (a, b) in pros_a.iter().zip(&pros_b) {
            assert_eq!(a.id, b.id);
        }

        // The match results point back into the returned entities.
        let (properties, prospects, scorer) = demo_fixtures();
        for m in score_all(&scorer, &properties, &prospects) {
            assert!(DEMO_PROPERTY_IDS.contains(&m.property_id));
            assert!(DEMO_PROSPECT_IDS.contains(&m.prospect_id));
        }
    }

    #[test]
    fn weighted_scorer_rewards_full_fit() {
        let (properties, prospects, _) = demo_fixtures();
        let scorer = WeightedMatchScorer;

        let perfect = scorer.score_match(&properties[0], &prospects[0]).unwrap();
        assert_eq!(perfect.score, 100);
        assert!(perfect.reasons.contains(&"Budget compatible".to_string()));
        assert!(perfect.reasons.contains(&"Localisation idéale".to_string()));

        // Villa at 850k EUR against a 500k budget looking for an apartment
        // on the Lac: wrong on all three axes.
        let weak = scorer.score_match(&properties[0], &prospects[1]).unwrap();
        assert_eq!(weak.score, 30);
        assert!(weak.reasons.contains(&"Budget insuffisant".to_string()));
    }
}
