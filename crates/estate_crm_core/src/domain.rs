//! crates/estate_crm_core/src/domain.rs
//!
//! Defines the pure, core data structures for the CRM.
//! These structs are independent of any storage backend; the serde derives
//! mirror the camelCase JSON shape the persisted collections use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Properties
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Villa,
    Apartment,
    House,
    Studio,
    Commercial,
    Land,
}

impl PropertyType {
    /// French display label, as used in listings and titles.
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Villa => "Villa",
            PropertyType::Apartment => "Appartement",
            PropertyType::House => "Maison",
            PropertyType::Studio => "Studio",
            PropertyType::Commercial => "Local Commercial",
            PropertyType::Land => "Terrain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    ForSale,
    ForRent,
    Sold,
    Reserved,
}

/// A property listing. Prices and areas are unsigned, which enforces the
/// `price >= 0` / `area >= 0` invariants at the type level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub price: u64,
    pub currency: String,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    /// Surface in square meters.
    pub area: u32,
    pub status: PropertyStatus,
    pub image_url: String,
}

//=========================================================================================
// Prospects (buy-side requests) and Mandates (sell-side agreements)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectStatus {
    HotRequest,
    Negotiating,
    ColdRequest,
    Converted,
}

/// A buyer/renter's stated need ("Requête" in the source locale).
/// Status transitions are user-driven; there is no automatic state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: Uuid,
    pub client: String,
    pub email: String,
    pub phone: String,
    pub budget: u64,
    pub currency: String,
    pub preferred_location: String,
    pub preferred_type: String,
    pub status: ProspectStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateStatus {
    Simple,
    Exclusive,
    SemiExclusive,
}

/// A listing agreement with a property owner (sell-side).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mandate {
    pub id: Uuid,
    pub owner: String,
    pub email: String,
    pub phone: String,
    pub asking_price: u64,
    pub currency: String,
    pub property_type: PropertyType,
    pub location: String,
    pub area: u32,
    pub status: MandateStatus,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Matches
//=========================================================================================

/// The result of scoring one (property, prospect) pair: a 0-100 score and an
/// ordered list of human-readable reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: u8,
    pub reasons: Vec<String>,
}

/// A scored pairing between a property and a prospect. Derived data: matches
/// are recomputed from the scoring strategy on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub property_id: Uuid,
    pub prospect_id: Uuid,
    pub score: u8,
    pub reasons: Vec<String>,
}

//=========================================================================================
// Opportunities (prospecting simulator output)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityType {
    Property,
    Lead,
    Contact,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    New,
    Reviewed,
    Converted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Contact sub-record attached to an opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub whatsapp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// The templated "AI analysis" attached to every generated opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub summary: String,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A synthetically generated lead or listing candidate surfaced by the
/// prospecting simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub source: String,
    pub url: String,
    pub score: u8,
    #[serde(rename = "type")]
    pub kind: OpportunityType,
    pub location: String,
    #[serde(default)]
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    pub ai_analysis: AiAnalysis,
    pub created_at: DateTime<Utc>,
    pub status: OpportunityStatus,
}

//=========================================================================================
// Campaigns
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignChannel {
    Email,
    Sms,
    Whatsapp,
    Meta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

/// A marketing campaign. While `active`, the delivery counters advance on a
/// simulated timer until `sent == recipients`, at which point the status
/// becomes `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub channel: CampaignChannel,
    pub status: CampaignStatus,
    pub recipients: u64,
    pub sent: u64,
    pub opened: u64,
    pub clicked: u64,
    pub converted: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn open_rate(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.opened as f64 / self.sent as f64 * 100.0
        }
    }

    pub fn conversion_rate(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.converted as f64 / self.sent as f64 * 100.0
        }
    }
}

//=========================================================================================
// AI provider and integration configuration
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

/// A configured AI provider. The api key is an opaque secret; no validation
/// beyond a presence check is performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiProvider {
    pub id: String,
    pub name: String,
    pub kind: AiProviderKind,
    pub api_key: String,
    pub enabled: bool,
}

impl AiProvider {
    /// A provider is usable when it is enabled and carries a non-empty key.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

/// Per-integration settings, persisted as an opaque JSON map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationConfig {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opportunity_round_trips_through_camel_case_json() {
        let opp = Opportunity {
            id: Uuid::new_v4(),
            title: "Villa Moderne à La Marsa".to_string(),
            description: "Villa 4 pièces, 180m²".to_string(),
            source: "Scraping IA - Tayara.tn".to_string(),
            url: "#property-0".to_string(),
            score: 88,
            kind: OpportunityType::Property,
            location: "La Marsa".to_string(),
            region: "Grand Tunis".to_string(),
            price: Some(450_000),
            currency: Some("TND".to_string()),
            contact: None,
            ai_analysis: AiAnalysis {
                summary: "Propriété de qualité".to_string(),
                strengths: vec!["Emplacement premium".to_string()],
                risks: vec![],
                recommendations: vec![],
            },
            created_at: Utc::now(),
            status: OpportunityStatus::New,
        };

        let json = serde_json::to_value(&opp).unwrap();
        assert_eq!(json["type"], "property");
        assert_eq!(json["status"], "new");
        assert!(json.get("aiAnalysis").is_some());
        assert!(json.get("createdAt").is_some());

        let back: Opportunity = serde_json::from_value(json).unwrap();
        assert_eq!(back.score, 88);
        assert_eq!(back.kind, OpportunityType::Property);
    }

    #[test]
    fn campaign_rates_handle_zero_sent() {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: "Newsletter".to_string(),
            channel: CampaignChannel::Email,
            status: CampaignStatus::Draft,
            recipients: 100,
            sent: 0,
            opened: 0,
            clicked: 0,
            converted: 0,
            message: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(campaign.open_rate(), 0.0);
        assert_eq!(campaign.conversion_rate(), 0.0);
    }
}
