//! crates/estate_crm_core/src/generator.rs
//!
//! The prospecting simulator: synthesizes batches of scraped-looking
//! opportunities (listings and leads) from fixed pools, jitters coordinates
//! around real city centers, runs them through the coordinate verifier, and
//! templates a French-language "AI analysis" for each one.
//!
//! All randomness flows through the caller-supplied RNG so batches are
//! reproducible under a seeded generator.

use chrono::{Duration, Utc};
use rand::Rng;
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;

use crate::currency::format_currency;
use crate::domain::{
    AiAnalysis, Contact, Coordinates, Opportunity, OpportunityStatus, OpportunityType, Prospect,
    ProspectStatus,
};
use crate::geo::{verify_coordinates, CoordinateCheck};
use crate::ports::{OpportunityScorer, ScoreInputs};

//=========================================================================================
// Fixed pools
//=========================================================================================

const PROPERTY_TYPES: &[&str] = &[
    "Villa",
    "Appartement",
    "Duplex",
    "Studio",
    "Penthouse",
    "Maison",
    "Terrain",
    "Local Commercial",
];

#[derive(Debug, Clone, Copy)]
struct BaseLocation {
    name: &'static str,
    region: &'static str,
    lat: f64,
    lng: f64,
}

const LOCATIONS: &[BaseLocation] = &[
    BaseLocation { name: "La Marsa", region: "Grand Tunis", lat: 36.8785, lng: 10.3247 },
    BaseLocation { name: "Sidi Bou Said", region: "Grand Tunis", lat: 36.8675, lng: 10.3467 },
    BaseLocation { name: "Carthage", region: "Grand Tunis", lat: 36.8531, lng: 10.3294 },
    BaseLocation { name: "Berges du Lac 1", region: "Grand Tunis", lat: 36.842, lng: 10.2267 },
    BaseLocation { name: "Berges du Lac 2", region: "Grand Tunis", lat: 36.8456, lng: 10.2189 },
    BaseLocation { name: "Le Manar", region: "Grand Tunis", lat: 36.8378, lng: 10.1689 },
    BaseLocation { name: "El Menzah", region: "Grand Tunis", lat: 36.8456, lng: 10.1789 },
    BaseLocation { name: "Tunis Centre", region: "Grand Tunis", lat: 36.8065, lng: 10.1815 },
    BaseLocation { name: "Ariana Ville", region: "Grand Tunis", lat: 36.8625, lng: 10.1956 },
    BaseLocation { name: "Ben Arous", region: "Grand Tunis", lat: 36.7539, lng: 10.2178 },
    BaseLocation { name: "Manouba", region: "Grand Tunis", lat: 36.8089, lng: 10.0969 },
    BaseLocation { name: "Hammamet", region: "Nabeul", lat: 36.4, lng: 10.6167 },
    BaseLocation { name: "Nabeul Centre", region: "Nabeul", lat: 36.4561, lng: 10.7376 },
    BaseLocation { name: "Mrezgua", region: "Nabeul", lat: 36.4234, lng: 10.6789 },
    BaseLocation { name: "Sousse Centre", region: "Sousse", lat: 35.8256, lng: 10.6369 },
    BaseLocation { name: "Monastir Marina", region: "Monastir", lat: 35.7643, lng: 10.8113 },
    BaseLocation { name: "Sfax Ville", region: "Sfax", lat: 34.7406, lng: 10.7603 },
    BaseLocation { name: "Bizerte Port", region: "Bizerte", lat: 37.2744, lng: 9.8739 },
    BaseLocation { name: "Mahdia Plage", region: "Mahdia", lat: 35.5047, lng: 11.0622 },
    BaseLocation { name: "Zaghouan", region: "Zaghouan", lat: 36.4028, lng: 10.1425 },
];

const SOURCES: &[&str] = &[
    "Scraping IA - Tayara.tn",
    "Scraping IA - Mubawab.tn",
    "Scraping IA - Immobilier.tn",
    "Scraping IA - Facebook Marketplace",
    "Scraping IA - LinkedIn Immobilier",
    "Scraping IA - Tunisiens de France - Location",
    "Scraping IA - Tunisiens au Canada - Achat",
    "Scraping IA - Expat Tunisians - Location",
    "Scraping IA - Tunisiens en Allemagne - Achat",
    "Scraping IA - Tunisiens aux USA - Location",
    "Scraping IA - WhatsApp Groups Expat Location",
    "Scraping IA - Diaspora Investment Forum - Achat",
    "Scraping IA - Avito.ma",
    "Scraping IA - Reddit TunisianExpats - Location",
    "Scraping IA - Tunisie Annonce",
    "Scraping IA - Facebook Groupes Location Tunisie",
    "Scraping IA - Telegram Expat Tunisiens",
    "Scraping IA - Discord Tunisian Community",
    "Scraping IA - Clubhouse Immobilier Tunisie",
    "Scraping IA - Instagram Expat Stories",
];

const TUNISIAN_NAMES: &[&str] = &[
    "Ahmed Trabelsi", "Karim Ben Ali", "Sami Gharbi", "Mohamed Sassi", "Amina Bouaziz",
    "Fatma Khelifi", "Youssef Mejri", "Leila Hamdi", "Nizar Chatti", "Rim Jebali",
    "Hedi Mansouri", "Salma Dridi", "Tarek Ouali", "Ines Belhaj", "Fares Tlili",
    "Mariem Zouari", "Bilel Khemiri", "Nesrine Ayari", "Walid Rekik", "Dorra Sfar",
    "Mehdi Bouzid", "Sonia Cherif", "Rami Jendoubi", "Lina Maaloul", "Hatem Bouslama",
    "Wafa Ghanmi", "Slim Baccouche", "Emna Karray", "Chokri Belaid", "Sihem Boughanmi",
    "Adel Mhiri", "Houda Sellami", "Maher Agrebi", "Raoudha Laabidi", "Fathi Derouiche",
    "Samia Mabrouk", "Lotfi Abdelli", "Najet Radhouani", "Ridha Charfeddine", "Monia Brahim",
];

const FOREIGN_NAMES: &[&str] = &[
    "Marco Rossi", "Giulia Ferrari", "Alessandro Bianchi", "Francesca Romano", "Luca Conti",
    "Elena Ricci", "Pierre Dubois", "Marie Martin", "Jean Durand", "Sophie Leroy",
    "Antoine Moreau", "Camille Simon", "Hans Mueller", "Anna Schmidt", "Klaus Weber",
    "Petra Fischer", "Carlos Garcia", "Maria Rodriguez", "Antonio Lopez", "Isabel Martinez",
    "James Smith", "Emma Johnson", "Oliver Brown", "Charlotte Davis", "William Wilson",
    "Amelia Taylor",
];

const PROFESSIONS: &[&str] = &[
    "Freelance IT", "Ingénieur", "Médecin", "Consultant", "Entrepreneur",
    "Pharmacien", "Architecte", "Avocat", "Professeur", "Dentiste",
    "Comptable", "Développeur", "Designer", "Manager", "Directeur Commercial",
];

#[derive(Debug, Clone, Copy)]
struct Country {
    name: &'static str,
    phone: &'static str,
    cities: &'static [&'static str],
    nationality: &'static str,
    currency: &'static str,
}

const COUNTRIES: &[Country] = &[
    Country { name: "France", phone: "+33", cities: &["Paris", "Lyon", "Marseille", "Toulouse", "Nice"], nationality: "français", currency: "EUR" },
    Country { name: "Italie", phone: "+39", cities: &["Rome", "Milan", "Naples", "Turin", "Florence", "Venise", "Bologne"], nationality: "italien", currency: "EUR" },
    Country { name: "Espagne", phone: "+34", cities: &["Madrid", "Barcelone", "Valence", "Séville", "Bilbao"], nationality: "espagnol", currency: "EUR" },
    Country { name: "Allemagne", phone: "+49", cities: &["Berlin", "Munich", "Hambourg", "Cologne", "Frankfurt"], nationality: "allemand", currency: "EUR" },
    Country { name: "Belgique", phone: "+32", cities: &["Bruxelles", "Anvers", "Gand", "Liège", "Bruges"], nationality: "belge", currency: "EUR" },
    Country { name: "Suisse", phone: "+41", cities: &["Genève", "Zurich", "Bâle", "Lausanne", "Berne"], nationality: "suisse", currency: "CHF" },
    Country { name: "Canada", phone: "+1", cities: &["Montréal", "Toronto", "Vancouver", "Ottawa", "Calgary"], nationality: "canadien", currency: "CAD" },
    Country { name: "USA", phone: "+1", cities: &["New York", "Los Angeles", "Chicago", "Miami", "San Francisco"], nationality: "américain", currency: "USD" },
    Country { name: "Royaume-Uni", phone: "+44", cities: &["Londres", "Manchester", "Birmingham", "Liverpool", "Bristol"], nationality: "britannique", currency: "GBP" },
    Country { name: "Pays-Bas", phone: "+31", cities: &["Amsterdam", "Rotterdam", "La Haye", "Utrecht", "Eindhoven"], nationality: "néerlandais", currency: "EUR" },
];

const TUNISIA: Country = Country {
    name: "Tunisie",
    phone: "+216",
    cities: &["Tunis", "Sfax", "Sousse", "Monastir", "Nabeul"],
    nationality: "tunisien",
    currency: "TND",
};

//=========================================================================================
// Intent categories and price bounds
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Rental,
    Purchase,
    Investment,
    Mandate,
    Request,
}

const INTENTS: &[Intent] = &[
    Intent::Rental,
    Intent::Purchase,
    Intent::Investment,
    Intent::Mandate,
    Intent::Request,
];

impl Intent {
    fn label(self) -> &'static str {
        match self {
            Intent::Rental => "location",
            Intent::Purchase => "achat",
            Intent::Investment => "investissement",
            Intent::Mandate => "mandat",
            Intent::Request => "requete",
        }
    }

    /// Inclusive lower bound / exclusive upper bound of the budget draw.
    fn budget_bounds(self) -> (u64, u64) {
        match self {
            Intent::Rental => (800, 3_300), // TND per month
            Intent::Purchase => (150_000, 750_000),
            Intent::Investment => (200_000, 1_200_000),
            Intent::Mandate => (200_000, 1_000_000),
            Intent::Request => (100_000, 600_000),
        }
    }

    fn purposes(self) -> &'static [&'static str] {
        match self {
            Intent::Rental => &[
                "résidence temporaire",
                "location saisonnière",
                "pied-à-terre",
                "location longue durée",
                "résidence de vacances",
            ],
            Intent::Purchase => &[
                "résidence secondaire",
                "résidence principale future",
                "maison de retraite",
                "résidence familiale",
            ],
            Intent::Investment => &[
                "investissement locatif",
                "investissement patrimonial",
                "diversification de portefeuille",
                "placement immobilier",
                "projet de développement",
            ],
            Intent::Mandate => &[
                "vente de propriété familiale",
                "mise en location de bien",
                "vente d'investissement",
                "liquidation de patrimoine",
                "changement de résidence",
            ],
            Intent::Request => &[
                "recherche résidence principale",
                "recherche investissement locatif",
                "recherche résidence secondaire",
                "recherche local commercial",
                "recherche terrain constructible",
            ],
        }
    }
}

/// Price bounds for generated property listings.
pub const PROPERTY_PRICE_BOUNDS: (u64, u64) = (200_000, 1_000_000);

/// Per-intent lead budget bounds, exposed for tests and documentation.
pub fn lead_budget_bounds(intent_label: &str) -> Option<(u64, u64)> {
    INTENTS
        .iter()
        .find(|i| i.label() == intent_label)
        .map(|i| i.budget_bounds())
}

//=========================================================================================
// The generator
//=========================================================================================

/// The default scoring stub: uniform noise in [60, 100], independent of every
/// generated attribute. A placeholder until a real scoring service exists.
pub struct UniformRandomScorer;

impl OpportunityScorer for UniformRandomScorer {
    fn score(&self, rng: &mut dyn RngCore, _inputs: &ScoreInputs<'_>) -> u8 {
        rng.gen_range(60..=100)
    }
}

/// Batch generation parameters.
#[derive(Debug, Clone)]
pub struct GenerationSpec {
    /// Region or city names narrowing the location pool. An empty selection
    /// (or one matching nothing) means the full pool.
    pub regions: Vec<String>,
    /// Display currency for generated property listings.
    pub currency: String,
}

impl Default for GenerationSpec {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            currency: "TND".to_string(),
        }
    }
}

pub struct OpportunityGenerator {
    scorer: Arc<dyn OpportunityScorer>,
}

impl Default for OpportunityGenerator {
    fn default() -> Self {
        Self::new(Arc::new(UniformRandomScorer))
    }
}

impl OpportunityGenerator {
    pub fn new(scorer: Arc<dyn OpportunityScorer>) -> Self {
        Self { scorer }
    }

    /// Generates a batch of 25-45 opportunities: 60% property listings, 40%
    /// leads. Leads split 60% local / 40% abroad (half of those foreign
    /// investors, half Tunisian expatriates) with a uniform intent category.
    pub fn generate(&self, rng: &mut dyn RngCore, spec: &GenerationSpec) -> Vec<Opportunity> {
        let pool: Vec<BaseLocation> = if spec.regions.is_empty() {
            LOCATIONS.to_vec()
        } else {
            let narrowed: Vec<BaseLocation> = LOCATIONS
                .iter()
                .filter(|l| {
                    spec.regions.iter().any(|r| r == l.name || r == l.region)
                })
                .copied()
                .collect();
            if narrowed.is_empty() {
                LOCATIONS.to_vec()
            } else {
                narrowed
            }
        };

        let count = rng.gen_range(25..=45);
        let mut batch = Vec::with_capacity(count);
        for i in 0..count {
            let is_property = rng.gen_bool(0.6);
            let location = pool[rng.gen_range(0..pool.len())];
            if is_property {
                batch.push(self.generate_property(rng, spec, location, i));
            } else {
                batch.push(self.generate_lead(rng, location, i));
            }
        }
        batch
    }

    fn generate_property(
        &self,
        rng: &mut dyn RngCore,
        spec: &GenerationSpec,
        location: BaseLocation,
        index: usize,
    ) -> Opportunity {
        let property_type = PROPERTY_TYPES[rng.gen_range(0..PROPERTY_TYPES.len())];
        let source = SOURCES[rng.gen_range(0..SOURCES.len())];
        let name = TUNISIAN_NAMES[rng.gen_range(0..TUNISIAN_NAMES.len())];
        let (lat, lng) = jitter(rng, location);
        let check = verify_coordinates(location.name, lat, lng);
        let price = rng.gen_range(PROPERTY_PRICE_BOUNDS.0..PROPERTY_PRICE_BOUNDS.1);
        let score = self.scorer.score(
            rng,
            &ScoreInputs {
                kind: OpportunityType::Property,
                location: location.name,
                price: Some(price),
            },
        );

        let style = if rng.gen_bool(0.5) { "Moderne" } else { "de Luxe" };
        let rooms = rng.gen_range(2..=5);
        let surface = rng.gen_range(80..280);
        let feature = if rng.gen_bool(0.5) { "avec piscine" } else { "vue mer" };
        let annex = if rng.gen_bool(0.5) { "garage" } else { "terrasse" };
        let phone = local_phone(rng);

        let quality = if score > 80 {
            "exceptionnelle"
        } else if score > 70 {
            "de qualité"
        } else {
            "intéressante"
        };
        let coords_label = if check.verified {
            "coordonnées vérifiées"
        } else {
            "coordonnées à vérifier"
        };

        Opportunity {
            id: Uuid::new_v4(),
            title: format!("{property_type} {style} à {}", location.name),
            description: format!(
                "{property_type} {rooms} pièces, {surface}m², {feature}, {annex}, {}",
                location.region
            ),
            source: source.to_string(),
            url: format!("#property-{index}"),
            score,
            kind: OpportunityType::Property,
            location: location.name.to_string(),
            region: location.region.to_string(),
            price: Some(price),
            currency: Some(spec.currency.clone()),
            contact: Some(Contact {
                name: name.to_string(),
                phone: phone.clone(),
                email: format!("{}@email.tn", mailbox(name)),
                whatsapp: phone,
                company: None,
                linkedin: None,
                address: format!(
                    "{} Rue {}, {}",
                    rng.gen_range(1..=100),
                    if rng.gen_bool(0.5) { "Habib Bourguiba" } else { "de la République" },
                    location.name
                ),
                coordinates: Some(Coordinates { lat, lng }),
            }),
            ai_analysis: property_analysis(rng, property_type, quality, coords_label, &check),
            created_at: Utc::now() - Duration::seconds(rng.gen_range(0..300)),
            status: OpportunityStatus::New,
        }
    }

    fn generate_lead(
        &self,
        rng: &mut dyn RngCore,
        location: BaseLocation,
        index: usize,
    ) -> Opportunity {
        let property_type = PROPERTY_TYPES[rng.gen_range(0..PROPERTY_TYPES.len())];
        let source = SOURCES[rng.gen_range(0..SOURCES.len())];
        let is_local = rng.gen_bool(0.6);
        let is_foreigner = !is_local && rng.gen_bool(0.5);
        let name = if is_foreigner {
            FOREIGN_NAMES[rng.gen_range(0..FOREIGN_NAMES.len())]
        } else {
            TUNISIAN_NAMES[rng.gen_range(0..TUNISIAN_NAMES.len())]
        };
        let profession = PROFESSIONS[rng.gen_range(0..PROFESSIONS.len())];
        let country = if is_local {
            TUNISIA
        } else {
            COUNTRIES[rng.gen_range(0..COUNTRIES.len())]
        };
        let city = country.cities[rng.gen_range(0..country.cities.len())];

        let intent = INTENTS[rng.gen_range(0..INTENTS.len())];
        let is_mandate = intent == Intent::Mandate;
        let is_request = intent == Intent::Request || rng.gen_bool(0.7);
        let label = if is_mandate {
            "MANDAT"
        } else if is_request {
            "REQUÊTE"
        } else {
            "LEAD"
        };

        let (low, high) = intent.budget_bounds();
        let budget = rng.gen_range(low..high);
        let budget_currency = match intent {
            Intent::Rental | Intent::Mandate | Intent::Request => "TND",
            Intent::Purchase | Intent::Investment => {
                if is_local { "TND" } else { country.currency }
            }
        };
        let budget_display = match intent {
            Intent::Rental => format!("{budget} TND/mois"),
            Intent::Mandate => format!("{} (Mandat)", format_currency(budget, "TND")),
            Intent::Request => format!("{} (Recherche)", format_currency(budget, "TND")),
            _ => format_currency(budget, budget_currency),
        };

        let purposes = intent.purposes();
        let purpose = purposes[rng.gen_range(0..purposes.len())];
        let profile = if is_local {
            "Prospect local tunisien".to_string()
        } else if is_foreigner {
            format!("Investisseur {}", country.nationality)
        } else {
            "Tunisien expatrié".to_string()
        };
        let residence = if is_local {
            "en Tunisie".to_string()
        } else {
            format!("en {}", country.name)
        };
        let verb = if is_mandate { "propose" } else { "recherche" };

        let phone = if is_local { local_phone(rng) } else { foreign_phone(rng, country.phone) };
        let email_domain = if is_local {
            pick_domain(rng, &["gmail.com", "yahoo.fr", "hotmail.com"])
        } else {
            pick_domain(rng, &["gmail.com", "outlook.com", "yahoo.com"])
        };

        let score = self.scorer.score(
            rng,
            &ScoreInputs {
                kind: OpportunityType::Lead,
                location: location.name,
                price: Some(budget),
            },
        );

        let ptype_lower = property_type.to_lowercase();
        let intent_label = intent.label();

        Opportunity {
            id: Uuid::new_v4(),
            title: format!(
                "{label}: {name} de {city} - {} {property_type} en {intent_label}",
                if is_mandate { "Propose" } else { "Recherche" }
            ),
            description: format!(
                "{profile} {residence} {verb} {ptype_lower} en {intent_label} pour {purpose} à {}. {}: {budget_display}",
                location.name,
                if is_mandate { "Prix proposé" } else { "Budget" }
            ),
            source: source.to_string(),
            url: format!("#lead-{index}"),
            score,
            kind: OpportunityType::Lead,
            location: location.name.to_string(),
            region: location.region.to_string(),
            price: Some(budget),
            currency: Some(budget_currency.to_string()),
            contact: Some(Contact {
                name: name.to_string(),
                phone: phone.clone(),
                email: format!("{}@{email_domain}", mailbox(name)),
                whatsapp: phone,
                company: Some(profession.to_string()),
                linkedin: Some(format!(
                    "https://linkedin.com/in/{}-{}",
                    name.to_lowercase().replace(' ', "-"),
                    rng.gen_range(0..1000)
                )),
                address: if is_local {
                    format!("{}, Tunisie", location.name)
                } else {
                    format!("{city}, {}", country.name)
                },
                coordinates: None,
            }),
            ai_analysis: lead_analysis(
                label,
                &profile,
                &residence,
                is_local,
                is_foreigner,
                is_mandate,
                intent,
                &country,
                &ptype_lower,
                purpose,
                &budget_display,
            ),
            created_at: Utc::now() - Duration::seconds(rng.gen_range(0..600)),
            status: OpportunityStatus::New,
        }
    }
}

//=========================================================================================
// Analysis templating
//=========================================================================================

fn property_analysis(
    rng: &mut dyn RngCore,
    property_type: &str,
    quality: &str,
    coords_label: &str,
    check: &CoordinateCheck,
) -> AiAnalysis {
    AiAnalysis {
        summary: format!(
            "Propriété {quality} avec {coords_label} (précision: {}).",
            check.accuracy.label()
        ),
        strengths: vec![
            if check.verified {
                format!("Localisation vérifiée IA - {}", check.city_label())
            } else {
                "Localisation à vérifier".to_string()
            },
            format!("{property_type} en bon état"),
            "Prix compétitif pour la zone".to_string(),
            if rng.gen_bool(0.5) {
                "Propriétaire motivé".to_string()
            } else {
                "Négociation possible".to_string()
            },
            if rng.gen_bool(0.5) {
                "Proche commodités".to_string()
            } else {
                "Quartier calme".to_string()
            },
        ],
        risks: vec![
            if check.verified {
                "Marché concurrentiel".to_string()
            } else {
                "Coordonnées non vérifiées".to_string()
            },
            if rng.gen_bool(0.5) {
                "Travaux possibles".to_string()
            } else {
                "Coûts d'entretien".to_string()
            },
        ],
        recommendations: vec![
            "Visite recommandée".to_string(),
            "Vérifier les documents".to_string(),
            if check.verified {
                "Coordonnées validées par IA".to_string()
            } else {
                "Valider la localisation".to_string()
            },
            "Négocier le prix".to_string(),
        ],
    }
}

#[allow(clippy::too_many_arguments)]
fn lead_analysis(
    label: &str,
    profile: &str,
    residence: &str,
    is_local: bool,
    is_foreigner: bool,
    is_mandate: bool,
    intent: Intent,
    country: &Country,
    ptype_lower: &str,
    purpose: &str,
    budget_display: &str,
) -> AiAnalysis {
    let verb = if is_mandate { "proposant" } else { "cherchant" };
    let currency_strength = match country.currency {
        "EUR" => "Revenus en euros".to_string(),
        "USD" => "Revenus en dollars".to_string(),
        "CHF" => "Revenus en francs suisses".to_string(),
        "GBP" => "Revenus en livres sterling".to_string(),
        _ => "Revenus en devise forte".to_string(),
    };
    let intent_label = intent.label();

    AiAnalysis {
        summary: format!(
            "{label} - {profile} {residence} avec revenus stables {verb} {ptype_lower} en \
             {intent_label} pour {purpose}. Source: Firecrawl API - Analyse automatique des \
             annonces locales."
        ),
        strengths: vec![
            if is_local {
                "Connaissance parfaite du marché local".to_string()
            } else {
                currency_strength
            },
            if is_local {
                "Proximité géographique".to_string()
            } else if is_foreigner {
                "Intérêt pour le marché tunisien".to_string()
            } else {
                "Connaissance du marché tunisien".to_string()
            },
            format!(
                "{} active - {intent_label}",
                if is_mandate { "Offre" } else { "Recherche" }
            ),
            format!(
                "{} {} défini: {budget_display}",
                if is_mandate { "Prix proposé" } else { "Budget" },
                if intent == Intent::Rental { "mensuel" } else { "total" }
            ),
            if is_local {
                "Profil local fiable".to_string()
            } else if is_foreigner {
                "Profil investisseur international".to_string()
            } else {
                "Profil expatrié fiable".to_string()
            },
            match intent {
                Intent::Rental if is_mandate => "Bien disponible immédiatement".to_string(),
                Intent::Rental => "Besoin immédiat de logement".to_string(),
                Intent::Investment => "Projet d'investissement structuré".to_string(),
                Intent::Mandate => "Mandat de vente confirmé".to_string(),
                _ => "Projet d'acquisition défini".to_string(),
            },
            if is_local {
                "Facilité de communication".to_string()
            } else if is_foreigner {
                "Diversification géographique".to_string()
            } else {
                "Lien émotionnel avec la Tunisie".to_string()
            },
            "Détecté via Firecrawl API - Données vérifiées".to_string(),
        ],
        risks: vec![
            "Gestion à distance".to_string(),
            if intent == Intent::Rental {
                "Durée de location incertaine".to_string()
            } else {
                "Financement international".to_string()
            },
            format!("Comparaison avec marché {}", country.name.to_lowercase()),
            if intent == Intent::Rental {
                "Garanties locatives".to_string()
            } else {
                "Réglementations de change".to_string()
            },
            if is_foreigner {
                "Barrière linguistique possible".to_string()
            } else {
                "Formalités administratives".to_string()
            },
            if intent == Intent::Investment {
                "Fluctuations du marché".to_string()
            } else {
                "Évolution réglementaire".to_string()
            },
        ],
        recommendations: vec![
            "Contact immédiat".to_string(),
            match intent {
                Intent::Rental => "Proposer visite virtuelle rapide".to_string(),
                Intent::Investment => "Présenter ROI et analyse de marché".to_string(),
                _ => "Présenter dossier complet".to_string(),
            },
            if intent == Intent::Rental {
                "Préparer contrat de location".to_string()
            } else {
                "Service de gestion locative".to_string()
            },
            "Visite virtuelle détaillée".to_string(),
            if intent == Intent::Rental {
                "Assistance administrative".to_string()
            } else {
                "Service de conciergerie".to_string()
            },
            if is_foreigner {
                "Support multilingue".to_string()
            } else {
                "Accompagnement personnalisé".to_string()
            },
        ],
    }
}

//=========================================================================================
// Conversion
//=========================================================================================

/// Maps an opportunity onto a new hot-request prospect. The caller is
/// responsible for persisting the prospect, flipping the opportunity's status
/// to `converted`, and keeping the opportunity in its list (audit trail).
pub fn convert_to_prospect(opportunity: &Opportunity) -> Prospect {
    let contact = opportunity.contact.as_ref();
    Prospect {
        id: Uuid::new_v4(),
        client: contact
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Prospect IA".to_string()),
        email: contact.map(|c| c.email.clone()).unwrap_or_default(),
        phone: contact.map(|c| c.phone.clone()).unwrap_or_default(),
        budget: opportunity.price.unwrap_or(0),
        currency: opportunity
            .currency
            .clone()
            .unwrap_or_else(|| "TND".to_string()),
        preferred_location: opportunity.location.clone(),
        preferred_type: if opportunity.kind == OpportunityType::Property {
            "Appartement".to_string()
        } else {
            "Divers".to_string()
        },
        status: ProspectStatus::HotRequest,
        notes: format!(
            "Généré par IA - Score: {}\nSource: {}\nDate de candidature: {}\nAnalyse: {}",
            opportunity.score,
            opportunity.source,
            opportunity.created_at.format("%d/%m/%Y"),
            opportunity.ai_analysis.summary
        ),
        // The opportunity's creation date is preserved as the application date.
        created_at: opportunity.created_at,
    }
}

//=========================================================================================
// Small helpers
//=========================================================================================

/// Jitters a base point by up to ±0.005° on each axis.
fn jitter(rng: &mut dyn RngCore, location: BaseLocation) -> (f64, f64) {
    const VARIATION: f64 = 0.01;
    let lat = location.lat + (rng.gen::<f64>() - 0.5) * VARIATION;
    let lng = location.lng + (rng.gen::<f64>() - 0.5) * VARIATION;
    (lat, lng)
}

fn local_phone(rng: &mut dyn RngCore) -> String {
    format!(
        "+216 {} {} {}",
        rng.gen_range(10..100),
        rng.gen_range(100..1000),
        rng.gen_range(100..1000)
    )
}

fn foreign_phone(rng: &mut dyn RngCore, prefix: &str) -> String {
    format!(
        "{prefix} {} {} {}",
        rng.gen_range(100..1000),
        rng.gen_range(100..1000),
        rng.gen_range(100..1000)
    )
}

fn mailbox(name: &str) -> String {
    name.to_lowercase().replace(' ', ".")
}

fn pick_domain(rng: &mut dyn RngCore, domains: &'static [&'static str]) -> &'static str {
    domains[rng.gen_range(0..domains.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn batch(seed: u64, spec: &GenerationSpec) -> Vec<Opportunity> {
        let mut rng = StdRng::seed_from_u64(seed);
        OpportunityGenerator::default().generate(&mut rng, spec)
    }

    #[test]
    fn batch_size_is_within_bounds() {
        for seed in 0..20 {
            let n = batch(seed, &GenerationSpec::default()).len();
            assert!((25..=45).contains(&n), "batch of {n}");
        }
    }

    #[test]
    fn scores_stay_in_the_stub_range() {
        for seed in 0..10 {
            for opp in batch(seed, &GenerationSpec::default()) {
                assert!((60..=100).contains(&opp.score), "score {}", opp.score);
            }
        }
    }

    #[test]
    fn property_prices_respect_category_bounds() {
        for seed in 0..10 {
            for opp in batch(seed, &GenerationSpec::default()) {
                if opp.kind == OpportunityType::Property {
                    let price = opp.price.expect("properties always carry a price");
                    assert!((PROPERTY_PRICE_BOUNDS.0..PROPERTY_PRICE_BOUNDS.1).contains(&price));
                }
            }
        }
    }

    #[test]
    fn lead_budgets_respect_intent_bounds() {
        // The widest and narrowest intent ranges cover every possible draw.
        for seed in 0..10 {
            for opp in batch(seed, &GenerationSpec::default()) {
                if opp.kind == OpportunityType::Lead {
                    let budget = opp.price.expect("leads always carry a budget");
                    assert!((800..1_200_000).contains(&budget));
                }
            }
        }
        assert_eq!(lead_budget_bounds("location"), Some((800, 3_300)));
        assert_eq!(lead_budget_bounds("investissement"), Some((200_000, 1_200_000)));
        assert_eq!(lead_budget_bounds("autre"), None);
    }

    #[test]
    fn region_selection_narrows_the_location_pool() {
        let spec = GenerationSpec {
            regions: vec!["Nabeul".to_string()],
            currency: "TND".to_string(),
        };
        for opp in batch(11, &spec) {
            assert_eq!(opp.region, "Nabeul", "location {}", opp.location);
        }
    }

    #[test]
    fn unknown_region_selection_falls_back_to_the_full_pool() {
        let spec = GenerationSpec {
            regions: vec!["Atlantide".to_string()],
            currency: "TND".to_string(),
        };
        assert!(!batch(13, &spec).is_empty());
    }

    #[test]
    fn generated_property_coordinates_verify_against_their_own_city() {
        // Jitter is ±0.005°, well inside every gazetteer tolerance, so any
        // generated property whose city is in the gazetteer must verify.
        for opp in batch(17, &GenerationSpec::default()) {
            if opp.kind != OpportunityType::Property {
                continue;
            }
            let coords = opp
                .contact
                .as_ref()
                .and_then(|c| c.coordinates)
                .expect("properties carry coordinates");
            let check = verify_coordinates(&opp.location, coords.lat, coords.lng);
            let in_gazetteer = crate::geo::GAZETTEER
                .iter()
                .any(|g| opp.location.to_lowercase().contains(&g.name.to_lowercase()));
            if in_gazetteer {
                assert!(check.verified, "{} should verify", opp.location);
            }
        }
    }

    #[test]
    fn seeded_batches_are_reproducible() {
        let a = batch(99, &GenerationSpec::default());
        let b = batch(99, &GenerationSpec::default());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.title, y.title);
            assert_eq!(x.score, y.score);
            assert_eq!(x.price, y.price);
        }
    }

    #[test]
    fn conversion_maps_the_documented_fields() {
        let opps = batch(5, &GenerationSpec::default());
        let opp = opps
            .iter()
            .find(|o| o.contact.is_some())
            .expect("every generated opportunity has a contact");

        let prospect = convert_to_prospect(opp);
        assert_eq!(prospect.client, opp.contact.as_ref().unwrap().name);
        assert_eq!(prospect.budget, opp.price.unwrap());
        assert_eq!(prospect.status, ProspectStatus::HotRequest);
        assert_eq!(prospect.created_at, opp.created_at);
        assert!(prospect.notes.contains(&format!("Score: {}", opp.score)));
    }

    #[test]
    fn conversion_without_contact_falls_back_to_placeholder_client() {
        let mut opps = batch(5, &GenerationSpec::default());
        let opp = &mut opps[0];
        opp.contact = None;
        opp.price = None;

        let prospect = convert_to_prospect(opp);
        assert_eq!(prospect.client, "Prospect IA");
        assert_eq!(prospect.budget, 0);
    }
}
