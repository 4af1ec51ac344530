pub mod campaign;
pub mod currency;
pub mod domain;
pub mod filter;
pub mod generator;
pub mod geo;
pub mod matching;
pub mod ports;

pub use domain::{
    Campaign, CampaignChannel, CampaignStatus, Match, MatchScore, Opportunity, OpportunityStatus,
    OpportunityType, Property, Prospect,
};
pub use ports::{
    AnalysisService, EmailService, ExtractionService, MatchScoringService, OpportunityScorer,
    PortError, PortResult, SearchService, SmsService, StorageService,
};
