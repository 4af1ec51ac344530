//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the campaign task registry.

use crate::config::Config;
use estate_crm_core::ports::{
    AdsService, AnalysisService, EmailService, ExtractionService, SearchService, SmsService,
    StorageService,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StorageService>,
    pub config: Arc<Config>,
    pub analysis_adapter: Arc<dyn AnalysisService>,
    pub email_adapter: Arc<dyn EmailService>,
    pub sms_adapter: Arc<dyn SmsService>,
    pub search_adapter: Arc<dyn SearchService>,
    pub extraction_adapter: Arc<dyn ExtractionService>,
    pub ads_adapter: Arc<dyn AdsService>,
    pub campaign_runner: Arc<CampaignRunner>,
}

//=========================================================================================
// CampaignRunner (Background Delivery Tasks)
//=========================================================================================

/// Tracks the cancellation token of each campaign's delivery task. At most
/// one task runs per campaign: starting a new one cancels its predecessor.
#[derive(Default)]
pub struct CampaignRunner {
    tokens: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl CampaignRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh token for the campaign, cancelling any task already
    /// running for it.
    pub fn begin(&self, campaign_id: Uuid) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut tokens) = self.tokens.lock() {
            if let Some(previous) = tokens.insert(campaign_id, token.clone()) {
                previous.cancel();
            }
        }
        token
    }

    /// Cancels the campaign's running task, if any.
    pub fn stop(&self, campaign_id: Uuid) {
        if let Ok(mut tokens) = self.tokens.lock() {
            if let Some(token) = tokens.remove(&campaign_id) {
                token.cancel();
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beginning_a_campaign_cancels_the_previous_task() {
        let runner = CampaignRunner::new();
        let id = Uuid::new_v4();

        let first = runner.begin(id);
        assert!(!first.is_cancelled());

        let second = runner.begin(id);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn stop_cancels_and_forgets_the_token() {
        let runner = CampaignRunner::new();
        let id = Uuid::new_v4();
        let token = runner.begin(id);

        runner.stop(id);
        assert!(token.is_cancelled());

        // A second stop is harmless.
        runner.stop(id);
    }

    #[test]
    fn campaigns_are_tracked_independently() {
        let runner = CampaignRunner::new();
        let a = runner.begin(Uuid::new_v4());
        let b = runner.begin(Uuid::new_v4());

        a.cancel();
        assert!(!b.is_cancelled());
    }
}
