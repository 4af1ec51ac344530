//! services/api/src/web/campaign_task.rs
//!
//! The background task that simulates delivery for one launched campaign.
//! One tick per second: load the campaign, advance its counters, persist.
//! The task exits when the campaign completes, leaves the active state, or
//! its cancellation token fires; after cancellation it never writes again.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use estate_crm_core::campaign::{advance, TickOutcome};
use estate_crm_core::ports::StorageService;

/// Drives one campaign's simulated delivery until completion or cancellation.
pub async fn delivery_process(
    store: Arc<dyn StorageService>,
    campaign_id: Uuid,
    token: CancellationToken,
) {
    // StdRng rather than the thread-local RNG so the future stays Send.
    let mut rng = StdRng::from_entropy();
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick of a tokio interval fires immediately; skip it so the
    // first batch lands one second after launch.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!(%campaign_id, "Campaign delivery task cancelled");
                return;
            }
            _ = interval.tick() => {
                match tick(&store, campaign_id, &mut rng).await {
                    Ok(TickOutcome::Advanced) => {}
                    Ok(TickOutcome::Completed) => {
                        info!(%campaign_id, "Campaign delivery complete");
                        return;
                    }
                    Ok(TickOutcome::Idle) => {
                        // Paused, deleted or otherwise no longer active.
                        info!(%campaign_id, "Campaign no longer active, stopping delivery task");
                        return;
                    }
                    Err(e) => {
                        warn!(%campaign_id, error = %e, "Campaign tick failed");
                        return;
                    }
                }
            }
        }
    }
}

async fn tick(
    store: &Arc<dyn StorageService>,
    campaign_id: Uuid,
    rng: &mut StdRng,
) -> Result<TickOutcome, estate_crm_core::ports::PortError> {
    let mut campaigns = store.load_campaigns().await?;
    let Some(campaign) = campaigns.iter_mut().find(|c| c.id == campaign_id) else {
        return Ok(TickOutcome::Idle);
    };

    let outcome = advance(campaign, rng);
    if outcome != TickOutcome::Idle {
        store.save_campaigns(&campaigns).await?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::JsonFileStore;
    use chrono::Utc;
    use estate_crm_core::domain::{Campaign, CampaignChannel, CampaignStatus};

    fn campaign(status: CampaignStatus, recipients: u64) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            name: "Relance".to_string(),
            channel: CampaignChannel::Email,
            status,
            recipients,
            sent: 0,
            opened: 0,
            clicked: 0,
            converted: 0,
            message: "Bonjour".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn tick_advances_and_persists_an_active_campaign() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StorageService> = Arc::new(JsonFileStore::new(dir.path()).unwrap());
        let active = campaign(CampaignStatus::Active, 1_000);
        let id = active.id;
        store.save_campaigns(&[active]).await.unwrap();

        let mut rng = StdRng::seed_from_u64(4);
        let outcome = tick(&store, id, &mut rng).await.unwrap();
        assert_eq!(outcome, TickOutcome::Advanced);

        let reloaded = store.load_campaigns().await.unwrap();
        assert!(reloaded[0].sent >= 5);
    }

    #[tokio::test]
    async fn tick_on_a_paused_campaign_leaves_the_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StorageService> = Arc::new(JsonFileStore::new(dir.path()).unwrap());
        let paused = campaign(CampaignStatus::Paused, 1_000);
        let id = paused.id;
        store.save_campaigns(&[paused]).await.unwrap();

        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(tick(&store, id, &mut rng).await.unwrap(), TickOutcome::Idle);
        assert_eq!(store.load_campaigns().await.unwrap()[0].sent, 0);
    }

    #[tokio::test]
    async fn tick_on_a_missing_campaign_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StorageService> = Arc::new(JsonFileStore::new(dir.path()).unwrap());
        let mut rng = StdRng::seed_from_u64(4);
        let outcome = tick(&store, Uuid::new_v4(), &mut rng).await.unwrap();
        assert_eq!(outcome, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn cancelled_task_exits_without_further_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StorageService> = Arc::new(JsonFileStore::new(dir.path()).unwrap());
        let active = campaign(CampaignStatus::Active, 1_000_000);
        let id = active.id;
        store.save_campaigns(&[active]).await.unwrap();

        let token = CancellationToken::new();
        let handle = tokio::spawn(delivery_process(store.clone(), id, token.clone()));

        token.cancel();
        handle.await.unwrap();

        let frozen = store.load_campaigns().await.unwrap()[0].clone();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.load_campaigns().await.unwrap()[0].sent, frozen.sent);
    }
}
