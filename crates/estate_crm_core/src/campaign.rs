//! crates/estate_crm_core/src/campaign.rs
//!
//! Campaign delivery simulation: one tick advances the counters of an active
//! campaign. The owning task drives this on a timer and persists the result.

use rand::Rng;
use rand::RngCore;

use crate::domain::{Campaign, CampaignStatus};

/// Outcome of a single simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Counters advanced; the campaign is still delivering.
    Advanced,
    /// The last batch was sent; status flipped to `completed`.
    Completed,
    /// The campaign is not active; nothing was touched.
    Idle,
}

/// Advances an active campaign by one simulated batch:
/// `sent += uniform[5, 25]` clamped to `recipients`, then the engagement
/// counters are rederived from `sent` with fresh uniform rates
/// (open 45-70%, click 8-20% of opens, conversion 5-20% of clicks).
///
/// `sent` is non-decreasing and never exceeds `recipients`; once it reaches
/// `recipients` the status becomes `completed` and further ticks are no-ops.
/// Relaunching resumes from the current counters, not from zero.
pub fn advance(campaign: &mut Campaign, rng: &mut dyn RngCore) -> TickOutcome {
    if campaign.status != CampaignStatus::Active {
        return TickOutcome::Idle;
    }

    let batch: u64 = rng.gen_range(5..=25);
    campaign.sent = (campaign.sent + batch).min(campaign.recipients);
    campaign.opened = (campaign.sent as f64 * rng.gen_range(0.45..0.70)) as u64;
    campaign.clicked = (campaign.opened as f64 * rng.gen_range(0.08..0.20)) as u64;
    campaign.converted = (campaign.clicked as f64 * rng.gen_range(0.05..0.20)) as u64;

    if campaign.sent >= campaign.recipients {
        campaign.status = CampaignStatus::Completed;
        TickOutcome::Completed
    } else {
        TickOutcome::Advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CampaignChannel;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn active_campaign(recipients: u64) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            name: "Relance Prospects".to_string(),
            channel: CampaignChannel::Email,
            status: CampaignStatus::Active,
            recipients,
            sent: 0,
            opened: 0,
            clicked: 0,
            converted: 0,
            message: "Nouvelle offre".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sent_is_monotonic_and_bounded_until_completion() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut campaign = active_campaign(500);
        let mut previous_sent = 0;

        loop {
            let outcome = advance(&mut campaign, &mut rng);
            assert!(campaign.sent >= previous_sent);
            assert!(campaign.sent <= campaign.recipients);
            assert!(campaign.opened <= campaign.sent);
            assert!(campaign.clicked <= campaign.opened);
            assert!(campaign.converted <= campaign.clicked);
            previous_sent = campaign.sent;
            if outcome == TickOutcome::Completed {
                break;
            }
            assert_eq!(outcome, TickOutcome::Advanced);
        }

        assert_eq!(campaign.sent, campaign.recipients);
        assert_eq!(campaign.status, CampaignStatus::Completed);
    }

    #[test]
    fn completed_campaign_ticks_are_no_ops() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut campaign = active_campaign(10);
        while advance(&mut campaign, &mut rng) != TickOutcome::Completed {}

        let frozen = campaign.clone();
        for _ in 0..5 {
            assert_eq!(advance(&mut campaign, &mut rng), TickOutcome::Idle);
        }
        assert_eq!(campaign.sent, frozen.sent);
        assert_eq!(campaign.opened, frozen.opened);
        assert_eq!(campaign.converted, frozen.converted);
    }

    #[test]
    fn paused_and_draft_campaigns_are_untouched() {
        let mut rng = StdRng::seed_from_u64(2);
        for status in [CampaignStatus::Draft, CampaignStatus::Paused] {
            let mut campaign = active_campaign(100);
            campaign.status = status;
            assert_eq!(advance(&mut campaign, &mut rng), TickOutcome::Idle);
            assert_eq!(campaign.sent, 0);
        }
    }

    #[test]
    fn relaunch_resumes_from_current_counters() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut campaign = active_campaign(1_000);
        campaign.sent = 400;
        campaign.opened = 200;

        advance(&mut campaign, &mut rng);
        assert!(campaign.sent >= 405, "resumes from 400, not from zero");
    }
}
