pub mod campaign_task;
pub mod campaigns;
pub mod integrations;
pub mod matches;
pub mod opportunities;
pub mod records;
pub mod rest;
pub mod settings;
pub mod state;

// Re-export the handlers the binary wires into the router.
pub use campaigns::{
    delete_campaign_handler, launch_campaign_handler, list_campaigns_handler,
    toggle_campaign_handler, upsert_campaign_handler,
};
pub use matches::get_matches_handler;
pub use opportunities::{
    convert_opportunity_handler, delete_opportunity_handler, list_opportunities_handler,
    scrape_opportunities_handler,
};
