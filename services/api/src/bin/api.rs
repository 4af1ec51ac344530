//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        analysis::MultiProviderAnalysisAdapter,
        passthrough::{
            FirecrawlAdapter, MailgunAdapter, MetaAdapter, PicaGateway, SerpAdapter, TwilioAdapter,
        },
        store::JsonFileStore,
    },
    config::Config,
    error::ApiError,
    web::{
        convert_opportunity_handler, delete_campaign_handler, delete_opportunity_handler,
        get_matches_handler, launch_campaign_handler, list_campaigns_handler,
        list_opportunities_handler, rest::ApiDoc, scrape_opportunities_handler,
        state::{AppState, CampaignRunner},
        toggle_campaign_handler, upsert_campaign_handler,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use estate_crm_core::ports::{ChangeObserver, StorageService};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use tower_http::cors::CorsLayer;
use axum::http::{Method, header::{AUTHORIZATION, CONTENT_TYPE, ACCEPT}};

/// Logs every collection write, in place of the storage events the browser
/// build broadcast between tabs.
struct ChangeLogger;

impl ChangeObserver for ChangeLogger {
    fn on_change(&self, key: &str) {
        debug!(key, "Collection updated");
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Data Store ---
    info!("Opening data store at {}", config.data_dir.display());
    let store = Arc::new(JsonFileStore::new(config.data_dir.clone())?);
    store.register_observer(Arc::new(ChangeLogger));

    // --- 3. Initialize Service Adapters ---
    let http = reqwest::Client::new();
    let gateway = PicaGateway::new(config.clone(), http.clone());

    let analysis_adapter = Arc::new(MultiProviderAnalysisAdapter::new(config.clone(), http));
    let email_adapter = Arc::new(MailgunAdapter::new(gateway.clone()));
    let sms_adapter = Arc::new(TwilioAdapter::new(gateway.clone()));
    let search_adapter = Arc::new(SerpAdapter::new(gateway.clone()));
    let extraction_adapter = Arc::new(FirecrawlAdapter::new(gateway.clone()));
    let ads_adapter = Arc::new(MetaAdapter::new(gateway));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        config: config.clone(),
        analysis_adapter,
        email_adapter,
        sms_adapter,
        search_adapter,
        extraction_adapter,
        ads_adapter,
        campaign_runner: Arc::new(CampaignRunner::new()),
    });

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/prospecting/scrape", post(scrape_opportunities_handler))
        .route("/opportunities", get(list_opportunities_handler))
        .route("/opportunities/{id}", delete(delete_opportunity_handler))
        .route("/opportunities/{id}/convert", post(convert_opportunity_handler))
        .route("/matches", get(get_matches_handler))
        .route(
            "/properties",
            get(api_lib::web::records::list_properties_handler)
                .post(api_lib::web::records::upsert_property_handler),
        )
        .route(
            "/properties/{id}",
            delete(api_lib::web::records::delete_property_handler),
        )
        .route(
            "/prospects",
            get(api_lib::web::records::list_prospects_handler)
                .post(api_lib::web::records::upsert_prospect_handler),
        )
        .route(
            "/prospects/{id}",
            delete(api_lib::web::records::delete_prospect_handler),
        )
        .route(
            "/mandates",
            get(api_lib::web::records::list_mandates_handler)
                .post(api_lib::web::records::upsert_mandate_handler),
        )
        .route(
            "/mandates/{id}",
            delete(api_lib::web::records::delete_mandate_handler),
        )
        .route(
            "/campaigns",
            get(list_campaigns_handler).post(upsert_campaign_handler),
        )
        .route("/campaigns/{id}", delete(delete_campaign_handler))
        .route("/campaigns/{id}/launch", post(launch_campaign_handler))
        .route("/campaigns/{id}/toggle", post(toggle_campaign_handler))
        .route("/ai/analysis", post(api_lib::web::integrations::ai_analysis_handler))
        .route("/email/send", post(api_lib::web::integrations::send_email_handler))
        .route("/sms/webhook", post(api_lib::web::integrations::sms_webhook_handler))
        .route("/search", post(api_lib::web::integrations::search_handler))
        .route("/extract", post(api_lib::web::integrations::extract_handler))
        .route("/ads/accounts", get(api_lib::web::integrations::ads_accounts_handler))
        .route(
            "/settings/providers",
            get(api_lib::web::settings::get_providers_handler)
                .put(api_lib::web::settings::put_providers_handler),
        )
        .route(
            "/settings/integrations",
            get(api_lib::web::settings::get_integrations_handler)
                .put(api_lib::web::settings::put_integrations_handler),
        )
        .route(
            "/settings/blobs/{key}",
            get(api_lib::web::settings::get_blob_handler)
                .put(api_lib::web::settings::put_blob_handler),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
