//! services/api/src/web/rest.rs
//!
//! Master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::opportunities::{ScrapeRequest, ScrapeResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::opportunities::scrape_opportunities_handler,
    ),
    components(
        schemas(ScrapeRequest, ScrapeResponse)
    ),
    tags(
        (name = "Estate CRM API", description = "API endpoints for prospecting, matching and campaign automation.")
    )
)]
pub struct ApiDoc;
