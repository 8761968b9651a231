use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        // Add other endpoints here as we document them
    ),
    tags(
        (name = "stockroom", description = "School cleaning-material stock API")
    )
)]
pub struct ApiDoc;
