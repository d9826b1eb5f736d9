use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::ingestion::sources::SourceKind;
use crate::ingestion::IngestReport;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IngestRequest {
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "mock".to_string()
}

/// POST /api/v1/jobs/ingest
pub async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestReport>, AppError> {
    let kind = SourceKind::parse(&req.source, state.config.job_feed_url.as_deref())?;
    let source = kind.build()?;
    let report = state.ingestion.ingest(source.as_ref()).await?;
    Ok(Json(report))
}
