use axum::Json;
use pssi_host::{HostStats, StatsSummary};

use crate::error::ApiResult;

/// Full host snapshot
pub async fn get_stats() -> ApiResult<Json<HostStats>> {
    Ok(Json(HostStats::collect().await?))
}

/// Gauge readings for the dashboard
pub async fn get_summary() -> ApiResult<Json<StatsSummary>> {
    Ok(Json(StatsSummary::collect().await?))
}
