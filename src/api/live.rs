use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{parse_account, parse_market, AppState};
use crate::domain::TimeMs;
use crate::engine::{live_overlay, LivePnl};
use crate::error::{AppError, EngineError};
use crate::orchestration::ReconciledMarket;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuery {
    pub account: String,
    pub market: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LiveStatus {
    Live,
    /// No accepted tick for the market's feed yet.
    NoPrice,
    /// The held tick aged past the staleness window.
    Stale,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveResponse {
    #[serde(flatten)]
    pub reconciled: ReconciledMarket,
    pub live_status: LiveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<LivePnl>,
}

pub async fn get_live_pnl(
    Query(params): Query<LiveQuery>,
    State(state): State<AppState>,
) -> Result<Json<LiveResponse>, AppError> {
    let account = parse_account(&params.account)?;
    let asset = parse_market(params.market.trim(), &state.config)?;

    let reconciled = state.orchestrator.reconcile_market(&account, asset).await?;

    let (live_status, live) = match state.price_gate.market_price(asset, TimeMs::now()).await {
        Ok(Some(price)) => (
            LiveStatus::Live,
            Some(live_overlay(&reconciled.pnl, &reconciled.snapshot, price)),
        ),
        Ok(None) => (LiveStatus::NoPrice, None),
        Err(e @ EngineError::StaleInput { .. }) => {
            debug!(asset = %asset, error = %e, "live overlay skipped");
            (LiveStatus::Stale, None)
        }
        Err(e) => return Err(AppError::Unprocessable(e.to_string())),
    };

    Ok(Json(LiveResponse {
        reconciled,
        live_status,
        live,
    }))
}
