use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_account, parse_market, AppState};
use crate::domain::Address;
use crate::error::AppError;
use crate::orchestration::MarketRow;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlQuery {
    pub account: String,
    /// Comma separated; every configured market when absent.
    pub markets: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlResponse {
    pub account: Address,
    pub markets: Vec<MarketRow>,
}

pub async fn get_pnl(
    Query(params): Query<PnlQuery>,
    State(state): State<AppState>,
) -> Result<Json<PnlResponse>, AppError> {
    let account = parse_account(&params.account)?;

    let requested: Vec<&str> = params
        .markets
        .as_deref()
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let mut assets = Vec::new();
    if requested.is_empty() {
        assets.extend(state.config.markets.iter().copied());
    } else {
        for market in requested {
            let asset = parse_market(market, &state.config)?;
            if !assets.contains(&asset) {
                assets.push(asset);
            }
        }
    }

    let markets = state.orchestrator.reconcile_account(&account, &assets).await;

    Ok(Json(PnlResponse { account, markets }))
}
