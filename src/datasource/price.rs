//! Live price feed over an HTTP latest-price endpoint.

use super::http::JsonClient;
use super::{DataSourceError, LivePriceFeed, PriceTick};
use crate::domain::{Asset, Fixed18, TimeMs};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpPriceFeed {
    client: JsonClient,
}

/// Publishers send prices as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestPriceResponse {
    price: Option<String>,
    publish_time: Option<i64>,
}

impl HttpPriceFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: JsonClient::new(base_url),
        }
    }
}

#[async_trait]
impl LivePriceFeed for HttpPriceFeed {
    async fn latest_price(&self, asset: Asset) -> Result<Option<PriceTick>, DataSourceError> {
        let response: LatestPriceResponse = self
            .client
            .get("/latest", &[("feed", asset.as_str())])
            .await?;
        parse_tick(asset, response)
    }
}

fn parse_tick(
    asset: Asset,
    response: LatestPriceResponse,
) -> Result<Option<PriceTick>, DataSourceError> {
    let (Some(price), Some(publish_time)) = (response.price, response.publish_time) else {
        debug!(asset = %asset, "feed has not published");
        return Ok(None);
    };

    let decimal = Decimal::from_str(&price)
        .map_err(|e| DataSourceError::ParseError(format!("Invalid price {}: {}", price, e)))?;

    Ok(Some(PriceTick {
        asset,
        price: Fixed18::from_decimal(decimal),
        publish_time: TimeMs::new(publish_time),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tick() {
        let response = LatestPriceResponse {
            price: Some("3120.123456789".to_string()),
            publish_time: Some(1_700_000_000_000),
        };
        let tick = parse_tick(Asset::Eth, response).unwrap().unwrap();
        assert_eq!(tick.price.to_decimal_string(), "3120.123456789");
        assert_eq!(tick.publish_time, TimeMs::new(1_700_000_000_000));
    }

    #[test]
    fn test_parse_tick_unpublished_and_invalid() {
        let empty = LatestPriceResponse {
            price: None,
            publish_time: None,
        };
        assert_eq!(parse_tick(Asset::Eth, empty).unwrap(), None);

        let bad = LatestPriceResponse {
            price: Some("abc".to_string()),
            publish_time: Some(1),
        };
        assert!(matches!(
            parse_tick(Asset::Eth, bad),
            Err(DataSourceError::ParseError(_))
        ));
    }
}
