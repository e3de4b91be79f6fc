//! Live price gating and last-write-wins result slots.

use crate::datasource::{LivePriceFeed, PriceTick};
use crate::domain::{Asset, Fixed6, TimeMs};
use crate::error::EngineError;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How far ahead of the local clock a tick's publish time may be.
pub const MAX_CLOCK_SKEW_MS: i64 = 2_000;

/// Newest non-stale tick per underlying feed.
#[derive(Debug)]
pub struct LivePriceGate {
    max_age_ms: i64,
    ticks: RwLock<HashMap<Asset, PriceTick>>,
}

impl LivePriceGate {
    pub fn new(max_age_ms: i64) -> Self {
        Self {
            max_age_ms,
            ticks: RwLock::new(HashMap::new()),
        }
    }

    fn check_age(&self, tick: &PriceTick, now: TimeMs) -> Result<(), EngineError> {
        if now.as_ms() - tick.publish_time.as_ms() > self.max_age_ms {
            return Err(EngineError::stale(
                "price",
                tick.publish_time,
                now,
                self.max_age_ms,
            ));
        }
        Ok(())
    }

    /// Accept a tick. Stale ticks and ticks published ahead of `now` beyond the clock
    /// skew are rejected; ticks not newer than the held one are ignored (`Ok(false)`).
    pub async fn offer(&self, tick: PriceTick, now: TimeMs) -> Result<bool, EngineError> {
        if tick.publish_time.as_ms() - now.as_ms() > MAX_CLOCK_SKEW_MS {
            return Err(EngineError::ahead(
                "price",
                tick.publish_time,
                now,
                MAX_CLOCK_SKEW_MS,
            ));
        }
        self.check_age(&tick, now)?;

        let mut ticks = self.ticks.write().await;
        match ticks.get(&tick.asset) {
            Some(held) if held.publish_time >= tick.publish_time => Ok(false),
            _ => {
                ticks.insert(tick.asset, tick);
                Ok(true)
            }
        }
    }

    /// Held tick for an underlying feed. A tick that has aged past the window since it
    /// was accepted is reported stale, not returned.
    pub async fn latest(&self, feed: Asset, now: TimeMs) -> Result<Option<PriceTick>, EngineError> {
        let ticks = self.ticks.read().await;
        match ticks.get(&feed) {
            Some(tick) => {
                self.check_age(tick, now)?;
                Ok(Some(*tick))
            }
            None => Ok(None),
        }
    }

    /// Live price in market terms: the underlying tick at primary precision with the
    /// market's payoff applied.
    pub async fn market_price(&self, market: Asset, now: TimeMs) -> Result<Option<Fixed6>, EngineError> {
        let tick = self.latest(market.underlying(), now).await?;
        Ok(tick.map(|t| market.market_price(t.price.rescale::<6>())))
    }
}

/// Holds the result of the newest input set.
///
/// Callers take a sequence number with [`ResultSlot::begin`] before fetching inputs and
/// publish with it afterwards; a result whose inputs are older than the held one is
/// dropped, whatever order the computations finish in.
#[derive(Debug)]
pub struct ResultSlot<T> {
    next_seq: AtomicU64,
    held: Mutex<Option<(u64, T)>>,
}

impl<T: Clone> ResultSlot<T> {
    pub fn new() -> Self {
        Self {
            next_seq: AtomicU64::new(1),
            held: Mutex::new(None),
        }
    }

    pub fn begin(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns whether the value was stored.
    pub async fn publish(&self, seq: u64, value: T) -> bool {
        let mut held = self.held.lock().await;
        match held.as_ref() {
            Some((current, _)) if *current > seq => false,
            _ => {
                *held = Some((seq, value));
                true
            }
        }
    }

    pub async fn current(&self) -> Option<T> {
        self.held.lock().await.as_ref().map(|(_, v)| v.clone())
    }
}

impl<T: Clone> Default for ResultSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch each underlying feed once and offer the ticks to the gate.
pub async fn poll_prices_once(feed: &dyn LivePriceFeed, gate: &LivePriceGate, markets: &[Asset]) {
    let feeds: BTreeSet<Asset> = markets.iter().map(Asset::underlying).collect();
    for asset in feeds {
        match feed.latest_price(asset).await {
            Ok(Some(tick)) => match gate.offer(tick, TimeMs::now()).await {
                Ok(true) => debug!(asset = %asset, price = %tick.price, "accepted price"),
                Ok(false) => {}
                Err(e) => debug!(asset = %asset, error = %e, "ignored price"),
            },
            Ok(None) => {}
            Err(e) => warn!(asset = %asset, error = %e, "price feed error"),
        }
    }
}

pub fn spawn_price_poller(
    feed: Arc<dyn LivePriceFeed>,
    gate: Arc<LivePriceGate>,
    markets: Vec<Asset>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            poll_prices_once(feed.as_ref(), &gate, &markets).await;
        }
    })
}
