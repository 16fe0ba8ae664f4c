//! Paper venue: routes child orders and serves market data for a set of
//! securities, one [`PaperBook`] each.

use dashmap::DashMap;
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tempo_core::{
    ChildOrder, ExecutionReport, OrderId, Price, Quantity, Quote, Security, Side, Symbol,
};
use tempo_ports::{Clock, Instrument, MarketDataError, MarketDataSource, OrderError, OrderRouter};

use crate::book::PaperBook;
use crate::error::{PaperError, Result};
use crate::instrument::PaperInstrument;

/// Paper venue configuration
#[derive(Debug, Clone, Default)]
pub struct PaperConfig {
    /// Fill resting limit orders on prints exactly at their price
    pub fill_on_touch: bool,
    /// Accepted market-data source names; empty accepts any
    pub sources: Vec<String>,
}

/// In-memory order router and market-data source
pub struct PaperVenue {
    clock: Arc<dyn Clock>,
    config: PaperConfig,
    books: DashMap<Symbol, Arc<PaperBook>>,
    next_subscription: AtomicU64,
}

impl PaperVenue {
    pub fn new(clock: Arc<dyn Clock>, config: PaperConfig) -> Self {
        Self {
            clock,
            config,
            books: DashMap::new(),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Register a security; returns the existing book if already listed
    pub fn add_security(&self, security: Security) -> Arc<PaperBook> {
        let fill_on_touch = self.config.fill_on_touch;
        self.books
            .entry(security.symbol.clone())
            .or_insert_with(|| {
                info!("[PAPER] listing {}", security.symbol);
                Arc::new(PaperBook::new(Arc::new(security), fill_on_touch))
            })
            .clone()
    }

    pub fn book(&self, symbol: &str) -> Result<Arc<PaperBook>> {
        self.books
            .get(symbol)
            .map(|b| b.clone())
            .ok_or_else(|| PaperError::SymbolNotFound(symbol.to_string()))
    }

    pub fn update_quote(&self, symbol: &str, quote: Quote) -> Result<()> {
        self.book(symbol)?.update_quote(quote, self.clock.now());
        Ok(())
    }

    pub fn record_trade(&self, symbol: &str, price: Price, qty: Quantity) -> Result<()> {
        self.book(symbol)?.record_trade(price, qty, self.clock.now());
        Ok(())
    }

    /// Execution reports from every book since the last drain
    pub fn drain_reports(&self) -> Vec<ExecutionReport> {
        let mut reports: Vec<ExecutionReport> = self
            .books
            .iter()
            .flat_map(|b| b.value().drain_reports())
            .collect();
        reports.sort_by_key(|r| r.timestamp);
        reports
    }
}

impl OrderRouter for PaperVenue {
    fn place(&self, order: &ChildOrder) -> std::result::Result<OrderId, OrderError> {
        Ok(self.book(&order.symbol)?.place(order, self.clock.now())?)
    }

    fn cancel(&self, order: &ChildOrder) -> std::result::Result<(), OrderError> {
        Ok(self.book(&order.symbol)?.cancel(order.id, self.clock.now())?)
    }

    fn cross(
        &self,
        quantity: Quantity,
        price: Option<Price>,
        side: Side,
        sub_account: &str,
        instrument: &dyn Instrument,
    ) -> std::result::Result<(), OrderError> {
        let symbol = &instrument.security().symbol;
        info!("[PAPER] cross request from {sub_account} on {symbol}");
        self.book(symbol)?
            .cross(quantity, price, side, Some(instrument.id()), self.clock.now())?;
        Ok(())
    }
}

impl MarketDataSource for PaperVenue {
    fn subscribe(
        &self,
        security: &Security,
        source: Option<&str>,
    ) -> std::result::Result<Arc<dyn Instrument>, MarketDataError> {
        if let Some(src) = source {
            if !self.config.sources.is_empty() && !self.config.sources.iter().any(|s| s == src) {
                return Err(MarketDataError::UnknownSource(src.to_string()));
            }
        }
        let book = self.book(&security.symbol)?;
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(PaperInstrument::new(id, book)))
    }
}
