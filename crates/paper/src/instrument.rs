use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempo_core::{ChildOrder, MarketSnapshot, Quantity, Security, SubscriptionId};
use tempo_ports::Instrument;

use crate::book::PaperBook;

/// Subscription handle onto a [`PaperBook`]
///
/// Market data is shared with every other subscription on the book; order
/// accounting covers only child orders stamped with this subscription's id.
pub struct PaperInstrument {
    id: SubscriptionId,
    book: Arc<PaperBook>,
    released: AtomicBool,
}

impl PaperInstrument {
    pub fn new(id: SubscriptionId, book: Arc<PaperBook>) -> Self {
        Self {
            id,
            book,
            released: AtomicBool::new(false),
        }
    }
}

impl Instrument for PaperInstrument {
    fn id(&self) -> SubscriptionId {
        self.id
    }

    fn security(&self) -> &Security {
        self.book.security()
    }

    fn snapshot(&self) -> MarketSnapshot {
        self.book.snapshot()
    }

    fn cum_qty(&self) -> Quantity {
        self.book.cum_qty_for(self.id)
    }

    fn cum_cx_qty(&self) -> Quantity {
        self.book.cum_cx_qty_for(self.id)
    }

    fn total_exposure(&self) -> Quantity {
        self.book.total_exposure_for(self.id)
    }

    fn active_orders(&self) -> Vec<ChildOrder> {
        self.book.active_orders_for(self.id)
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            debug!(
                "[PAPER] {} subscription {} released",
                self.book.security().symbol,
                self.id
            );
        }
    }
}
