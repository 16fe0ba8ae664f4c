use std::sync::Arc;

use super::{PositionEffect, Side};
use crate::instruments::Security;
use crate::values::Quantity;

/// The parent order the algorithm is tasked to execute.
///
/// These are the fields the host validates before handing the order over.
#[derive(Debug, Clone)]
pub struct ParentOrder {
    pub security: Arc<Security>,
    pub sub_account: String,
    pub side: Side,
    pub quantity: Quantity,
    pub position_effect: PositionEffect,
    /// Market-data source name, `None` for the default source
    pub source: Option<String>,
}

impl ParentOrder {
    pub fn new(
        security: Arc<Security>,
        sub_account: impl Into<String>,
        side: Side,
        quantity: Quantity,
    ) -> Self {
        Self {
            security,
            sub_account: sub_account.into(),
            side,
            quantity,
            position_effect: PositionEffect::Open,
            source: None,
        }
    }

    pub fn with_position_effect(mut self, position_effect: PositionEffect) -> Self {
        self.position_effect = position_effect;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
