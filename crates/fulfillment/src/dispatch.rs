//! One-way dispatch of stock deltas.
//!
//! Deltas are queued and applied by a single background worker in FIFO
//! order. The caller never waits and never learns the outcome: a full or
//! closed queue drops the delta, a failed apply is logged and counted.
//! Nothing is retried.

use std::sync::Arc;

use common::ProductId;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::services::InventoryPort;

/// Default bound of the dispatch queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A signed stock adjustment: negative reserves, positive releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl StockDelta {
    pub fn reserve(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity: -i64::from(quantity),
        }
    }

    pub fn release(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity: i64::from(quantity),
        }
    }
}

/// Handle to the stock-delta queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StockDeltaDispatcher {
    sender: mpsc::Sender<StockDelta>,
}

impl StockDeltaDispatcher {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// The worker stops once every handle has been dropped and the queue
    /// is drained.
    pub fn spawn<I>(inventory: Arc<I>, capacity: usize) -> Self
    where
        I: InventoryPort + ?Sized + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(inventory, receiver));
        Self { sender }
    }

    /// Queues a delta without waiting.
    ///
    /// Returns false if the delta was dropped.
    pub fn dispatch(&self, delta: StockDelta) -> bool {
        match self.sender.try_send(delta) {
            Ok(()) => {
                metrics::counter!("stock_deltas_dispatched_total").increment(1);
                true
            }
            Err(TrySendError::Full(delta)) => {
                tracing::warn!(
                    product_id = %delta.product_id,
                    quantity = delta.quantity,
                    "stock delta queue full, dropping delta"
                );
                metrics::counter!("stock_delta_dropped_total").increment(1);
                false
            }
            Err(TrySendError::Closed(delta)) => {
                tracing::warn!(
                    product_id = %delta.product_id,
                    quantity = delta.quantity,
                    "stock delta worker stopped, dropping delta"
                );
                metrics::counter!("stock_delta_dropped_total").increment(1);
                false
            }
        }
    }
}

async fn run_worker<I>(inventory: Arc<I>, mut receiver: mpsc::Receiver<StockDelta>)
where
    I: InventoryPort + ?Sized,
{
    while let Some(delta) = receiver.recv().await {
        match inventory
            .apply_stock_delta(delta.product_id, delta.quantity)
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    product_id = %delta.product_id,
                    quantity = delta.quantity,
                    "stock delta applied"
                );
            }
            Err(e) => {
                tracing::error!(
                    product_id = %delta.product_id,
                    quantity = delta.quantity,
                    error = %e,
                    "failed to apply stock delta"
                );
                metrics::counter!("stock_delta_failures_total").increment(1);
            }
        }
    }
    tracing::debug!("stock delta worker stopped");
}
