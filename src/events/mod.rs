use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Direction;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event).await {
            warn!("{}", err);
        }
    }
}

/// Events raised by the production stock engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    InventoryPosted {
        tenant_id: Uuid,
        product_id: Uuid,
        direction: Direction,
        quantity: f64,
        new_stock: f64,
        order_id: Option<Uuid>,
    },
    ProductionOutcomeApplied {
        tenant_id: Uuid,
        order_id: Uuid,
        success: bool,
        failed_postings: usize,
        warnings: usize,
    },
}

/// Drains the event channel, logging each event.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::InventoryPosted {
                product_id,
                direction,
                quantity,
                new_stock,
                order_id,
                ..
            } => {
                info!(
                    %product_id,
                    %direction,
                    quantity,
                    new_stock,
                    order_id = ?order_id,
                    "inventory posted"
                );
            }
            Event::ProductionOutcomeApplied {
                order_id,
                success,
                failed_postings,
                warnings,
                ..
            } => {
                info!(
                    %order_id,
                    success,
                    failed_postings,
                    warnings,
                    "production outcome applied"
                );
            }
        }
    }

    info!("Event channel closed; event processing loop stopped");
}
