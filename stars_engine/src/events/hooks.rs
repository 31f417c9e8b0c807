use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{DepositReceivedEvent, EventHandler, EventProducer, Handler, PurchaseCompletedEvent};

/// The publishing side of the hooks, handed to the APIs that emit events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub purchase_completed_producer: Vec<EventProducer<PurchaseCompletedEvent>>,
    pub deposit_received_producer: Vec<EventProducer<DepositReceivedEvent>>,
}

impl EventProducers {
    pub async fn publish_purchase_completed(&self, event: PurchaseCompletedEvent) {
        for producer in &self.purchase_completed_producer {
            trace!("📬️ Notifying purchase completed subscribers");
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_deposit_received(&self, event: DepositReceivedEvent) {
        for producer in &self.deposit_received_producer {
            trace!("📬️ Notifying deposit received subscribers");
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_purchase_completed: Option<EventHandler<PurchaseCompletedEvent>>,
    pub on_deposit_received: Option<EventHandler<DepositReceivedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_purchase_completed = hooks.on_purchase_completed.map(|f| EventHandler::new(buffer_size, f));
        let on_deposit_received = hooks.on_deposit_received.map(|f| EventHandler::new(buffer_size, f));
        Self { on_purchase_completed, on_deposit_received }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_purchase_completed {
            result.purchase_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_deposit_received {
            result.deposit_received_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per configured handler. Each task ends once all of its producers have been dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_purchase_completed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_deposit_received {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_purchase_completed: Option<Handler<PurchaseCompletedEvent>>,
    pub on_deposit_received: Option<Handler<DepositReceivedEvent>>,
}

impl EventHooks {
    pub fn on_purchase_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PurchaseCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_purchase_completed = Some(Arc::new(f));
        self
    }

    pub fn on_deposit_received<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DepositReceivedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_deposit_received = Some(Arc::new(f));
        self
    }
}
