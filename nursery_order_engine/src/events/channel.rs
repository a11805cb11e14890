//! Simple stateless pub-sub event handler
//!
//! Components of the storefront can hook into engine events (order created, order delivered) and
//! react to them. The handler is stateless: subscribers receive the event itself and nothing
//! else. Events are handled one at a time, in arrival order, so a hook that must observe "exactly
//! once" semantics does not need its own locking.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs the handler loop until every producer has been dropped.
    pub async fn start_handler(mut self) {
        debug!("📣️ Starting event handler");
        // Drop the internal sender so that the loop ends once the last producer is gone.
        drop(self.sender);
        while let Some(ev) = self.listener.recv().await {
            trace!("📣️ Handling event");
            (self.handler)(ev).await;
        }
        debug!("📣️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📣️ Failed to send event: {e}");
        }
    }
}
