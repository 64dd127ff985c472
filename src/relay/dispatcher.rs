use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::common::MessageInput;
use crate::storage::MessageStore;

use super::broadcast::Broadcast;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// `stop` was called, or the consumer is gone.
    #[error("dispatcher is closed")]
    Closed,
    #[error("dispatcher consumer already started")]
    AlreadyStarted,
}

/// Single point through which every message is written and broadcast.
///
/// Producers enqueue with [`Dispatcher::send`]; one background task drains
/// the bounded queue in FIFO order, appends to the store, then broadcasts.
/// Lifecycle is Created → Started → Stopped, with no restart.
pub struct Dispatcher {
    store: Arc<MessageStore>,
    sink: Arc<dyn Broadcast>,
    incoming: mpsc::Sender<MessageInput>,
    receiver: Mutex<Option<mpsc::Receiver<MessageInput>>>,
    quit: watch::Sender<bool>,
}

impl Dispatcher {
    #[cfg(test)]
    pub fn new(store: Arc<MessageStore>, sink: Arc<dyn Broadcast>) -> Self {
        Self::with_capacity(store, sink, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        store: Arc<MessageStore>,
        sink: Arc<dyn Broadcast>,
        capacity: usize,
    ) -> Self {
        let (incoming, receiver) = mpsc::channel(capacity.max(1));
        let (quit, _) = watch::channel(false);
        Self {
            store,
            sink,
            incoming,
            receiver: Mutex::new(Some(receiver)),
            quit,
        }
    }

    /// Spawn the consumer task. Must run inside a tokio runtime.
    pub fn start(&self) -> Result<JoinHandle<()>, DispatchError> {
        if self.is_stopped() {
            return Err(DispatchError::Closed);
        }
        let mut receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(DispatchError::AlreadyStarted)?;

        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        let mut quit = self.quit.subscribe();

        let handle = tokio::spawn(async move {
            log::debug!("Dispatcher consumer started");
            loop {
                tokio::select! {
                    biased;
                    _ = wait_stopped(&mut quit) => break,
                    input = receiver.recv() => {
                        let Some(input) = input else { break };
                        let message = store.add(&input.user_id, &input.text);
                        sink.broadcast(&message);
                    }
                }
            }
            let dropped = receiver.len();
            if dropped > 0 {
                log::warn!("Dispatcher stopped with {dropped} undelivered message(s)");
            }
            log::debug!("Dispatcher consumer finished");
        });

        Ok(handle)
    }

    /// Enqueue a message, waiting while the queue is full.
    ///
    /// Fails with [`DispatchError::Closed`] once the dispatcher has been
    /// stopped, including for a send that was waiting on a full queue.
    pub async fn send(&self, user_id: &str, text: &str) -> Result<(), DispatchError> {
        let mut quit = self.quit.subscribe();
        let input = MessageInput::new(user_id, text);

        // Stop wins over a free slot: nothing may be enqueued once it is raised.
        tokio::select! {
            biased;
            _ = wait_stopped(&mut quit) => Err(DispatchError::Closed),
            sent = self.incoming.send(input) => sent.map_err(|_| DispatchError::Closed),
        }
    }

    /// Signal the consumer to exit. Safe to call any number of times; queued
    /// inputs that were not consumed yet are discarded.
    pub fn stop(&self) {
        let raised = self.quit.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        });
        if raised {
            log::info!("Dispatcher stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.quit.borrow()
    }
}

/// Resolves once the flag is raised or its sender is dropped.
pub(crate) async fn wait_stopped(signal: &mut watch::Receiver<bool>) {
    // `watch::Ref` is `!Send` and must not outlive this call.
    let _ = signal.wait_for(|stopped| *stopped).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::broadcast::testing::ChannelBroadcast;
    use std::time::Duration;
    use tokio::time::timeout;

    fn dispatcher_with_capacity(
        capacity: usize,
    ) -> (
        Arc<Dispatcher>,
        Arc<MessageStore>,
        mpsc::UnboundedReceiver<crate::common::Message>,
    ) {
        let store = Arc::new(MessageStore::new());
        let (sink, delivered) = ChannelBroadcast::new();
        let dispatcher = Dispatcher::with_capacity(Arc::clone(&store), Arc::new(sink), capacity);
        (Arc::new(dispatcher), store, delivered)
    }

    #[tokio::test]
    async fn sends_are_stored_then_broadcast_in_order() {
        let (dispatcher, store, mut delivered) = dispatcher_with_capacity(DEFAULT_QUEUE_CAPACITY);
        dispatcher.start().unwrap();

        dispatcher.send("Alice", "hi").await.unwrap();
        dispatcher.send("Bob", "yo").await.unwrap();

        let first = delivered.recv().await.unwrap();
        let second = delivered.recv().await.unwrap();
        assert_eq!((first.id, first.user_id.as_str()), (1, "Alice"));
        assert_eq!((second.id, second.user_id.as_str()), (2, "Bob"));
        assert_eq!(store.all(), vec![first, second]);

        dispatcher.stop();
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (dispatcher, _store, _delivered) = dispatcher_with_capacity(4);
        dispatcher.start().unwrap();
        assert_eq!(dispatcher.start().unwrap_err(), DispatchError::AlreadyStarted);
        dispatcher.stop();
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_closes_sends() {
        let (dispatcher, _store, _delivered) = dispatcher_with_capacity(4);
        let consumer = dispatcher.start().unwrap();

        dispatcher.stop();
        dispatcher.stop();
        assert!(dispatcher.is_stopped());

        timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer exits after stop")
            .unwrap();
        assert_eq!(dispatcher.send("Alice", "late").await, Err(DispatchError::Closed));
        assert_eq!(dispatcher.start().unwrap_err(), DispatchError::Closed);
    }

    #[tokio::test]
    async fn full_queue_blocks_until_consumer_drains() {
        let (dispatcher, store, mut delivered) = dispatcher_with_capacity(1);

        dispatcher.send("A", "first").await.unwrap();
        assert!(
            timeout(Duration::from_millis(50), dispatcher.send("B", "dropped"))
                .await
                .is_err(),
            "send on a full queue must wait"
        );

        let pending = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.send("B", "second").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        dispatcher.start().unwrap();
        pending.await.unwrap().unwrap();

        assert_eq!(delivered.recv().await.unwrap().text, "first");
        assert_eq!(delivered.recv().await.unwrap().text, "second");
        assert_eq!(store.len(), 2);
        dispatcher.stop();
    }

    #[tokio::test]
    async fn blocked_send_fails_when_stopped() {
        let (dispatcher, _store, _delivered) = dispatcher_with_capacity(1);
        dispatcher.send("A", "fills the queue").await.unwrap();

        let pending = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.send("B", "waits").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        dispatcher.stop();

        assert_eq!(pending.await.unwrap(), Err(DispatchError::Closed));
    }

    #[tokio::test]
    async fn stop_discards_queued_inputs() {
        let (dispatcher, store, _delivered) = dispatcher_with_capacity(8);
        for n in 0..5 {
            dispatcher.send("Alice", &format!("queued {n}")).await.unwrap();
        }

        dispatcher.stop();

        assert_eq!(dispatcher.start().unwrap_err(), DispatchError::Closed);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.len() < 5);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stopped_dispatcher_with_free_slots_rejects_every_send() {
        let (dispatcher, store, _delivered) = dispatcher_with_capacity(DEFAULT_QUEUE_CAPACITY);
        dispatcher.stop();

        for n in 0..50 {
            assert_eq!(
                dispatcher.send("Bob", &format!("late {n}")).await,
                Err(DispatchError::Closed)
            );
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stop_while_consuming_keeps_store_short_of_queue() {
        let (dispatcher, store, mut delivered) = dispatcher_with_capacity(DEFAULT_QUEUE_CAPACITY);
        for n in 0..50 {
            dispatcher.send("Eve", &format!("burst {n}")).await.unwrap();
        }

        // Raised before the consumer's first poll, so it exits without draining.
        let consumer = dispatcher.start().unwrap();
        dispatcher.stop();
        consumer.await.unwrap();

        assert!(store.len() < 50);
        assert!(delivered.try_recv().is_err());
    }
}
