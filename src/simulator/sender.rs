use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::relay::Dispatcher;
use crate::relay::dispatcher::wait_stopped;

/// A scripted chat participant that posts its lines on a fixed interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedUser {
    pub name: String,
    pub messages: Vec<String>,
    pub interval: Duration,
}

impl SimulatedUser {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        messages: Vec<S>,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            messages: messages.into_iter().map(Into::into).collect(),
            interval,
        }
    }

    /// Run the sender until `stop` is raised or the dispatcher closes.
    ///
    /// The first line goes out one full interval after spawning; lines wrap
    /// around once the list is exhausted.
    pub fn spawn(
        self,
        dispatcher: Arc<Dispatcher>,
        mut stop: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            if self.messages.is_empty() {
                log::warn!("Simulated user {} has no messages; not starting", self.name);
                return;
            }
            let period = self.interval.max(Duration::from_millis(1));
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            log::debug!("Simulated user {} started ({:?} interval)", self.name, period);
            let mut index = 0usize;
            loop {
                tokio::select! {
                    biased;
                    _ = wait_stopped(&mut stop) => break,
                    _ = ticker.tick() => {
                        let text = &self.messages[index % self.messages.len()];
                        if let Err(err) = dispatcher.send(&self.name, text).await {
                            log::info!("Simulated user {} stopping: {err}", self.name);
                            break;
                        }
                        index += 1;
                    }
                }
            }
            log::debug!("Simulated user {} finished after {index} message(s)", self.name);
        })
    }
}

/// Fan-out stop signal observed by every simulated sender.
pub struct StopSignal {
    sender: watch::Sender<bool>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    pub fn stop(&self) {
        self.sender.send_if_modified(|stopped| !std::mem::replace(stopped, true));
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::broadcast::testing::ChannelBroadcast;
    use crate::storage::MessageStore;

    fn started_dispatcher() -> (
        Arc<Dispatcher>,
        Arc<MessageStore>,
        tokio::sync::mpsc::UnboundedReceiver<crate::common::Message>,
    ) {
        let store = Arc::new(MessageStore::new());
        let (sink, delivered) = ChannelBroadcast::new();
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store), Arc::new(sink)));
        dispatcher.start().unwrap();
        (dispatcher, store, delivered)
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_through_messages_and_wraps() {
        let (dispatcher, store, mut delivered) = started_dispatcher();
        let stop = StopSignal::new();
        let user = SimulatedUser::new("Alice", vec!["one", "two"], Duration::from_secs(3));
        let handle = user.spawn(Arc::clone(&dispatcher), stop.subscribe());

        let texts: Vec<String> = [
            delivered.recv().await.unwrap(),
            delivered.recv().await.unwrap(),
            delivered.recv().await.unwrap(),
        ]
        .into_iter()
        .map(|message| message.text)
        .collect();
        assert_eq!(texts, vec!["one", "two", "one"]);
        assert!(store.filter_by_user("alice").len() >= 3);

        stop.stop();
        handle.await.unwrap();
        dispatcher.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn first_message_waits_one_interval() {
        let (dispatcher, store, _delivered) = started_dispatcher();
        let stop = StopSignal::new();
        let handle = SimulatedUser::new("Bob", vec!["Hey all"], Duration::from_secs(5))
            .spawn(Arc::clone(&dispatcher), stop.subscribe());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert!(store.is_empty());

        stop.stop();
        handle.await.unwrap();
        assert!(store.is_empty());
        dispatcher.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn shared_signal_stops_every_sender() {
        let (dispatcher, _store, _delivered) = started_dispatcher();
        let stop = StopSignal::new();
        let handles: Vec<_> = ["Alice", "Bob", "Eve"]
            .into_iter()
            .map(|name| {
                SimulatedUser::new(name, vec!["hello"], Duration::from_secs(1))
                    .spawn(Arc::clone(&dispatcher), stop.subscribe())
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        stop.stop();
        stop.stop();
        assert!(*stop.subscribe().borrow());
        for handle in handles {
            handle.await.unwrap();
        }
        dispatcher.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn closed_dispatcher_ends_sender() {
        let (dispatcher, _store, _delivered) = started_dispatcher();
        dispatcher.stop();
        let stop = StopSignal::new();

        let handle = SimulatedUser::new("Alice", vec!["hi"], Duration::from_secs(1))
            .spawn(Arc::clone(&dispatcher), stop.subscribe());
        handle.await.unwrap();
        assert!(!*stop.subscribe().borrow());
    }

    #[tokio::test]
    async fn empty_script_exits_immediately() {
        let (dispatcher, store, _delivered) = started_dispatcher();
        let stop = StopSignal::new();
        SimulatedUser::new("Mute", Vec::<String>::new(), Duration::from_millis(10))
            .spawn(Arc::clone(&dispatcher), stop.subscribe())
            .await
            .unwrap();
        assert!(store.is_empty());
        dispatcher.stop();
    }
}
