mod event;

pub use event::{
    EngineEvent, TOPIC_ALL_PRINTERS, TOPIC_CONSUMABLES, TOPIC_HEALTH, TOPIC_TECHNICIANS,
    printer_topic,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct TopicSubscriber {
    id: u64,
    sender: UnboundedSender<EngineEvent>,
}

/// Live subscription handed back by `subscribe`. Dropping the receiver is
/// enough to unsubscribe; the dispatcher prunes the dead sender on the
/// next publish to that topic.
pub struct Subscription {
    pub id: u64,
    pub topic: String,
    pub receiver: UnboundedReceiver<EngineEvent>,
}

/// Topic-scoped fan-out with no persistence obligation. Delivery is
/// best-effort and at-most-once: a dead subscriber is logged and dropped
/// without blocking the others or the publishing cycle.
#[derive(Clone, Default)]
pub struct Dispatcher {
    topics: Arc<RwLock<HashMap<String, Vec<TopicSubscriber>>>>,
    next_id: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, topic: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut topics = self.topics.write().await;
        topics
            .entry(topic.to_string())
            .or_default()
            .push(TopicSubscriber { id, sender });
        Subscription {
            id,
            topic: topic.to_string(),
            receiver,
        }
    }

    pub async fn unsubscribe(&self, topic: &str, id: u64) {
        let mut topics = self.topics.write().await;
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|subscriber| subscriber.id != id);
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }

    /// Fire-and-forget broadcast. An unknown or empty topic is a no-op.
    pub async fn publish(&self, topic: &str, event: EngineEvent) {
        if topic.is_empty() {
            return;
        }

        let dead: Vec<u64> = {
            let topics = self.topics.read().await;
            let Some(subscribers) = topics.get(topic) else {
                return;
            };
            subscribers
                .iter()
                .filter(|subscriber| subscriber.sender.send(event.clone()).is_err())
                .map(|subscriber| subscriber.id)
                .collect()
        };

        for id in dead {
            log::warn!("dispatch_subscriber_dropped topic={} subscriber={}", topic, id);
            self.unsubscribe(topic, id).await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::alerts::{AlertKind, AlertRecord, EntityType, Severity};

    use super::{Dispatcher, EngineEvent, TOPIC_ALL_PRINTERS, printer_topic};

    fn alert_event() -> EngineEvent {
        EngineEvent::AlertCreated {
            alert: AlertRecord::new(
                "printer-1",
                EntityType::Printer,
                AlertKind::Offline,
                Severity::High,
            ),
        }
    }

    #[tokio::test]
    async fn delivers_to_all_topic_subscribers() {
        let dispatcher = Dispatcher::new();
        let mut first = dispatcher.subscribe(TOPIC_ALL_PRINTERS).await;
        let mut second = dispatcher.subscribe(TOPIC_ALL_PRINTERS).await;

        dispatcher.publish(TOPIC_ALL_PRINTERS, alert_event()).await;

        assert!(matches!(
            first.receiver.try_recv(),
            Ok(EngineEvent::AlertCreated { .. })
        ));
        assert!(matches!(
            second.receiver.try_recv(),
            Ok(EngineEvent::AlertCreated { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_topic_is_a_noop() {
        let dispatcher = Dispatcher::new();
        dispatcher.publish("no-such-topic", alert_event()).await;
        dispatcher.publish("", alert_event()).await;
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let dispatcher = Dispatcher::new();
        let mut device = dispatcher.subscribe(&printer_topic("printer-1")).await;
        let mut other = dispatcher.subscribe(&printer_topic("printer-2")).await;

        dispatcher
            .publish(&printer_topic("printer-1"), alert_event())
            .await;

        assert!(device.receiver.try_recv().is_ok());
        assert!(other.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_subscriber_is_pruned_without_blocking_others() {
        let dispatcher = Dispatcher::new();
        let dropped = dispatcher.subscribe(TOPIC_ALL_PRINTERS).await;
        let mut live = dispatcher.subscribe(TOPIC_ALL_PRINTERS).await;
        drop(dropped.receiver);

        dispatcher.publish(TOPIC_ALL_PRINTERS, alert_event()).await;

        assert!(live.receiver.try_recv().is_ok());
        assert_eq!(dispatcher.subscriber_count(TOPIC_ALL_PRINTERS).await, 1);
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let dispatcher = Dispatcher::new();
        let topic = printer_topic("printer-1");
        let mut subscription = dispatcher.subscribe(&topic).await;

        for _ in 0..3 {
            dispatcher.publish(&topic, alert_event()).await;
        }
        dispatcher
            .publish(
                &topic,
                EngineEvent::AlertResolved {
                    alert: AlertRecord::new(
                        "printer-1",
                        EntityType::Printer,
                        AlertKind::Offline,
                        Severity::High,
                    ),
                },
            )
            .await;

        for _ in 0..3 {
            assert!(matches!(
                subscription.receiver.try_recv(),
                Ok(EngineEvent::AlertCreated { .. })
            ));
        }
        assert!(matches!(
            subscription.receiver.try_recv(),
            Ok(EngineEvent::AlertResolved { .. })
        ));
    }

    #[tokio::test]
    async fn unsubscribe_removes_the_topic_when_empty() {
        let dispatcher = Dispatcher::new();
        let subscription = dispatcher.subscribe("technicians").await;
        dispatcher.unsubscribe("technicians", subscription.id).await;
        assert_eq!(dispatcher.subscriber_count("technicians").await, 0);
    }
}
