//! In-process topic bus.
//!
//! Each subscriber owns an unbounded queue, so a slow subscriber never blocks
//! publishers or other subscribers. Events published while nobody is
//! subscribed are dropped. A [`Subscription`] removes itself from the
//! registry when dropped.

use std::{
  collections::HashMap,
  pin::Pin,
  sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicU64, Ordering},
  },
  task::{Context, Poll},
};

use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::{
  Result,
  entity::Entity,
  event::{Channel, Event, EventAction, EventName},
  movie::Movie,
  person::Person,
  triple::Triple,
};

struct Subscriber {
  id: u64,
  tx: mpsc::UnboundedSender<Event>,
}

#[derive(Default)]
struct Registry {
  next_id:  AtomicU64,
  channels: Mutex<HashMap<Channel, Vec<Subscriber>>>,
}

impl Registry {
  fn lock(&self) -> MutexGuard<'_, HashMap<Channel, Vec<Subscriber>>> {
    // A panic while holding the lock cannot leave the map half-updated.
    self.channels.lock().unwrap_or_else(|e| e.into_inner())
  }
}

/// Cheaply clonable handle to the process-wide bus.
#[derive(Clone, Default)]
pub struct EventBus {
  registry: Arc<Registry>,
}

impl std::fmt::Debug for EventBus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EventBus").finish_non_exhaustive()
  }
}

impl EventBus {
  pub fn new() -> Self { Self::default() }

  // ─── Publishing ──────────────────────────────────────────────────────────

  /// Deliver `event` to every current subscriber of `channel`. Returns the
  /// number of subscribers reached.
  pub fn publish(&self, channel: Channel, event: &Event) -> usize {
    let mut channels = self.registry.lock();
    let Some(subscribers) = channels.get_mut(&channel) else {
      trace!(%channel, event = %event.name, "no subscribers");
      return 0;
    };
    subscribers.retain(|s| s.tx.send(event.clone()).is_ok());
    let reached = subscribers.len();
    if subscribers.is_empty() {
      channels.remove(&channel);
    }
    debug!(%channel, event = %event.name, id = %event.id, reached, "published");
    reached
  }

  /// Deliver the same envelope on each of `channels`.
  pub fn publish_to(&self, channels: &[Channel], event: &Event) -> usize {
    channels.iter().map(|c| self.publish(*c, event)).sum()
  }

  /// Publish a `PING` carrying `message` on the general channel.
  pub fn ping(&self, message: &str) -> Event {
    let event = Event::new(EventName::Ping, Value::from(message));
    self.publish(Channel::General, &event);
    event
  }

  pub fn publish_person(
    &self,
    action: EventAction,
    person: &Person,
  ) -> Result<Event> {
    self.publish_entity(action, person, &[Channel::Person])
  }

  pub fn publish_triple(
    &self,
    action: EventAction,
    triple: &Triple,
  ) -> Result<Event> {
    self.publish_entity(action, triple, &[Channel::Triple])
  }

  /// Publish on [`Channel::Movie`] and, when the genre has one, on the
  /// matching genre channel.
  pub fn publish_movie(
    &self,
    action: EventAction,
    movie: &Movie,
  ) -> Result<Event> {
    self.publish_entity(action, movie, &Channel::for_movie(movie.genre))
  }

  fn publish_entity<T: Entity>(
    &self,
    action: EventAction,
    entity: &T,
    channels: &[Channel],
  ) -> Result<Event> {
    let name = EventName::for_entity(T::COLLECTION, action);
    let event = Event::new(name, serde_json::to_value(entity)?);
    self.publish_to(channels, &event);
    Ok(event)
  }

  // ─── Subscribing ─────────────────────────────────────────────────────────

  /// Receive every event published on `channel` from now on.
  pub fn subscribe(&self, channel: Channel) -> Subscription {
    self.subscribe_filtered(channel, None)
  }

  /// Like [`EventBus::subscribe`], but entity events whose action differs
  /// from `action` are skipped. Pings are never filtered.
  pub fn subscribe_filtered(
    &self,
    channel: Channel,
    action: Option<EventAction>,
  ) -> Subscription {
    let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = mpsc::unbounded_channel();
    self
      .registry
      .lock()
      .entry(channel)
      .or_default()
      .push(Subscriber { id, tx });
    debug!(%channel, subscriber = id, "subscribed");
    Subscription {
      id,
      channel,
      action,
      rx,
      registry: Arc::clone(&self.registry),
    }
  }

  pub fn subscriber_count(&self, channel: Channel) -> usize {
    self.registry.lock().get(&channel).map_or(0, Vec::len)
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A live feed of one channel, in publish order.
pub struct Subscription {
  id:       u64,
  channel:  Channel,
  action:   Option<EventAction>,
  rx:       mpsc::UnboundedReceiver<Event>,
  registry: Arc<Registry>,
}

impl Subscription {
  pub fn channel(&self) -> Channel { self.channel }

  fn accepts(&self, event: &Event) -> bool {
    match (self.action, event.name.action()) {
      (Some(wanted), Some(actual)) => wanted == actual,
      _ => true,
    }
  }
}

impl Stream for Subscription {
  type Item = Event;

  fn poll_next(
    mut self: Pin<&mut Self>,
    cx: &mut Context<'_>,
  ) -> Poll<Option<Event>> {
    loop {
      match self.rx.poll_recv(cx) {
        Poll::Ready(Some(event)) if !self.accepts(&event) => continue,
        other => return other,
      }
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    let mut channels = self.registry.lock();
    if let Some(subscribers) = channels.get_mut(&self.channel) {
      subscribers.retain(|s| s.id != self.id);
      if subscribers.is_empty() {
        channels.remove(&self.channel);
      }
    }
    debug!(channel = %self.channel, subscriber = self.id, "unsubscribed");
  }
}

#[cfg(test)]
mod tests {
  use futures::{FutureExt as _, StreamExt as _};

  use super::*;
  use crate::movie::Genre;

  fn movie(genre: Option<Genre>) -> Movie {
    Movie {
      id: "m1".into(),
      title: "Night Shift".into(),
      release_date: None,
      genre,
      directors: Vec::new(),
      actors: Vec::new(),
    }
  }

  fn person() -> Person {
    Person {
      id:         "p1".into(),
      first_name: "Ada".into(),
      last_name:  "Lovelace".into(),
      dob:        None,
      email:      None,
    }
  }

  #[tokio::test]
  async fn delivers_in_publish_order() {
    let bus = EventBus::new();
    let mut sub = bus.subscribe(Channel::General);
    for i in 0..5 {
      bus.ping(&format!("ping {i}"));
    }
    for i in 0..5 {
      let event = sub.next().await.unwrap();
      assert_eq!(event.name, EventName::Ping);
      assert_eq!(event.body, format!("ping {i}"));
    }
    assert!(sub.next().now_or_never().is_none());
  }

  #[tokio::test]
  async fn horror_movie_reaches_both_channels() {
    let bus = EventBus::new();
    let mut all = bus.subscribe(Channel::Movie);
    let mut horror = bus.subscribe(Channel::HorrorMovie);
    let mut drama = bus.subscribe(Channel::DramaMovie);

    let sent = bus
      .publish_movie(EventAction::Added, &movie(Some(Genre::Horror)))
      .unwrap();

    let a = all.next().await.unwrap();
    let h = horror.next().await.unwrap();
    assert_eq!(a, sent);
    assert_eq!(h, sent);
    assert_eq!(a.name, EventName::MovieEventTypeAdd);
    assert_eq!(a.body["title"], "Night Shift");
    assert!(drama.next().now_or_never().is_none());
  }

  #[tokio::test]
  async fn dropped_subscription_deregisters() {
    let bus = EventBus::new();
    let kept = bus.subscribe(Channel::Person);
    let dropped = bus.subscribe(Channel::Person);
    assert_eq!(bus.subscriber_count(Channel::Person), 2);

    drop(dropped);
    assert_eq!(bus.subscriber_count(Channel::Person), 1);

    let event = bus.publish_person(EventAction::Added, &person()).unwrap();
    assert_eq!(event.name, EventName::PersonEventTypeAdd);
    assert_eq!(bus.publish(Channel::Person, &event), 1);

    drop(kept);
    assert_eq!(bus.subscriber_count(Channel::Person), 0);
  }

  #[tokio::test]
  async fn publish_without_subscribers_is_dropped() {
    let bus = EventBus::new();
    let event = bus.ping("nobody home");
    assert_eq!(bus.publish(Channel::General, &event), 0);

    // Late subscribers do not see earlier events.
    let mut sub = bus.subscribe(Channel::General);
    assert!(sub.next().now_or_never().is_none());
  }

  #[tokio::test]
  async fn action_filter_skips_other_actions() {
    let bus = EventBus::new();
    let mut updates =
      bus.subscribe_filtered(Channel::Person, Some(EventAction::Updated));
    bus.publish_person(EventAction::Added, &person()).unwrap();
    bus.publish_person(EventAction::Updated, &person()).unwrap();

    let event = updates.next().await.unwrap();
    assert_eq!(event.name, EventName::PersonEventTypeUpdate);
    assert!(updates.next().now_or_never().is_none());
  }

  #[tokio::test]
  async fn subscriptions_are_independent() {
    let bus = EventBus::new();
    let mut a = bus.subscribe(Channel::Triple);
    let b = bus.subscribe(Channel::Triple);
    drop(b);
    assert_eq!(bus.subscriber_count(Channel::Triple), 1);

    let event = Event::new(EventName::TripleEventTypeAdd, "t1".into());
    assert_eq!(bus.publish(Channel::Triple, &event), 1);
    assert_eq!(a.next().await.unwrap().id, event.id);
    assert!(a.next().now_or_never().is_none());
  }
}
