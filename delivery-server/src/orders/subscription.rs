//! Real-time subscription layer
//!
//! Two pieces:
//!
//! - [`OrderFeed`]: turns a projection into a lazy stream of full-snapshot
//!   events. The broadcast receivers are taken before the first query, so
//!   nothing committed after the initial snapshot can be missed.
//! - [`ViewSubscriptions`]: what a view holds. One background task per
//!   projection key, the latest state on a `watch` channel, torn down on
//!   unsubscribe or drop.
//!
//! Every item is a full replacement of the result set. Consecutive identical
//! results are collapsed.

use std::collections::{HashMap, HashSet};
use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::projections::{
    OrderProjections, ProjectionError, ProjectionKey, ProjectionSnapshot, event_touches,
    presence_touches,
};
use crate::drivers::PresenceChange;
use shared::models::Actor;
use shared::order::OrderEvent;

/// One item of a live feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Full replacement of the projection result
    Snapshot(ProjectionSnapshot),
    /// The single order the feed watches does not exist (or was purged)
    NotFound { order_id: String },
    /// Terminal: the feed ends after this
    Error(ProjectionError),
}

pub type ProjectionStream = Pin<Box<dyn Stream<Item = FeedEvent> + Send>>;

/// Factory for live projection feeds
#[derive(Debug, Clone)]
pub struct OrderFeed {
    projections: OrderProjections,
}

impl OrderFeed {
    pub fn new(projections: OrderProjections) -> Self {
        Self { projections }
    }

    pub fn projections(&self) -> &OrderProjections {
        &self.projections
    }

    /// Open a feed for `key` as seen by `actor`
    ///
    /// The first item is the initial snapshot (or error). The stream then
    /// waits for store changes and never ends on its own unless an error is
    /// emitted. Dropping it releases the broadcast receivers.
    pub fn stream(&self, actor: Actor, key: ProjectionKey) -> ProjectionStream {
        let state = FeedState {
            orders_rx: self.projections.manager().subscribe(),
            presence_rx: self.projections.presence().subscribe(),
            projections: self.projections.clone(),
            actor,
            key,
            visible: HashSet::new(),
            last: None,
            phase: Phase::Initial,
        };
        tracing::debug!(actor_id = %state.actor.id, key = %state.key, "Feed opened");

        futures::stream::unfold(state, |mut state| async move {
            let item = state.next_item().await?;
            Some((item, state))
        })
        .boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Live,
    Done,
}

struct FeedState {
    projections: OrderProjections,
    actor: Actor,
    key: ProjectionKey,
    orders_rx: broadcast::Receiver<OrderEvent>,
    presence_rx: broadcast::Receiver<PresenceChange>,
    /// Order IDs in the last emitted result
    visible: HashSet<String>,
    last: Option<FeedEvent>,
    phase: Phase,
}

impl FeedState {
    async fn next_item(&mut self) -> Option<FeedEvent> {
        loop {
            match self.phase {
                Phase::Done => return None,
                Phase::Initial => self.phase = Phase::Live,
                Phase::Live => {
                    if !self.wait_for_change().await {
                        self.phase = Phase::Done;
                        return Some(FeedEvent::Error(ProjectionError::FeedClosed));
                    }
                }
            }

            let event = self.evaluate();
            if let Some(event) = self.emit(event) {
                return Some(event);
            }
        }
    }

    fn evaluate(&self) -> FeedEvent {
        match self.projections.evaluate(&self.actor, &self.key) {
            Ok(Some(snapshot)) => FeedEvent::Snapshot(snapshot),
            Ok(None) => FeedEvent::NotFound {
                order_id: match &self.key {
                    ProjectionKey::Order(id) => id.clone(),
                    other => other.to_string(),
                },
            },
            Err(err) => FeedEvent::Error(err),
        }
    }

    /// Record the event and decide whether it goes out
    fn emit(&mut self, event: FeedEvent) -> Option<FeedEvent> {
        if let FeedEvent::Error(err) = &event {
            tracing::warn!(actor_id = %self.actor.id, key = %self.key, error = %err, "Feed failed");
            self.phase = Phase::Done;
            return Some(event);
        }
        if self.last.as_ref().is_some_and(|last| same_result(last, &event)) {
            return None;
        }
        self.visible = match &event {
            FeedEvent::Snapshot(snapshot) => snapshot.order_ids(),
            _ => HashSet::new(),
        };
        self.last = Some(event.clone());
        Some(event)
    }

    /// Wait until something may have changed the projection
    ///
    /// Returns `false` once the order feed is closed.
    async fn wait_for_change(&mut self) -> bool {
        use broadcast::error::RecvError;

        loop {
            tokio::select! {
                received = self.orders_rx.recv() => match received {
                    Ok(event) => {
                        if event_touches(&self.key, &event, &self.visible) {
                            self.drain_pending();
                            return true;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(key = %self.key, skipped, "Feed lagged, refreshing");
                        return true;
                    }
                    Err(RecvError::Closed) => return false,
                },
                received = self.presence_rx.recv() => match received {
                    Ok(change) => {
                        if presence_touches(&self.key, &change) {
                            return true;
                        }
                    }
                    Err(RecvError::Lagged(_)) => return true,
                    Err(RecvError::Closed) => return false,
                },
            }
        }
    }

    /// Skip events already queued; one re-query covers them all
    fn drain_pending(&mut self) {
        use broadcast::error::TryRecvError;

        loop {
            match self.orders_rx.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

/// Same orders in the same state; the store sequence alone is not a change
fn same_result(a: &FeedEvent, b: &FeedEvent) -> bool {
    match (a, b) {
        (FeedEvent::Snapshot(a), FeedEvent::Snapshot(b)) => a.key == b.key && a.orders == b.orders,
        (a, b) => a == b,
    }
}

// ========== View-side subscriptions ==========

/// Latest state of one subscribed projection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    Loading,
    Ready(ProjectionSnapshot),
    NotFound { order_id: String },
    Error(ProjectionError),
}

impl From<FeedEvent> for ViewState {
    fn from(event: FeedEvent) -> Self {
        match event {
            FeedEvent::Snapshot(snapshot) => ViewState::Ready(snapshot),
            FeedEvent::NotFound { order_id } => ViewState::NotFound { order_id },
            FeedEvent::Error(err) => ViewState::Error(err),
        }
    }
}

/// One running subscription
///
/// Dropping it freezes the published state at once: no `ViewState` lands
/// after the drop returns. The task itself, and with it the feed's broadcast
/// receiver, is released asynchronously on the runtime after the abort.
struct SubscriptionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    state: watch::Receiver<ViewState>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        // Publishing happens under the watch lock and checks the token, so
        // cancelling while holding the lock orders every publish before it.
        let guard = self.state.borrow();
        self.cancel.cancel();
        drop(guard);
        self.task.abort();
    }
}

/// The live subscriptions held by one view
///
/// At most one subscription per key. Must be used inside a tokio runtime.
pub struct ViewSubscriptions {
    feed: OrderFeed,
    actor: Actor,
    active: HashMap<ProjectionKey, SubscriptionHandle>,
}

impl ViewSubscriptions {
    pub fn new(feed: OrderFeed, actor: Actor) -> Self {
        Self {
            feed,
            actor,
            active: HashMap::new(),
        }
    }

    /// Subscribe to `key`; an existing subscription is reused
    pub fn subscribe(&mut self, key: ProjectionKey) -> watch::Receiver<ViewState> {
        if let Some(handle) = self.active.get(&key) {
            return handle.state.clone();
        }

        let (state_tx, state_rx) = watch::channel(ViewState::Loading);
        let cancel = CancellationToken::new();
        let mut stream = self.feed.stream(self.actor.clone(), key.clone());

        let task_cancel = cancel.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    item = stream.next() => match item {
                        Some(event) => {
                            let published = state_tx.send_if_modified(|state| {
                                if task_cancel.is_cancelled() {
                                    return false;
                                }
                                *state = ViewState::from(event);
                                true
                            });
                            if !published {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!(key = %task_key, "View subscription finished");
        });

        self.active.insert(
            key,
            SubscriptionHandle {
                cancel,
                task,
                state: state_rx.clone(),
            },
        );
        state_rx
    }

    /// Tear down any subscription for `key`, then subscribe again
    pub fn resubscribe(&mut self, key: ProjectionKey) -> watch::Receiver<ViewState> {
        self.unsubscribe(&key);
        self.subscribe(key)
    }

    /// Returns `true` if a subscription was torn down
    ///
    /// The key's state stops changing before this returns; its feed receiver
    /// is released once the aborted task is dropped by the runtime.
    pub fn unsubscribe(&mut self, key: &ProjectionKey) -> bool {
        self.active.remove(key).is_some()
    }

    pub fn unsubscribe_all(&mut self) {
        self.active.clear();
    }

    pub fn is_subscribed(&self, key: &ProjectionKey) -> bool {
        self.active.contains_key(key)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::orders::projections::test_support::*;
    use shared::order::{OrderCommand, OrderStatus, Transition};

    const WAIT: Duration = Duration::from_secs(2);

    async fn next(stream: &mut ProjectionStream) -> FeedEvent {
        tokio::time::timeout(WAIT, stream.next())
            .await
            .expect("feed stalled")
            .expect("feed ended")
    }

    fn orders(event: &FeedEvent) -> &[shared::order::OrderSnapshot] {
        match event {
            FeedEvent::Snapshot(snapshot) => &snapshot.orders,
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    async fn wait_for(
        rx: &mut watch::Receiver<ViewState>,
        pred: impl FnMut(&ViewState) -> bool,
    ) -> ViewState {
        tokio::time::timeout(WAIT, rx.wait_for(pred))
            .await
            .expect("view state never arrived")
            .expect("subscription dropped")
            .clone()
    }

    async fn wait_for_subscribers(projections: &OrderProjections, expected: usize) {
        tokio::time::timeout(WAIT, async {
            while projections.manager().subscriber_count() != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("broadcast receivers leaked");
    }

    #[tokio::test]
    async fn test_initial_snapshot_then_live_update() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        let first = place(&p, "cust-1");

        let mut stream = feed.stream(
            Actor::customer("cust-1"),
            ProjectionKey::Customer("cust-1".into()),
        );
        assert_eq!(orders(&next(&mut stream).await).len(), 1);

        let second = place(&p, "cust-1");
        let update = next(&mut stream).await;
        let ids: Vec<_> = orders(&update).iter().map(|o| o.order_id.clone()).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_other_customers_do_not_wake_feed() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        let mut stream = feed.stream(
            Actor::customer("cust-1"),
            ProjectionKey::Customer("cust-1".into()),
        );
        assert!(orders(&next(&mut stream).await).is_empty());

        place(&p, "cust-2");
        let mine = place(&p, "cust-1");

        // The first item after the initial one already reflects cust-1's order
        let update = next(&mut stream).await;
        assert_eq!(orders(&update)[0].order_id, mine);
    }

    #[tokio::test]
    async fn test_status_change_reaches_every_role() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        p.presence().go_online("driver-1");
        let order_id = place(&p, "cust-1");

        let mut customer = feed.stream(
            Actor::customer("cust-1"),
            ProjectionKey::Customer("cust-1".into()),
        );
        let mut driver = feed.stream(
            Actor::driver("driver-1"),
            ProjectionKey::Driver("driver-1".into()),
        );
        let mut owner = feed.stream(Actor::owner("owner-1"), ProjectionKey::Owner);
        for stream in [&mut customer, &mut driver, &mut owner] {
            assert_eq!(orders(&next(stream).await)[0].status, OrderStatus::Pending);
        }

        transition(&p, Actor::customer("cust-1"), &order_id, Transition::ConfirmPayment);

        for stream in [&mut customer, &mut driver, &mut owner] {
            assert_eq!(orders(&next(stream).await)[0].status, OrderStatus::Paid);
        }
    }

    #[tokio::test]
    async fn test_driver_feed_follows_presence() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        paid(&p, "cust-1");

        let mut stream = feed.stream(
            Actor::driver("driver-1"),
            ProjectionKey::Driver("driver-1".into()),
        );
        assert!(orders(&next(&mut stream).await).is_empty());

        p.presence().go_online("driver-1");
        assert_eq!(orders(&next(&mut stream).await).len(), 1);

        p.presence().go_offline("driver-1");
        assert!(orders(&next(&mut stream).await).is_empty());
    }

    #[tokio::test]
    async fn test_single_order_not_found_then_purged() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        let owner = Actor::owner("owner-1");

        let mut missing = feed.stream(owner.clone(), ProjectionKey::Order("nope".into()));
        assert_eq!(
            next(&mut missing).await,
            FeedEvent::NotFound {
                order_id: "nope".into()
            }
        );

        let order_id = place(&p, "cust-1");
        let mut stream = feed.stream(owner.clone(), ProjectionKey::Order(order_id.clone()));
        assert_eq!(orders(&next(&mut stream).await).len(), 1);

        let resp = p.manager().execute_command(OrderCommand::new(
            owner,
            shared::order::OrderCommandPayload::PurgeOrders {},
        ));
        assert!(resp.success);
        assert_eq!(next(&mut stream).await, FeedEvent::NotFound { order_id });
    }

    #[tokio::test]
    async fn test_permission_denied_ends_feed() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        let mut stream = feed.stream(Actor::customer("cust-1"), ProjectionKey::Owner);

        assert!(matches!(
            next(&mut stream).await,
            FeedEvent::Error(ProjectionError::PermissionDenied(_))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_command_emits_nothing() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        let order_id = place(&p, "cust-1");
        let mut stream = feed.stream(Actor::owner("owner-1"), ProjectionKey::Owner);
        next(&mut stream).await;

        // Illegal from pending: nothing committed, nothing broadcast
        let resp = p.manager().execute_command(OrderCommand::transition(
            Actor::driver("driver-1"),
            &order_id,
            Transition::PickUp,
        ));
        assert!(!resp.success);
        assert!(
            tokio::time::timeout(Duration::from_millis(100), stream.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_receivers() {
        let p = projections();
        let feed = OrderFeed::new(p.clone());
        let baseline = p.manager().subscriber_count();

        let stream = feed.stream(Actor::owner("owner-1"), ProjectionKey::Owner);
        assert_eq!(p.manager().subscriber_count(), baseline + 1);
        drop(stream);
        assert_eq!(p.manager().subscriber_count(), baseline);
    }

    #[tokio::test]
    async fn test_view_subscribe_is_idempotent() {
        let p = projections();
        let mut view = ViewSubscriptions::new(OrderFeed::new(p.clone()), Actor::owner("owner-1"));
        let baseline = p.manager().subscriber_count();

        let mut a = view.subscribe(ProjectionKey::Owner);
        let _b = view.subscribe(ProjectionKey::Owner);
        assert_eq!(view.active_count(), 1);
        assert_eq!(p.manager().subscriber_count(), baseline + 1);

        let state = wait_for(&mut a, |s| matches!(s, ViewState::Ready(_))).await;
        assert!(matches!(state, ViewState::Ready(snapshot) if snapshot.orders.is_empty()));
    }

    #[tokio::test]
    async fn test_view_receives_updates() {
        let p = projections();
        let mut view =
            ViewSubscriptions::new(OrderFeed::new(p.clone()), Actor::customer("cust-1"));
        let mut rx = view.subscribe(ProjectionKey::Customer("cust-1".into()));
        wait_for(&mut rx, |s| matches!(s, ViewState::Ready(_))).await;

        let order_id = place(&p, "cust-1");
        let state = wait_for(&mut rx, |s| {
            matches!(s, ViewState::Ready(snapshot) if snapshot.orders.len() == 1)
        })
        .await;
        let ViewState::Ready(snapshot) = state else {
            unreachable!()
        };
        assert_eq!(snapshot.orders[0].order_id, order_id);
    }

    #[tokio::test]
    async fn test_view_error_state() {
        let p = projections();
        let mut view =
            ViewSubscriptions::new(OrderFeed::new(p.clone()), Actor::driver("driver-1"));
        let mut rx = view.subscribe(ProjectionKey::Driver("driver-2".into()));

        let state = wait_for(&mut rx, |s| !matches!(s, ViewState::Loading)).await;
        assert!(matches!(
            state,
            ViewState::Error(ProjectionError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_and_drop_release_feeds() {
        let p = projections();
        let baseline = p.manager().subscriber_count();
        let mut view = ViewSubscriptions::new(OrderFeed::new(p.clone()), Actor::owner("owner-1"));

        view.subscribe(ProjectionKey::Owner);
        view.subscribe(ProjectionKey::Customer("cust-1".into()));
        assert_eq!(p.manager().subscriber_count(), baseline + 2);

        assert!(view.unsubscribe(&ProjectionKey::Owner));
        assert!(!view.unsubscribe(&ProjectionKey::Owner));
        wait_for_subscribers(&p, baseline + 1).await;

        drop(view);
        wait_for_subscribers(&p, baseline).await;
    }

    #[tokio::test]
    async fn test_resubscribe_replaces_listener() {
        let p = projections();
        let baseline = p.manager().subscriber_count();
        let mut view =
            ViewSubscriptions::new(OrderFeed::new(p.clone()), Actor::driver("driver-1"));
        let key = ProjectionKey::Driver("driver-1".into());

        let mut old = view.subscribe(key.clone());
        wait_for(&mut old, |s| matches!(s, ViewState::Ready(_))).await;

        p.presence().go_online("driver-1");
        let mut fresh = view.resubscribe(key.clone());
        assert_eq!(view.active_count(), 1);
        wait_for_subscribers(&p, baseline + 1).await;

        // The torn-down channel is closed once its task is gone
        assert!(old.has_changed().is_err());
        let state = wait_for(&mut fresh, |s| matches!(s, ViewState::Ready(_))).await;
        assert!(matches!(state, ViewState::Ready(snapshot) if snapshot.orders.is_empty()));
    }

    #[tokio::test]
    async fn test_unsubscribed_state_stays_frozen() {
        let p = projections();
        let baseline = p.manager().subscriber_count();
        let mut view =
            ViewSubscriptions::new(OrderFeed::new(p.clone()), Actor::customer("cust-1"));
        let key = ProjectionKey::Customer("cust-1".into());
        let mut rx = view.subscribe(key.clone());
        wait_for(&mut rx, |s| matches!(s, ViewState::Ready(_))).await;

        assert!(view.unsubscribe(&key));
        place(&p, "cust-1");
        wait_for_subscribers(&p, baseline).await;
        tokio::task::yield_now().await;

        assert!(matches!(&*rx.borrow(), ViewState::Ready(snapshot) if snapshot.orders.is_empty()));
    }
}
