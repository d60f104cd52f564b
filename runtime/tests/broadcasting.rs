//! Integration tests for action broadcasting and snapshot publication
//!
//! Observers of a Store see two streams: the actions fed back by effects
//! (after they are reduced) and the snapshot replacements. These tests pin
//! down what each stream carries and how slow observers are treated.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use std::sync::Arc;
use std::time::Duration;
use tally_core::effect::Effect;
use tally_core::reducer::Reducer;
use tally_core::{smallvec, SmallVec};
use tally_runtime::{Store, StoreConfig, StoreError};
use tally_testing::helpers::init_test_tracing;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, PartialEq)]
struct Tally {
    clicks: u32,
    loaded: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
enum TallyAction {
    Click,
    Loaded(u32),
    LoadInOrder(Vec<u32>),
    LoadLater(u32),
}

#[derive(Debug, Clone)]
struct TallyReducer;

impl Reducer for TallyReducer {
    type State = Tally;
    type Action = TallyAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TallyAction::Click => {
                state.clicks += 1;
                let clicks = state.clicks;
                smallvec![Effect::future(async move { Some(TallyAction::Loaded(clicks)) })]
            },
            TallyAction::Loaded(value) => {
                state.loaded.push(value);
                smallvec![Effect::None]
            },
            TallyAction::LoadInOrder(values) => {
                let steps = values
                    .into_iter()
                    .map(|value| Effect::future(async move { Some(TallyAction::Loaded(value)) }))
                    .collect();
                smallvec![Effect::chain(steps)]
            },
            TallyAction::LoadLater(value) => smallvec![Effect::Delay {
                duration: Duration::from_millis(20),
                action: Box::new(TallyAction::Loaded(value)),
            }],
        }
    }
}

type TallyStore = Store<Tally, TallyAction, (), TallyReducer>;

fn store() -> TallyStore {
    init_test_tracing();
    Store::new(Tally::default(), TallyReducer, ())
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<TallyAction>) -> (Vec<TallyAction>, bool) {
    let mut received = Vec::new();
    let mut lagged = false;
    loop {
        match rx.try_recv() {
            Ok(action) => received.push(action),
            Err(TryRecvError::Lagged(_)) => lagged = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    (received, lagged)
}

#[tokio::test]
async fn broadcast_actions_are_already_reduced() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(TallyAction::Click).await.unwrap();

    let action = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(action, TallyAction::Loaded(1));
    assert_eq!(store.snapshot().loaded, vec![1]);
}

#[tokio::test]
async fn directly_sent_actions_are_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(TallyAction::Click).await.unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();
    store.send(TallyAction::Loaded(7)).await.unwrap();

    let (received, _) = drain(&mut rx);
    assert_eq!(received, vec![TallyAction::Loaded(1)]);
    assert_eq!(store.snapshot().loaded, vec![1, 7]);
}

#[tokio::test]
async fn sequential_effects_broadcast_in_order() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store
        .send(TallyAction::LoadInOrder(vec![3, 1, 2]))
        .await
        .unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    let (received, lagged) = drain(&mut rx);
    assert!(!lagged);
    assert_eq!(
        received,
        vec![
            TallyAction::Loaded(3),
            TallyAction::Loaded(1),
            TallyAction::Loaded(2),
        ]
    );
    assert_eq!(store.snapshot().loaded, vec![3, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn delayed_actions_are_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(TallyAction::LoadLater(9)).await.unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    let action = rx.recv().await.unwrap();
    assert_eq!(action, TallyAction::Loaded(9));
}

#[tokio::test]
async fn every_subscriber_sees_every_action() {
    let store = store();
    let mut receivers: Vec<_> = (0..3).map(|_| store.subscribe_actions()).collect();

    for _ in 0..2 {
        let mut handle = store.send(TallyAction::Click).await.unwrap();
        handle.wait_with_timeout(WAIT).await.unwrap();
    }

    for rx in &mut receivers {
        let (received, _) = drain(rx);
        assert_eq!(received, vec![TallyAction::Loaded(1), TallyAction::Loaded(2)]);
    }
}

#[tokio::test]
async fn lagging_subscriber_skips_but_keeps_receiving() {
    init_test_tracing();
    let config = StoreConfig::default().with_broadcast_capacity(4);
    let store = Store::with_config(Tally::default(), TallyReducer, (), config);
    let mut rx = store.subscribe_actions();

    for _ in 0..20 {
        let mut handle = store.send(TallyAction::Click).await.unwrap();
        handle.wait_with_timeout(WAIT).await.unwrap();
    }

    let (received, lagged) = drain(&mut rx);
    assert!(lagged, "a capacity of 4 cannot hold 20 actions");
    assert_eq!(received.len(), 4);
    assert_eq!(received.last(), Some(&TallyAction::Loaded(20)));

    // The store itself never waits for slow observers
    assert_eq!(store.snapshot().loaded.len(), 20);
}

#[tokio::test]
async fn snapshot_observers_can_wait_for_a_condition() {
    let store = store();
    let mut snapshots = store.subscribe();

    store.send(TallyAction::LoadInOrder(vec![1, 2])).await.unwrap();

    let done = snapshots
        .wait_for(|tally| tally.loaded.len() == 2, WAIT)
        .await
        .expect("both values should load");
    assert_eq!(done.loaded, vec![1, 2]);
}

#[tokio::test]
async fn send_and_wait_for_returns_the_matching_action() {
    let store = store();

    let matched = store
        .send_and_wait_for(
            TallyAction::LoadInOrder(vec![5, 6]),
            |action| matches!(action, TallyAction::Loaded(6)),
            WAIT,
        )
        .await
        .unwrap();

    assert_eq!(matched, TallyAction::Loaded(6));
    assert_eq!(store.snapshot().loaded, vec![5, 6]);
}

#[tokio::test]
async fn subscribers_observe_closed_channel_when_store_is_dropped() {
    let store = store();
    let mut rx = store.subscribe_actions();
    let waiter = tokio::spawn(async move { rx.recv().await });

    drop(store);

    let result = waiter.await.expect("waiter should not panic");
    assert!(matches!(result, Err(RecvError::Closed)));
}

#[tokio::test]
async fn feedback_from_shutdown_is_still_broadcast() {
    let store = Arc::new(store());
    let mut rx = store.subscribe_actions();

    store.send(TallyAction::LoadLater(4)).await.unwrap();
    store.shutdown(WAIT).await.unwrap();

    assert_eq!(rx.recv().await.unwrap(), TallyAction::Loaded(4));
    assert!(matches!(
        store.send(TallyAction::Click).await,
        Err(StoreError::ShutdownInProgress)
    ));
}

proptest::proptest! {
    #[test]
    fn sequential_broadcast_preserves_any_order(values in proptest::collection::vec(0_u32..1000, 0..12)) {
        let broadcast = tokio_test::block_on(async {
            let store = store();
            let mut rx = store.subscribe_actions();
            let mut handle = store
                .send(TallyAction::LoadInOrder(values.clone()))
                .await
                .unwrap();
            handle.wait_with_timeout(WAIT).await.unwrap();
            drain(&mut rx).0
        });

        let expected: Vec<_> = values.into_iter().map(TallyAction::Loaded).collect();
        proptest::prop_assert_eq!(broadcast, expected);
    }
}
