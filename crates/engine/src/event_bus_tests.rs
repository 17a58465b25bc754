// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use qo_core::Event;

#[tokio::test]
async fn subscribers_receive_published_events() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();
    bus.publish(Event::KvSet { key: "a".into(), value: serde_json::json!(1) });

    let received = rx.recv().await.unwrap();
    assert!(matches!(received, Event::KvSet { key, .. } if key == "a"));
}

#[tokio::test]
async fn publish_with_no_subscribers_does_not_panic() {
    let bus = EventBus::new(8);
    bus.publish(Event::KvSet { key: "a".into(), value: serde_json::json!(1) });
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test]
async fn a_lagging_subscriber_observes_lagged_not_a_hang() {
    let bus = EventBus::new(2);
    let mut rx = bus.subscribe();
    for i in 0..5 {
        bus.publish(Event::KvSet { key: format!("k{i}"), value: serde_json::json!(i) });
    }

    let result = rx.recv().await;
    assert!(matches!(result, Err(tokio::sync::broadcast::error::RecvError::Lagged(_))));
}

#[tokio::test]
async fn multiple_subscribers_each_get_their_own_copy() {
    let bus = EventBus::new(8);
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();
    bus.publish(Event::KvSet { key: "shared".into(), value: serde_json::json!(true) });

    assert!(rx1.recv().await.is_ok());
    assert!(rx2.recv().await.is_ok());
}
