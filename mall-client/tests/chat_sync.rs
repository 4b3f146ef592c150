mod common;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use common::*;
use mall_client::chat::{ChatPoller, ChatSyncEngine, MessageLog, SendOutcome};
use mall_client::storage::{MemoryStorage, Storage, keys};
use shared::models::{DeliveryStatus, MessageId, SupportMessage};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

fn server_msg(id: u64, secs: i64, content: &str) -> SupportMessage {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + ChronoDuration::seconds(secs);
    SupportMessage {
        id: MessageId::Server(id),
        status: DeliveryStatus::Sent,
        ..SupportMessage::local_text(content, at)
    }
}

fn ids(messages: &[SupportMessage]) -> Vec<MessageId> {
    messages.iter().map(|m| m.id).collect()
}

// ========== Merge ==========

#[test]
fn test_poll_and_send_merge_commute() {
    let local = SupportMessage::local_text("where is my parcel?", server_msg(0, 10, "").created_at);
    let local_id = local.id;
    let confirmed = server_msg(7, 11, "where is my parcel?");
    let batch = vec![server_msg(6, 5, "hello"), confirmed.clone(), server_msg(8, 20, "shipped today")];

    let mut poll_first = MessageLog::new();
    poll_first.push_local(local.clone());
    poll_first.merge(batch.clone());
    poll_first.confirm_local(&local_id, confirmed.clone());

    let mut send_first = MessageLog::new();
    send_first.push_local(local);
    send_first.confirm_local(&local_id, confirmed);
    send_first.merge(batch);

    assert_eq!(ids(poll_first.messages()), ids(send_first.messages()));
    assert_eq!(
        ids(poll_first.messages()),
        vec![MessageId::Server(6), MessageId::Server(7), MessageId::Server(8)]
    );
    assert_eq!(poll_first.cursor(), send_first.cursor());
}

// ========== Offline send and replay ==========

#[tokio::test]
async fn test_offline_send_replays_once() {
    let backend = FakeChat::new(false);
    let engine = ChatSyncEngine::open(backend.clone(), Arc::new(MemoryStorage::new()));

    let outcome = engine.send_text("hello?").await.unwrap();
    let local_id = outcome.local_id().unwrap();
    assert!(matches!(outcome, SendOutcome::Queued { .. }));
    let messages = engine.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, local_id);
    assert_eq!(messages[0].status, DeliveryStatus::Error);
    assert_eq!(engine.queued().len(), 1);

    // still offline: stays queued
    let report = engine.on_foreground(true).await;
    assert_eq!(report.failed, 1);
    assert_eq!(engine.queued().len(), 1);

    backend.set_online(true);
    let report = engine.on_connectivity_change(true).await;
    assert_eq!(report.sent, 1);
    assert!(engine.queued().is_empty());

    // the poll re-delivers the confirmed message; it must not duplicate
    engine.refresh().await.unwrap();
    let messages = engine.messages();
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].id.is_local());
    assert_eq!(messages[0].status, DeliveryStatus::Sent);
    assert_eq!(messages[0].content, "hello?");
}

#[tokio::test]
async fn test_replay_keeps_enqueue_order() {
    let backend = FakeChat::new(false);
    let engine = ChatSyncEngine::open(backend.clone(), Arc::new(MemoryStorage::new()));
    engine.send_text("first").await.unwrap();
    engine.send_text("second").await.unwrap();

    backend.set_online(true);
    engine.replay_offline().await;

    let contents: Vec<String> = engine.messages().into_iter().map(|m| m.content).collect();
    assert_eq!(contents, vec!["first", "second"]);
    let server_ids: Vec<Option<u64>> = engine.messages().iter().map(|m| m.id.server_id()).collect();
    assert_eq!(server_ids, vec![Some(1), Some(2)]);
}

#[tokio::test]
async fn test_attachment_failure_is_not_queued() {
    let backend = FakeChat::new(false);
    let engine = ChatSyncEngine::open(backend.clone(), Arc::new(MemoryStorage::new()));

    let outcome = engine
        .send_attachment(std::path::Path::new("/data/photo.jpg"), "damaged box")
        .await
        .unwrap();

    assert!(matches!(outcome, SendOutcome::Failed { .. }));
    assert!(engine.queued().is_empty());
    backend.set_online(true);
    assert_eq!(engine.replay_offline().await.sent, 0);
}

#[tokio::test]
async fn test_corrupt_cache_starts_empty() {
    let storage = Arc::new(MemoryStorage::new());
    storage.save(keys::CHAT_CACHE, "{not json").unwrap();
    storage.save(keys::OFFLINE_QUEUE, "[1, 2").unwrap();

    let engine = ChatSyncEngine::open(FakeChat::new(true), storage);
    assert!(engine.messages().is_empty());
    assert!(engine.queued().is_empty());
    assert_eq!(engine.cursor(), None);
}

#[tokio::test]
async fn test_cache_round_trips_through_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeChat::new(true);
    backend.staff_reply("hi, how can we help?");

    let storage = Arc::new(mall_client::storage::FileStorage::new(dir.path()));
    let engine = ChatSyncEngine::open(backend.clone(), storage.clone());
    engine.refresh().await.unwrap();
    let cursor = engine.cursor();
    drop(engine);

    let reopened = ChatSyncEngine::open(backend, storage);
    assert_eq!(reopened.messages().len(), 1);
    assert!(reopened.messages()[0].from_staff);
    assert_eq!(reopened.cursor(), cursor);
}

#[tokio::test(start_paused = true)]
async fn test_connectivity_watcher_replays_on_reconnect() {
    let backend = FakeChat::new(false);
    let engine = ChatSyncEngine::open(backend.clone(), Arc::new(MemoryStorage::new()));
    engine.send_text("ping").await.unwrap();

    let (online_tx, online_rx) = watch::channel(false);
    let cancel = CancellationToken::new();
    let handle = engine.watch_connectivity(online_rx, cancel.clone());

    backend.set_online(true);
    online_tx.send(true).unwrap();
    for _ in 0..10 {
        if engine.queued().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(engine.queued().is_empty());
    assert_eq!(engine.messages()[0].status, DeliveryStatus::Sent);

    cancel.cancel();
    handle.await.unwrap();
}

// ========== Polling ==========

#[tokio::test(start_paused = true)]
async fn test_poller_pauses_and_resumes_with_visibility() {
    let backend = FakeChat::new(true);
    let engine = ChatSyncEngine::open(backend.clone(), Arc::new(MemoryStorage::new()));
    let mut poller = ChatPoller::start(engine, Duration::from_secs(3));

    // immediate fetch on start
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.fetch_count(), 1);

    // ticks at 3s and 6s
    tokio::time::sleep(Duration::from_millis(7_000)).await;
    assert_eq!(backend.fetch_count(), 3);

    poller.set_visible(false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.fetch_count(), 3);

    // visible again: one fetch right away, then the interval
    poller.set_visible(true);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.fetch_count(), 4);
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    assert_eq!(backend.fetch_count(), 5);

    poller.stop();
    poller.stop();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.fetch_count(), 5);
    assert!(!poller.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_visibility_does_not_refetch() {
    let backend = FakeChat::new(true);
    let engine = ChatSyncEngine::open(backend.clone(), Arc::new(MemoryStorage::new()));
    let poller = ChatPoller::start(engine, Duration::from_secs(3));

    tokio::time::sleep(Duration::from_millis(1)).await;
    poller.set_visible(true);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(backend.fetch_count(), 1);
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
    drop(poller);
}
