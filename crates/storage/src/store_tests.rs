// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration;
use guardian_core::{SessionId, Username};

fn user(name: &str) -> Username {
    Username::parse(name).unwrap()
}

#[tokio::test]
async fn insert_and_list_open_sessions() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let start = Utc::now();
    let session = Session::new(SessionId::new("sess-1"), user("ada"), start);

    storage.insert_session(&session).await.unwrap();

    let open = storage.list_open_sessions().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id.as_str(), "sess-1");
    assert_eq!(open[0].username.as_str(), "ada");
    assert!(open[0].is_open());
}

#[tokio::test]
async fn insert_session_is_idempotent() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let start = Utc::now();
    let session = Session::new(SessionId::new("sess-1"), user("ada"), start);

    storage.insert_session(&session).await.unwrap();
    storage.insert_session(&session).await.unwrap();

    let open = storage.list_open_sessions().await.unwrap();
    assert_eq!(open.len(), 1);
}

#[tokio::test]
async fn update_session_progress_then_close_removes_it_from_open_list() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let start = Utc::now();
    let id = SessionId::new("sess-1");
    let session = Session::new(id.clone(), user("ada"), start);
    storage.insert_session(&session).await.unwrap();

    storage
        .update_session_progress(&id, 120.0, start + Duration::minutes(2))
        .await
        .unwrap();

    let open = storage.list_open_sessions().await.unwrap();
    assert_eq!(open[0].accumulated_seconds, 120.0);

    storage
        .close_session(&id, start + Duration::minutes(5), 300.0)
        .await
        .unwrap();

    let open = storage.list_open_sessions().await.unwrap();
    assert!(open.is_empty());
}

#[tokio::test]
async fn close_session_is_a_no_op_once_already_closed() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let start = Utc::now();
    let id = SessionId::new("sess-1");
    let session = Session::new(id.clone(), user("ada"), start);
    storage.insert_session(&session).await.unwrap();

    storage
        .close_session(&id, start + Duration::minutes(5), 300.0)
        .await
        .unwrap();
    storage
        .close_session(&id, start + Duration::minutes(50), 3000.0)
        .await
        .unwrap();

    let total = storage
        .sum_usage(&user("ada"), start, start + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(total, 300.0);
}

#[tokio::test]
async fn sum_usage_counts_a_still_open_session_through_the_query_horizon() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let start = Utc::now();
    let id = SessionId::new("sess-1");
    let session = Session::new(id.clone(), user("ada"), start);
    storage.insert_session(&session).await.unwrap();
    storage
        .update_session_progress(&id, 600.0, start + Duration::minutes(10))
        .await
        .unwrap();

    let total = storage
        .sum_usage(&user("ada"), start, start + Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(total, 600.0);
}

#[tokio::test]
async fn sum_usage_ignores_other_users() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let start = Utc::now();
    let ada = Session::new(SessionId::new("sess-ada"), user("ada"), start);
    let bob = Session::new(SessionId::new("sess-bob"), user("bob"), start);
    storage.insert_session(&ada).await.unwrap();
    storage.insert_session(&bob).await.unwrap();
    storage
        .close_session(&ada.id, start + Duration::minutes(1), 60.0)
        .await
        .unwrap();
    storage
        .close_session(&bob.id, start + Duration::minutes(1), 60.0)
        .await
        .unwrap();

    let total = storage
        .sum_usage(&user("ada"), start, start + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(total, 60.0);
}

#[tokio::test]
async fn sync_config_replaces_the_whole_mirror() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    storage
        .sync_config(vec![("reset_time".to_string(), "04:00".to_string())])
        .await
        .unwrap();
    storage
        .sync_config(vec![("reset_time".to_string(), "05:00".to_string())])
        .await
        .unwrap();

    let value: String = storage
        .conn
        .call(|conn| {
            Ok(conn.query_row(
                "SELECT value FROM config_mirror WHERE key = 'reset_time'",
                [],
                |row| row.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(value, "05:00");
}

#[tokio::test]
async fn record_bonus_accumulates_within_the_same_day() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let day_start = Utc::now();
    storage.record_bonus(&user("ada"), day_start, 600).await.unwrap();
    storage.record_bonus(&user("ada"), day_start, 300).await.unwrap();

    let seconds = storage.bonus_seconds(&user("ada"), day_start).await.unwrap();
    assert_eq!(seconds, 900);
}

#[tokio::test]
async fn bonus_seconds_is_zero_when_none_recorded() {
    let storage = Storage::open_in_memory_for_tests().await.unwrap();
    let seconds = storage
        .bonus_seconds(&user("ada"), Utc::now())
        .await
        .unwrap();
    assert_eq!(seconds, 0);
}
