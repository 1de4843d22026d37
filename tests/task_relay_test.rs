//! Task update relay over the socket

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use teamhub::backend::tasks::db::create_task;
use teamhub::shared::ServerEvent;
use uuid::Uuid;

fn is_task_event(event: &ServerEvent) -> bool {
    matches!(event, ServerEvent::TaskUpdated { .. } | ServerEvent::TaskError { .. })
}

#[tokio::test]
async fn test_update_reaches_assignees_only() {
    let server = TestServer::start().await;
    let groups = seed_workspace_with_project(&server.pool).await;
    let manager = seed_user(&server.pool, "manager").await;
    let alice = seed_user(&server.pool, "alice").await;
    let bob = seed_user(&server.pool, "bob").await;
    let task = create_task(&server.pool, groups.project, "Write launch post", &[alice.id])
        .await
        .unwrap();

    let mut manager_client = server.connect(&manager).await;
    let mut alice_phone = server.connect(&alice).await;
    let mut alice_laptop = server.connect(&alice).await;
    let mut bob_client = server.connect(&bob).await;

    let update = json!({ "status": "done" });
    let ack = manager_client
        .request("taskUpdate", json!({ "taskId": task.id, "update": update }))
        .await;
    assert!(ack.success);
    assert_eq!(ack.data, Some(json!({ "recipients": 2 })));

    let expected = ServerEvent::TaskUpdated {
        message: "Task \"Write launch post\" was updated".to_string(),
        update,
    };
    assert_eq!(alice_phone.recv_until(is_task_event).await, expected);
    assert_eq!(alice_laptop.recv_until(is_task_event).await, expected);
    assert!(!bob_client.drain().await.iter().any(is_task_event));
    assert!(!manager_client.drain().await.iter().any(is_task_event));
}

#[tokio::test]
async fn test_unknown_task_reports_to_origin_only() {
    let server = TestServer::start().await;
    let alice = seed_user(&server.pool, "alice").await;
    let bob = seed_user(&server.pool, "bob").await;
    let mut alice_client = server.connect(&alice).await;
    let mut bob_client = server.connect(&bob).await;

    alice_client
        .emit("taskUpdate", json!({ "taskId": Uuid::new_v4(), "update": {} }))
        .await;

    let event = alice_client.recv_until(is_task_event).await;
    assert_eq!(
        event,
        ServerEvent::TaskError {
            message: "Task not found".to_string()
        }
    );

    // no generic error event on top of taskError
    let rest = alice_client.drain().await;
    assert!(!rest.iter().any(|e| matches!(e, ServerEvent::Error { .. })));
    assert!(!bob_client.drain().await.iter().any(is_task_event));
}

#[tokio::test]
async fn test_unassigned_task_notifies_nobody() {
    let server = TestServer::start().await;
    let groups = seed_workspace_with_project(&server.pool).await;
    let alice = seed_user(&server.pool, "alice").await;
    let task = create_task(&server.pool, groups.project, "Backlog item", &[])
        .await
        .unwrap();
    let mut client = server.connect(&alice).await;

    let ack = client
        .request("taskUpdate", json!({ "taskId": task.id, "update": { "title": "x" } }))
        .await;
    assert!(ack.success);
    assert_eq!(ack.data, Some(json!({ "recipients": 0 })));
}
