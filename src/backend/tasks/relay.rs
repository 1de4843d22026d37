/**
 * Task Event Relay
 *
 * Tells a task's current assignees that it changed. Permission to edit the
 * task is checked by the REST layer before the update is relayed; the relay
 * only routes.
 *
 * # Delivery
 *
 * - Task found: `taskUpdated` to each assignee's private room.
 * - Task missing (or lookup failed): `taskError` to the originating
 *   connection only.
 */

use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::realtime::{ConnectionHandle, Room, RoomHub};
use crate::backend::store::TaskStore;
use crate::shared::event::{ServerEvent, TaskUpdateRequest};

#[derive(Clone)]
pub struct TaskEventRelay {
    hub: Arc<RoomHub>,
    tasks: Arc<dyn TaskStore>,
}

impl TaskEventRelay {
    pub fn new(hub: Arc<RoomHub>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { hub, tasks }
    }

    /// Notify assignees of a task update
    ///
    /// # Returns
    /// Number of connections notified
    pub async fn notify_task_update(
        &self,
        origin: &ConnectionHandle,
        request: TaskUpdateRequest,
    ) -> Result<usize, BackendError> {
        match self.fan_out(request).await {
            Ok(recipients) => Ok(recipients),
            Err(err) => {
                tracing::warn!("[Relay] Task update from {} failed: {}", origin.user_id, err);
                origin.send_event(&ServerEvent::TaskError {
                    message: err.message(),
                });
                Err(err)
            }
        }
    }

    async fn fan_out(&self, request: TaskUpdateRequest) -> Result<usize, BackendError> {
        let task = self
            .tasks
            .find_by_id(request.task_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Task"))?;

        let event = ServerEvent::TaskUpdated {
            message: format!("Task \"{}\" was updated", task.title),
            update: request.update,
        };

        let mut recipients = 0;
        for assignee in &task.assignees {
            recipients += self.hub.broadcast(Room::User(*assignee), &event).await;
        }

        tracing::info!(
            "[Relay] Task {} update sent to {} assignees ({} connections)",
            task.id,
            task.assignees.len(),
            recipients
        );
        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Task;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    struct OneTask(Task);

    #[async_trait]
    impl TaskStore for OneTask {
        async fn find_by_id(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
            Ok((self.0.id == task_id).then(|| self.0.clone()))
        }
    }

    async fn connect(hub: &RoomHub, user_id: Uuid) -> (Arc<ConnectionHandle>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(user_id, tx));
        hub.add(handle.clone()).await;
        hub.join(handle.id, Room::User(user_id)).await;
        (handle, rx)
    }

    fn task(assignees: Vec<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Ship it".to_string(),
            status: "todo".to_string(),
            assignees,
            updated_at: crate::shared::message::timestamp_now(),
        }
    }

    #[tokio::test]
    async fn test_only_assignees_are_notified() {
        let hub = Arc::new(RoomHub::new());
        let (editor, mut editor_rx) = connect(&hub, Uuid::new_v4()).await;
        let assignee = Uuid::new_v4();
        let (_, mut assignee_rx) = connect(&hub, assignee).await;
        let (_, mut bystander_rx) = connect(&hub, Uuid::new_v4()).await;

        let task = task(vec![assignee]);
        let relay = TaskEventRelay::new(hub.clone(), Arc::new(OneTask(task.clone())));

        let sent = relay
            .notify_task_update(
                &editor,
                TaskUpdateRequest {
                    task_id: task.id,
                    update: json!({"status": "done"}),
                },
            )
            .await
            .unwrap();
        assert_eq!(sent, 1);

        let event: ServerEvent = serde_json::from_str(&assignee_rx.try_recv().unwrap()).unwrap();
        match event {
            ServerEvent::TaskUpdated { message, update } => {
                assert!(message.contains("Ship it"));
                assert_eq!(update, json!({"status": "done"}));
            }
            other => panic!("Expected TaskUpdated, got {:?}", other),
        }
        assert!(editor_rx.try_recv().is_err());
        assert!(bystander_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_task_reports_to_origin_only() {
        let hub = Arc::new(RoomHub::new());
        let assignee = Uuid::new_v4();
        let (editor, mut editor_rx) = connect(&hub, Uuid::new_v4()).await;
        let (_, mut assignee_rx) = connect(&hub, assignee).await;
        let relay = TaskEventRelay::new(hub.clone(), Arc::new(OneTask(task(vec![assignee]))));

        let result = relay
            .notify_task_update(
                &editor,
                TaskUpdateRequest {
                    task_id: Uuid::new_v4(),
                    update: json!({}),
                },
            )
            .await;
        assert!(matches!(result, Err(BackendError::NotFound { .. })));

        let event: ServerEvent = serde_json::from_str(&editor_rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            event,
            ServerEvent::TaskError {
                message: "Task not found".to_string()
            }
        );
        assert!(assignee_rx.try_recv().is_err());
    }
}
