/**
 * Socket Session
 *
 * Lifecycle of one authenticated connection:
 *
 * 1. Register the outbound handle with the room hub
 * 2. Join rooms and announce presence concurrently
 * 3. Send `connected` once both are done
 * 4. Handle inbound frames one at a time
 * 5. Leave rooms, drop the handle, announce offline
 *
 * A writer task drains the outbound queue into the socket, so broadcasts
 * from other connections never wait on this socket.
 *
 * Each inbound event runs in its own spawned task that the loop awaits.
 * A panic is contained to that event and reported as an `error` event.
 */

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::backend::auth::Identity;
use crate::backend::chat::relay_typing;
use crate::backend::error::BackendError;
use crate::backend::realtime::ConnectionHandle;
use crate::backend::server::state::AppState;
use crate::shared::event::{Ack, ClientEvent, ClientFrame, ServerEvent};
use crate::shared::Destination;

pub async fn run_session(socket: WebSocket, identity: Identity, state: AppState) {
    let user_id = identity.user_id;
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(state.outbound_buffer);

    let handle = Arc::new(ConnectionHandle::new(user_id, tx));
    state.hub.add(handle.clone()).await;
    tracing::info!("[Socket] Connection {} opened for user {}", handle.id, user_id);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(WsMessage::Text(String::clone(&frame).into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let (joined, _) = tokio::join!(
        state.rooms.join_group_rooms(&handle),
        state.presence.register(user_id, handle.id)
    );

    match joined {
        Ok(rooms) => {
            let online_users = state.presence.online_users().await;
            handle.send_event(&ServerEvent::Connected {
                user_id,
                rooms: rooms.iter().map(ToString::to_string).collect(),
                online_users,
            });

            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => handle_frame(&state, &handle, text.as_str()).await,
                    Ok(WsMessage::Binary(_)) => {
                        handle.send_event(&ServerEvent::Error {
                            message: "Binary frames are not supported".to_string(),
                        });
                    }
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!("[Socket] Connection {} read error: {}", handle.id, e);
                        break;
                    }
                }
            }
        }
        Err(err) => {
            tracing::error!("[Socket] Room setup failed for user {}: {}", user_id, err);
            handle.send_event(&ServerEvent::Error {
                message: err.message(),
            });
        }
    }

    state.rooms.leave_all(handle.id).await;
    state.hub.remove(handle.id).await;
    state.presence.unregister(user_id, handle.id).await;
    tracing::info!("[Socket] Connection {} closed for user {}", handle.id, user_id);

    drop(handle);
    let _ = writer.await;
}

/// Decode one text frame, run it, and answer the origin connection
async fn handle_frame(state: &AppState, handle: &Arc<ConnectionHandle>, text: &str) {
    let frame = match ClientFrame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("[Socket] Malformed frame from {}: {}", handle.user_id, e);
            handle.send_event(&ServerEvent::Error {
                message: e.to_string(),
            });
            return;
        }
    };

    let ack_id = frame.ack_id;
    let event = match frame.into_event() {
        Ok((_, event)) => event,
        Err(e) => {
            tracing::debug!("[Socket] Invalid event from {}: {}", handle.user_id, e);
            reply_error(handle, ack_id, e.to_string());
            return;
        }
    };

    let name = event.name();
    let task_state = state.clone();
    let task_handle = handle.clone();
    let outcome = tokio::spawn(async move { dispatch(&task_state, &task_handle, event).await }).await;
    respond(handle, name, ack_id, outcome);
}

/// Answer the origin connection with the outcome of one event
fn respond(
    handle: &ConnectionHandle,
    name: &str,
    ack_id: Option<u64>,
    outcome: Result<Result<Value, BackendError>, JoinError>,
) {
    match outcome {
        Ok(Ok(data)) => {
            if ack_id.is_some() {
                handle.send_event(&ServerEvent::Ack(Ack::ok(ack_id, data)));
            }
        }
        Ok(Err(err)) => {
            if let BackendError::Persistence(e) = &err {
                tracing::error!("[Socket] {} from {} failed in storage: {:?}", name, handle.user_id, e);
            } else {
                tracing::debug!("[Socket] {} from {} failed: {}", name, handle.user_id, err);
            }
            // the relay already sent taskError
            if ack_id.is_some() || name != "taskUpdate" {
                reply_error(handle, ack_id, err.message());
            }
        }
        Err(join_err) => {
            tracing::error!("[Socket] Handler for {} from {} panicked: {}", name, handle.user_id, join_err);
            let message = format!("Internal error while handling {}", name);
            handle.send_event(&ServerEvent::Error {
                message: message.clone(),
            });
            if ack_id.is_some() {
                handle.send_event(&ServerEvent::Ack(Ack::err(ack_id, message)));
            }
        }
    }
}

/// Failed ack when the client asked for one, otherwise an `error` event
fn reply_error(handle: &ConnectionHandle, ack_id: Option<u64>, message: String) {
    if ack_id.is_some() {
        handle.send_event(&ServerEvent::Ack(Ack::err(ack_id, message)));
    } else {
        handle.send_event(&ServerEvent::Error { message });
    }
}

async fn dispatch(
    state: &AppState,
    handle: &ConnectionHandle,
    event: ClientEvent,
) -> Result<Value, BackendError> {
    let user_id = handle.user_id;
    match event {
        ClientEvent::TaskUpdate(request) => {
            let recipients = state.relay.notify_task_update(handle, request).await?;
            Ok(json!({ "recipients": recipients }))
        }
        ClientEvent::SetStatus(request) => {
            state
                .presence
                .set_status(user_id, &request.status, handle.id)
                .await?;
            Ok(json!({ "status": request.status.trim() }))
        }
        ClientEvent::SendPersonalMessage(request) => {
            let destination = Destination::Personal {
                receiver: request.receiver_id,
            };
            let message = state
                .pipeline
                .send(user_id, destination, &request.content, request.attachments)
                .await?;
            Ok(serde_json::to_value(message)?)
        }
        ClientEvent::SendProjectMessage(request) => {
            let destination = Destination::Project {
                project: request.project_id,
            };
            let message = state
                .pipeline
                .send(user_id, destination, &request.content, request.attachments)
                .await?;
            Ok(serde_json::to_value(message)?)
        }
        ClientEvent::SendWorkspaceMessage(request) => {
            let destination = Destination::Workspace {
                workspace: request.workspace_id,
            };
            let message = state
                .pipeline
                .send(user_id, destination, &request.content, request.attachments)
                .await?;
            Ok(serde_json::to_value(message)?)
        }
        ClientEvent::Typing(request) => {
            let delivered = relay_typing(&state.hub, handle, &request).await;
            Ok(json!({ "delivered": delivered }))
        }
        ClientEvent::MarkMessageRead(request) => {
            let message = state.pipeline.mark_read(user_id, request.message_id).await?;
            Ok(serde_json::to_value(message)?)
        }
    }
}
