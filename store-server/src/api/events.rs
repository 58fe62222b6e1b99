//! WebSocket 订单事件推送
//!
//! GET /api/v1/events
//!
//! 连接建立后服务器把 [`BusMessage`] 以 JSON 文本帧推送给客户端。
//! 顾客只收到自己订单的事件，管理员收到全部。投递尽力而为，慢连接会跳过积压的事件。

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use futures::{SinkExt, StreamExt};
use shared::message::BusMessage;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::CurrentUser;
use crate::core::ServerState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/v1/events", get(handle_events_ws))
}

pub async fn handle_events_ws(
    State(state): State<ServerState>,
    user: CurrentUser,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| events_session(socket, state, user))
}

async fn events_session(socket: WebSocket, state: ServerState, user: CurrentUser) {
    let (mut sink, mut stream) = socket.split();
    let mut bus_rx = state.message_bus().subscribe();

    tracing::info!(user_id = %user.user_id, admin = user.is_admin(), "Events WS connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = bus_rx.recv() => {
                match event {
                    Ok(msg) => {
                        if msg.is_visible_to(&user.user_id, user.is_admin())
                            && send_message(&mut sink, &msg).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(user_id = %user.user_id, lagged = n, "Events subscriber lagged, skipping");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(user_id = %user.user_id, "Events WS disconnected");
}

async fn send_message<S>(sink: &mut S, msg: &BusMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize bus message");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
