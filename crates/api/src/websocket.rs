use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
pub struct LogStreamQuery {
    pub host: String,
    pub container: String,
    #[serde(default = "default_tail")]
    pub tail: String,
}

fn default_tail() -> String {
    "100".to_string()
}

pub async fn logs_ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<LogStreamQuery>,
    State(state): State<AppState>,
) -> Response {
    info!(
        "Log stream requested for {}/{}",
        query.host, query.container
    );
    ws.on_upgrade(move |socket| stream_logs(socket, query, state))
}

#[instrument(skip(socket, state), fields(host = %query.host, container = %query.container))]
async fn stream_logs(mut socket: WebSocket, query: LogStreamQuery, state: AppState) {
    let host = match state.registry.get_host(&query.host).await {
        Ok(host) => host,
        Err(e) => {
            let _ = socket.send(Message::Text(format!("error: {}", e))).await;
            return;
        }
    };

    let mut rx = match state
        .engine
        .follow_logs(&host, &query.container, &query.tail)
        .await
    {
        Ok(rx) => rx,
        Err(e) => {
            let _ = socket.send(Message::Text(format!("error: {}", e))).await;
            return;
        }
    };

    loop {
        tokio::select! {
            chunk = rx.recv() => match chunk {
                Some(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                // Dropping the receiver tears down the backend reader.
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    info!("Log stream ended for {}/{}", query.host, query.container);
}
