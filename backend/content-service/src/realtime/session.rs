//! WebSocket session for one viewer
//!
//! Forwards hub events as JSON text frames, pings on a fixed interval and
//! drops clients that stay silent past the timeout. Inbound text is ignored:
//! the channel is push-only.

use actix::prelude::*;
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use super::{ConnectionId, DomainEvent, EventHub, Subscription};

pub struct ViewerSession {
    viewer: Uuid,
    connection_id: ConnectionId,
    receiver: Option<UnboundedReceiver<Arc<DomainEvent>>>,
    hub: Arc<EventHub>,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    last_heartbeat: Instant,
}

impl ViewerSession {
    pub fn new(
        viewer: Uuid,
        subscription: Subscription,
        hub: Arc<EventHub>,
        heartbeat_interval: Duration,
        client_timeout: Duration,
    ) -> Self {
        Self {
            viewer,
            connection_id: subscription.connection_id,
            receiver: Some(subscription.receiver),
            hub,
            heartbeat_interval,
            client_timeout,
            last_heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.client_timeout {
                tracing::debug!(
                    viewer = %act.viewer,
                    connection_id = %act.connection_id,
                    "Viewer heartbeat timed out"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for ViewerSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!(
            viewer = %self.viewer,
            connection_id = %self.connection_id,
            "Viewer session started"
        );

        self.start_heartbeat(ctx);

        if let Some(receiver) = self.receiver.take() {
            let events = futures::stream::unfold(receiver, |mut rx| async move {
                rx.recv().await.map(|event| (event, rx))
            });
            ctx.add_stream(events);
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!(
            viewer = %self.viewer,
            connection_id = %self.connection_id,
            "Viewer session stopped"
        );

        let hub = self.hub.clone();
        let connection_id = self.connection_id;
        actix_rt::spawn(async move {
            hub.unsubscribe(connection_id).await;
        });
    }
}

/// Events from the hub. The stream ends when the hub drops this connection.
impl StreamHandler<Arc<DomainEvent>> for ViewerSession {
    fn handle(&mut self, event: Arc<DomainEvent>, ctx: &mut Self::Context) {
        match serde_json::to_string(event.as_ref()) {
            Ok(json) => ctx.text(json),
            Err(e) => tracing::warn!(kind = event.kind(), "Failed to serialize event: {}", e),
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Away,
            description: Some("event stream closed".to_string()),
        }));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ViewerSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(bytes)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&bytes);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(viewer = %self.viewer, "WebSocket protocol error: {}", e);
                ctx.stop();
            }
        }
    }
}
