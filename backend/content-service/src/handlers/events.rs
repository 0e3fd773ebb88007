use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::sync::Arc;

use crate::config::RealtimeConfig;
use crate::middleware::UserId;
use crate::realtime::{EventHub, ViewerSession};

/// Upgrade to a WebSocket that streams domain events to this viewer
pub async fn events_ws(
    req: HttpRequest,
    payload: web::Payload,
    user_id: UserId,
    hub: web::Data<EventHub>,
    settings: web::Data<RealtimeConfig>,
) -> actix_web::Result<HttpResponse> {
    let hub: Arc<EventHub> = hub.into_inner();
    let subscription = hub.subscribe(Some(user_id.0)).await;
    let connection_id = subscription.connection_id;

    let session = ViewerSession::new(
        user_id.0,
        subscription,
        hub.clone(),
        settings.heartbeat_interval(),
        settings.client_timeout(),
    );

    match ws::start(session, &req, payload) {
        Ok(response) => Ok(response),
        Err(e) => {
            // Handshake failed; the session actor never started
            hub.unsubscribe(connection_id).await;
            Err(e)
        }
    }
}
