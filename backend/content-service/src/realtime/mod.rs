//! Realtime viewer channel
//!
//! Mutations publish [`DomainEvent`]s to the [`EventHub`]; each connected
//! viewer is a [`ViewerSession`] draining its own subscription.

mod events;
mod hub;
mod session;

pub use events::DomainEvent;
pub use hub::{ConnectionId, EventHub, Subscription};
pub use session::ViewerSession;
