use crate::core::events::SessionEvent;
use crate::error::Result;
use crate::message::{Identity, OutboundMessage};
use async_trait::async_trait;

/// What the dispatcher and commands need from a session
///
/// Implemented by `ConnectionSession`; tests substitute a recording fake.
#[async_trait]
pub trait SessionHandle: Send + Sync + 'static {
    /// Send through the rate limiter and the serialized writer
    async fn send(&self, message: OutboundMessage) -> Result<()>;

    /// Identity assigned by the endpoint, if any
    fn identity(&self) -> Option<Identity>;

    /// Store the identity unless one is already assigned.
    /// Returns true when this call assigned it.
    fn assign_identity(&self, identity: Identity) -> bool;

    /// Publish an observation to whoever watches the session
    fn observe(&self, _event: SessionEvent) {}
}
