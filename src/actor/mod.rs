//! Actors talk to each other over unbounded channels. Every message carries
//! the span that was current when it was sent, and the receiving actor enters
//! that span while handling it, so logs stay attributed to their cause.

pub mod coordinator;
pub mod host_bridge;
pub mod timer;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tracing::Span;

pub struct Sender<Event>(mpsc::UnboundedSender<(Span, Event)>);

pub type Receiver<Event> = mpsc::UnboundedReceiver<(Span, Event)>;

pub fn channel<Event>() -> (Sender<Event>, Receiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), rx)
}

impl<Event> Sender<Event> {
    /// Sends an event, dropping it if the receiving actor has shut down.
    pub fn send(&self, event: Event) { _ = self.try_send(event); }

    pub fn try_send(&self, event: Event) -> Result<(), SendError<(Span, Event)>> {
        self.0.send((Span::current(), event))
    }

    pub fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl<Event> Clone for Sender<Event> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Event> std::fmt::Debug for Sender<Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender").field("closed", &self.0.is_closed()).finish()
    }
}
