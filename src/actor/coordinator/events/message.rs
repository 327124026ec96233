use tracing::trace;

use crate::actor::coordinator::Coordinator;
use crate::model::InboundMessage;

pub struct MessageEventHandler;

impl MessageEventHandler {
    pub fn handle_message(coordinator: &mut Coordinator, message: InboundMessage) {
        match message {
            InboundMessage::MouseEnter => coordinator.on_mouse_enter(),
            InboundMessage::MouseLeave => coordinator.on_mouse_leave(),
            InboundMessage::CancelPickMode => {
                if coordinator.machines.pick_mode.is_active() {
                    coordinator.end_pick_mode();
                } else {
                    trace!("cancel for a pick session that already ended");
                }
            }
            InboundMessage::PickKey { key, shift_key } => coordinator.on_pick_key(&key, shift_key),
        }
    }
}
