use crate::actor::coordinator::Coordinator;
use crate::model::machine::{TimerHandle, TimerKind};

pub struct TimerEventHandler;

impl TimerEventHandler {
    pub fn handle_timer_fired(coordinator: &mut Coordinator, handle: TimerHandle, kind: TimerKind) {
        match kind {
            TimerKind::MoveTimer => coordinator.on_move_timer_fired(handle),
            TimerKind::ActiveDelay => coordinator.on_active_delay_fired(handle),
            TimerKind::PickTimeout => coordinator.on_pick_timeout(handle),
            TimerKind::CycleTimeout => coordinator.on_cycle_timeout(handle),
            TimerKind::CountdownTick => coordinator.on_countdown_tick(handle),
        }
    }
}
