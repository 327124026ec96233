use serde::{Deserialize, Serialize};

/// Whether the pointer is over the page surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseTracker {
    #[default]
    Outside,
    Inside,
}

impl MouseTracker {
    pub fn enter(self) -> Self { MouseTracker::Inside }

    pub fn leave(self) -> Self { MouseTracker::Outside }

    pub fn is_inside(self) -> bool { self == MouseTracker::Inside }
}
