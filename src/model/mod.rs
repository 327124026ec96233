pub mod command;
pub mod history;
pub mod keys;
pub mod machine;
pub mod tab;
pub mod title;

pub use command::{Command, InboundMessage, ParseCommandError};
pub use history::TabHistory;
pub use tab::{LoadStatus, Tab, TabChange, TabId, TabQuery, TabUpdate, Timestamp};
