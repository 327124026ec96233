pub mod command;
pub mod message;
pub mod reply;
pub mod settings;
pub mod tab;
pub mod timer;
