pub mod clock;
pub mod host;
pub mod memory_host;
pub mod store;
