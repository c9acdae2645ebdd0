pub mod core;
pub mod identity;
pub mod records;
pub mod setup;
