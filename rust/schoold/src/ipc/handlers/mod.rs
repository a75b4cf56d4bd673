pub mod calendar;
pub mod core;
pub mod routine;
pub mod selection;
pub mod session;
pub mod setup;
