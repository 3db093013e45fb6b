//! Pure tracking logic: no I/O, no clock reads, deterministic.

pub mod bot;
pub mod cart;
pub mod event;
pub mod identity;
pub mod ua;

pub use event::{TrackingEvent, TrackingRequest};
pub use ua::UaProfile;
