//! sqlx query layer, one module per table family.

pub mod carts;
pub mod daily;
pub mod pageviews;
pub mod sessions;
pub mod stats;
pub mod visitors;
