//! Destructible walls on tile edges
//!
//! Walls block movement across an edge until breached. Same-owner walls that
//! touch form formations and pool bonus health.

pub mod edge;
pub mod store;

pub use edge::WallEdge;
pub use store::{Wall, WallHit, WallRules, WallStore};
