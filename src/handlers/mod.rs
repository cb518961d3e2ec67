// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (Firebase ID token)
pub mod protected;
pub mod public;

pub use protected::*;
pub use public::*;
