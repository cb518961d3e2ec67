// handlers/public/mod.rs - Handlers without authentication

pub mod health;

pub use health::health;
