pub mod create;
pub mod me;


// Re-export handler functions for use in routing
pub use create::create as user_create;
pub use me::credit as user_credit;
pub use me::me as user_me;
