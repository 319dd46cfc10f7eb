pub mod auth;
pub mod clubs;
pub mod error;
pub mod middleware;
pub mod points;
pub mod submissions;
