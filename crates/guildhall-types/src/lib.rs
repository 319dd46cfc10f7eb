pub mod api;
pub mod rank;
pub mod status;
