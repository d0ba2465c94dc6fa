pub mod data;
pub mod handler;
pub mod routes;
pub mod serve;
pub mod state;

pub use state::AppState;
