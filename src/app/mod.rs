pub mod app;
pub mod state;

pub use app::{build_router, App};
pub use state::{AppState, Repositories};
