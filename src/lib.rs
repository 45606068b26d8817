pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod mutations;
pub mod outcome;
pub mod queries;
pub mod router;
pub mod schema;
pub mod settings;
pub mod views;

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

pub use crate::db::Database;
pub use crate::error::Error;
pub use crate::router::{router, AppState};
pub use crate::settings::Settings;
