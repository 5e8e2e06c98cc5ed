pub mod database;
pub mod settings;

pub use database::*;
pub use settings::*;
