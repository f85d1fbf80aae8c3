pub mod bootstrap;
pub mod config;
pub mod console;
pub mod dto;
pub mod entity;
pub mod error;
pub mod maintenance;

pub use bootstrap::{connect, init_tracing, load_dotenv};
pub use config::{Config, ConfigError};
pub use error::{MaintenanceError, MaintenanceResult};
