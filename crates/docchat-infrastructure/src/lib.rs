pub mod config_service;
mod dto;
pub mod http_backend;
pub mod paths;

pub use config_service::ConfigService;
pub use http_backend::HttpSessionBackend;
pub use paths::DocchatPaths;
