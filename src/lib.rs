pub mod app_config;
pub mod device;
pub mod domain;
pub mod light;
