pub mod config;
pub mod device;
pub mod locale;
