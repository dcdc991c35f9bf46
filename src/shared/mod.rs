pub mod config;
pub mod error;
pub mod logging;
pub mod password;
pub mod validation;
