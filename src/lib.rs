// Library exports for the Warden supervisor

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod process;
pub mod release;
pub mod supervisor;
pub mod version;
