pub mod config;
pub mod install;

pub use config::{ConfigOverrides, InstallConfig};
pub use install::install;
