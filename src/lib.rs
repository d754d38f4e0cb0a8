pub mod archive;
pub mod commands;
pub mod installer;
pub mod package;
pub mod registry;
pub mod retry;
pub mod runtime;
