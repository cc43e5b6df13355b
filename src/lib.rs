//! Headless front end for the command engine: server configuration, command
//! scripts and a console session that runs them.

pub mod command_script;
pub mod config;
pub mod console;
