pub mod cli;
pub mod config;
pub mod convert;
pub mod ico;
pub mod prepare;
