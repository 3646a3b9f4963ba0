pub mod config;
pub mod logs;
pub mod suggest;
pub mod system;
