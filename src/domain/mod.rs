pub mod command;
pub mod key;
pub mod ports;
