pub mod args;
pub mod common;
pub mod deploy;
pub mod info;
pub mod verify;
