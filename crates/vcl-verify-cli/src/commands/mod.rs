pub mod format;
pub mod verify;
