pub mod history;
pub mod status;
pub mod verify;
