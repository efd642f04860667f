pub mod login;
pub mod register;
pub mod session;
pub mod settings;
