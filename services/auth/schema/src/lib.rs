//! sea-orm entities owned by the auth service.

pub mod reg_keys;
pub mod roles;
pub mod settings;
pub mod users;
pub mod verify_records;
