//! Types shared between the auth service (which signs session tokens) and the
//! gateway (which validates them and injects identity headers).

pub mod identity;
pub mod token;
