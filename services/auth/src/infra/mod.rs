pub mod cache;
pub mod challenge;
pub mod db;
pub mod password;
