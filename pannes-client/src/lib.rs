pub mod db;
pub mod domain;
pub mod error;
pub mod rest;

pub use error::ClientError;
