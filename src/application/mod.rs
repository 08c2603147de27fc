//! Application services layer.

pub mod auth;
pub mod board;
pub mod error;
pub mod repos;
