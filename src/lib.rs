pub mod api;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod images;
pub mod storage;

pub use domain::*;
pub use storage::Repository;
