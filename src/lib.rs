pub mod api;
pub mod availability;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
