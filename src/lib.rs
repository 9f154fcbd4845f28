pub mod api;
pub mod config;
pub mod db;
pub mod estimate;
pub mod import;
pub mod models;
pub mod render;
pub mod tree;
pub mod workspace;
