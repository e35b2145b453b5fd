pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod state;
pub mod utils;
pub mod workspace;
