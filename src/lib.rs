//! Core library for the todo tracker
//!
//! - `models`: the task record and its validation rules
//! - `db`: SQLite persistence
//! - `repository`: cached task list backed by a store
//! - `query` / `overdue`: filtering, sorting and overdue detection for display

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod overdue;
pub mod query;
pub mod repository;
pub mod state;

pub use error::{Error, ValidationError};
pub type Result<T> = std::result::Result<T, Error>;
