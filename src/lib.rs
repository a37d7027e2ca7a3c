#![allow(clippy::too_many_arguments, clippy::type_complexity)]

pub mod error;
pub mod validation;
pub mod config;
pub mod auth;
pub mod model;
pub mod db;
pub mod ops;
pub mod queries;
pub mod migrate;
pub mod cli;
