pub mod actions;
pub mod config;
pub mod error;
pub mod form;
pub mod ids;
pub mod model;
pub mod storage;
