pub mod calendar;
pub mod mysql;
pub mod service;
pub mod store;
