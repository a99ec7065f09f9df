pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod ordering;
pub mod push;
pub mod reminder;
pub mod storage;
pub mod store;
