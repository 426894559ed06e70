pub mod api;
pub mod chat;
pub mod controller;
pub mod http;
pub mod push;
pub mod report;
pub mod store;
