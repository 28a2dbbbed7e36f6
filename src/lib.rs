pub mod bot;
pub mod config;
pub mod economy;
pub mod filtering;
pub mod handlers;
pub mod localization;
pub mod models;
pub mod payments;
pub mod storage;
pub mod user_session;
pub mod utils;
