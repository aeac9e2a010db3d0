pub mod core;
pub mod handlers;
pub mod media;
pub mod models;
pub mod services;
pub mod stores;
pub mod utils;
pub mod validation;
