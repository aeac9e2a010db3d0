pub mod presence_store;
pub mod user_store;
