pub mod presence;
pub mod profile;
pub mod user;
