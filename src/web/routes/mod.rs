pub mod auth;
pub mod avatar;
pub mod directory;
pub mod health;
pub mod landing;
pub mod map;
pub mod profile;
