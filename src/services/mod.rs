pub mod avatar_service;
pub mod birthday_service;
pub mod cache_service;
pub mod directory_service;
pub mod geo_service;
pub mod map_service;
pub mod privacy_service;
pub mod profile_service;
pub mod session_service;
pub mod spread_service;
