pub mod profile_repo;
pub mod profile_repository;
pub mod schema;
pub mod session_repo;

pub use profile_repo::ProfileFilter;
pub use profile_repository::{ProfileRepository, SqliteProfileRepository};

#[cfg(test)]
pub mod memory_repository;
