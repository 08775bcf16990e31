pub mod directory_row;
pub mod privacy;
pub mod profile_point;
pub mod profiles;
pub mod session;

pub use directory_row::DirectoryRow;
pub use privacy::Privacy;
pub use profile_point::ProfilePoint;
pub use profiles::{ProfileLink, ProfileRecord, ProfileUpdate};
pub use session::SessionRow;
