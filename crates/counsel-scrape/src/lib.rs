pub mod delay;
pub mod directory;
pub mod expertise;
pub mod records;

pub use directory::DirectoryClient;
pub use expertise::{ExpertiseChecker, ExpertiseReport};
pub use records::{ExpertiseRow, Listing};
