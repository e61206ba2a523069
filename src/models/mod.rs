pub mod prediction;
pub mod profile;
pub mod user;

pub use prediction::*;
pub use profile::*;
pub use user::*;
