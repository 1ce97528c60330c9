pub mod medical;
pub mod prediction;
pub mod user;

pub use medical::*;
pub use prediction::*;
pub use user::*;
