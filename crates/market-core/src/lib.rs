pub mod error;
pub mod indices;
pub mod traits;
pub mod types;

pub use error::*;
pub use indices::*;
pub use traits::*;
pub use types::*;
