pub mod indicators;
pub mod statistics;


pub use indicators::*;
pub use statistics::*;
