pub mod correlation;
pub mod indicators;


pub use correlation::*;
pub use indicators::*;
