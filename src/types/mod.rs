pub mod chart;
pub mod levels;
pub mod mtf;
pub mod patterns;

pub use chart::*;
pub use levels::*;
pub use mtf::*;
pub use patterns::*;
