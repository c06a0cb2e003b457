pub mod file;
pub mod filters;

pub use file::*;
pub use filters::*;
