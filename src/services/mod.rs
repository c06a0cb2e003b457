pub mod api;
pub mod debounce;
pub mod download;
pub mod file_list;
pub mod filter_panel;
pub mod upload;

pub use api::*;
pub use debounce::*;
pub use file_list::*;
pub use filter_panel::*;
pub use upload::*;
