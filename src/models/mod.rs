pub mod api;
pub mod task;


pub use api::*;
pub use task::*;
