pub mod arbiter;
pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod types;


pub use arbiter::*;
pub use graph::*;
pub use plan::*;
pub use scheduler::*;
pub use types::*;
