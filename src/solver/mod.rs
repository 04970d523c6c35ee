mod electives;
mod hierarchical;
mod model;

pub use electives::*;
pub use hierarchical::*;
pub use model::*;
