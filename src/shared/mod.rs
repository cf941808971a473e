pub mod deadline;
pub mod errors;
pub mod pagination;
pub mod shutdown;

pub use deadline::*;
pub use errors::*;
pub use pagination::*;
pub use shutdown::*;
