pub mod alerts;
pub mod projection;
pub mod status;
pub mod summary;

pub use alerts::*;
pub use projection::*;
pub use status::*;
pub use summary::*;
