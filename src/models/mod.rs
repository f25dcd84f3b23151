pub mod loan;
pub mod settings;

pub use loan::*;
pub use settings::*;
