pub mod artifact;
pub mod features;
pub mod interpreter;
pub mod predictor;
pub mod registry;

pub use artifact::*;
pub use features::*;
pub use interpreter::*;
pub use predictor::*;
pub use registry::*;
