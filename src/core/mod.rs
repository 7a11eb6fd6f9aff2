pub mod analysis;
pub mod location;
pub mod objects;
pub mod satellite;
pub mod scenario;
pub mod session;

pub use crate::domain::model::{OperationResult, StkObject};
pub use crate::domain::ports::StkRoot;
pub use crate::utils::error::Result;
pub use session::{ConnectionState, Lifecycle, StkLifespan};
