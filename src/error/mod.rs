mod types;

pub use types::{HubError, Result};
