mod interface;
mod lock;

pub use interface::*;
pub use lock::*;
