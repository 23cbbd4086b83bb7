pub mod preprocessing;
pub mod detection;
pub mod extraction;
pub mod reference;

pub use preprocessing::*;
pub use detection::*;
pub use extraction::*;
pub use reference::*;
