pub mod image_access;

pub use image_access::*;
