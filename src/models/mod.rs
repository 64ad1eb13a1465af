pub mod history;
pub mod image;

pub use history::*;
pub use image::*;
