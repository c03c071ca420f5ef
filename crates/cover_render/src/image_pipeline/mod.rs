pub mod adjust;
pub mod loader;
pub mod palette;
pub mod resize;
