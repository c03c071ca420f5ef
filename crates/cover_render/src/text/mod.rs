pub mod block;
pub mod fit;
pub mod font;
pub mod vertical;
pub mod wrap;
