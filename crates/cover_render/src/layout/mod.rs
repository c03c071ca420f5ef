pub mod geometry;
pub mod stickers;
pub mod tracklist;
