pub mod config;
pub mod outfits;
pub mod rotation;
