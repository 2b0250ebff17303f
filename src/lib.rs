pub mod config;
pub mod layout;
pub mod pipeline;
pub mod source;
pub mod sprite;
pub mod webp;

// Curated re-exports
pub use config::{FailurePolicy, SpriteFormat, SpritesConfig};
pub use layout::{compute_layout, place_tile, Layout, LayoutError, Placement};
pub use source::{SourceEntry, Tile};
pub use sprite::SpriteManifest;
