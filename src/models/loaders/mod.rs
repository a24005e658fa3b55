pub mod image_loader;
pub mod toml_loader;

pub use image_loader::load_template_image;
pub use toml_loader::{load_deck_from_toml, parse_deck};
