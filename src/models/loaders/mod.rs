pub mod toml_loader;

pub use toml_loader::{load_paper_toml, save_paper_toml};
