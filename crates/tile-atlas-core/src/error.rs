use thiserror::Error;

use crate::grid::GridError;

#[derive(Debug, Error)]
pub enum TileAtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid dimensions {width}x{height}: both sides must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Nothing to pack")]
    Empty,
    #[error("{items} item(s) do not fit in the largest allowed canvas ({max_size}x{max_size})")]
    CanvasLimitExceeded { max_size: u32, items: usize },
    #[error("Palette overflow: more than {max} distinct colors")]
    PaletteOverflow { max: usize },
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
    #[error("Encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, TileAtlasError>;
