use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("No source image was given")]
    MissingSource,
    #[error("No requested icon size is between 1 and {}px", crate::MAX_ICON_SIZE)]
    NoValidIconSize,
    #[error("Image ({width} × {height}) is smaller than the smallest icon size ({smallest}px)")]
    SourceTooSmall {
        width: u32,
        height: u32,
        smallest: u32,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
