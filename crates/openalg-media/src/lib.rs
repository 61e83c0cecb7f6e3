//! Media collaborators for the scene engine
//!
//! This crate handles:
//! - The video decoder interface the scheduler drives
//! - 8-bit indexed surfaces and palettes
//! - Raw PCM sound cues

mod clip;
mod decoder;
mod surface;

pub use clip::SoundClip;
pub use decoder::{BlankDecoder, ReadSeek, VideoDecoder};
pub use surface::{Palette, Surface};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to read media stream: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to decode video: {0}")]
    VideoDecodeError(String),

    #[error("No stream bound to decoder")]
    NoStream,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;
