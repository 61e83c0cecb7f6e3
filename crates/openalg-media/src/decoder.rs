//! Video decoder interface
//!
//! The scene engine never parses video bytes itself. It binds the archive
//! stream once, asks for a segment by byte offset, and then steps frames.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

use crate::{MediaError, Palette, Result, SoundClip, Surface};

/// Object-safe `Read + Seek`
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

pub trait VideoDecoder {
    /// Bind the container stream that holds every scene segment
    fn set_stream(&mut self, stream: Box<dyn ReadSeek>);

    /// Start decoding the segment at `offset`; resets the frame counter to 0
    fn load_video_from_stream(&mut self, offset: u32) -> Result<()>;

    fn video_frame(&self) -> &Surface;

    /// Mutable access so feedback (bullet holes) can be drawn into the frame
    fn video_frame_mut(&mut self) -> &mut Surface;

    /// Index of the frame currently shown; 0 before the first decode
    fn current_frame(&self) -> u32;

    fn next_frame(&mut self) -> Result<()>;

    /// Soundtrack for the loaded segment, if it has one
    fn audio_stream(&mut self) -> Option<SoundClip>;

    /// True once after the palette changed
    fn is_palette_dirty(&mut self) -> bool;

    fn palette(&self) -> &Palette;
}

/// Frame clock without a codec.
///
/// Validates each segment's length prefix and counts frames. Frames are
/// blank, so this drives headless runs and tests.
pub struct BlankDecoder {
    stream: Option<Box<dyn ReadSeek>>,
    frame: Surface,
    palette: Palette,
    current: u32,
    segment_len: u32,
    palette_dirty: bool,
}

impl BlankDecoder {
    pub fn new(width: u16, height: u16) -> Self {
        BlankDecoder {
            stream: None,
            frame: Surface::new(width, height),
            palette: Palette::default(),
            current: 0,
            segment_len: 0,
            palette_dirty: false,
        }
    }

    /// Byte length of the loaded segment
    pub fn segment_len(&self) -> u32 {
        self.segment_len
    }
}

impl VideoDecoder for BlankDecoder {
    fn set_stream(&mut self, stream: Box<dyn ReadSeek>) {
        self.stream = Some(stream);
    }

    fn load_video_from_stream(&mut self, offset: u32) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(MediaError::NoStream)?;
        stream.seek(SeekFrom::Start(offset as u64))?;
        self.segment_len = stream.read_u32::<LittleEndian>().map_err(|e| {
            MediaError::VideoDecodeError(format!("segment at {:#x}: {}", offset, e))
        })?;
        tracing::trace!(
            "Blank decoder bound segment at {:#x} ({} bytes)",
            offset,
            self.segment_len
        );
        self.current = 0;
        self.frame.fill(0);
        self.palette_dirty = true;
        Ok(())
    }

    fn video_frame(&self) -> &Surface {
        &self.frame
    }

    fn video_frame_mut(&mut self) -> &mut Surface {
        &mut self.frame
    }

    fn current_frame(&self) -> u32 {
        self.current
    }

    fn next_frame(&mut self) -> Result<()> {
        self.current += 1;
        self.frame.fill(0);
        Ok(())
    }

    fn audio_stream(&mut self) -> Option<SoundClip> {
        None
    }

    fn is_palette_dirty(&mut self) -> bool {
        std::mem::take(&mut self.palette_dirty)
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }
}
