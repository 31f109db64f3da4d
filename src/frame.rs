use anyhow::Result;

/// Pixel dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Resolution every frame is resized to before detection and normalization.
///
/// The frame size enters the normalization formula directly, so the batch and live paths must
/// both go through this value.
pub const TARGET_RESOLUTION: FrameSize = FrameSize::new(640, 480);

/// A decoded 3-channel image.
pub trait Frame: Sized {
    fn size(&self) -> FrameSize;

    fn resized(&self, size: FrameSize) -> Result<Self>;
}

/// A stream of frames, read front to back (cameras, or videos without seeking).
pub trait FrameReader {
    type Frame: Frame;

    /// Reads the next frame. `Ok(None)` marks the end of the stream or a failed read.
    fn read_next(&mut self) -> Result<Option<Self::Frame>>;
}

/// A seekable frame source such as a video file.
pub trait VideoSource: FrameReader {
    /// Number of frames reported by the container. `0` if unknown.
    fn frame_count(&self) -> usize;

    /// Reads the frame at `index`. `Ok(None)` if the frame cannot be decoded.
    fn read_at(&mut self, index: usize) -> Result<Option<Self::Frame>>;
}
