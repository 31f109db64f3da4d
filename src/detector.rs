//! Landmark detection backends.

use std::{
    io::{BufRead, BufReader, BufWriter, Write},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use anyhow::{bail, Context, Result};
use log::{debug, warn};

use crate::{
    config::{DetectorConfig, DetectorSettings},
    frame::{Frame, FrameSize},
    landmark::RawDetection,
};

/// Finds hand and pose landmarks in a frame.
pub trait LandmarkDetector<F> {
    fn detect(&mut self, frame: &F) -> Result<RawDetection>;
}

impl<F, D: LandmarkDetector<F> + ?Sized> LandmarkDetector<F> for &mut D {
    fn detect(&mut self, frame: &F) -> Result<RawDetection> {
        (**self).detect(frame)
    }
}

/// Frames that can be shipped to an out-of-process detector.
pub trait EncodeJpeg {
    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>>;
}

/// A detector hosted by a child process.
///
/// The child receives a JSON handshake line with the [`DetectorSettings`], then for every frame a
/// 12-byte little-endian `(width, height, len)` header followed by `len` bytes of JPEG. It
/// answers each frame with one line of JSON holding a [`RawDetection`].
pub struct ProcessDetector {
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: BufReader<ChildStdout>,
    jpeg_quality: u8,
    line: String,
}

impl ProcessDetector {
    pub fn spawn(config: &DetectorConfig) -> Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("starting landmark detector {:?}", config.command))?;

        let stdin = child.stdin.take().context("detector stdin is not piped")?;
        let stdout = child.stdout.take().context("detector stdout is not piped")?;

        let mut stdin = BufWriter::new(stdin);
        write_handshake(&mut stdin, &config.settings).context("sending detector settings")?;
        debug!("started landmark detector {:?} (pid {})", config.command, child.id());

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            jpeg_quality: config.jpeg_quality,
            line: String::new(),
        })
    }
}

impl<F: Frame + EncodeJpeg> LandmarkDetector<F> for ProcessDetector {
    fn detect(&mut self, frame: &F) -> Result<RawDetection> {
        let jpeg = frame.encode_jpeg(self.jpeg_quality)?;
        let stdin = self.stdin.as_mut().context("detector has been shut down")?;

        write_frame(stdin, frame.size(), &jpeg).context("sending frame to detector")?;
        read_detection(&mut self.stdout, &mut self.line).context("reading detector response")
    }
}

impl Drop for ProcessDetector {
    fn drop(&mut self) {
        // Closing stdin tells the child to exit.
        drop(self.stdin.take());

        match self.child.wait() {
            Ok(status) if !status.success() => warn!("landmark detector exited with {}", status),
            Ok(_) => {}
            Err(err) => warn!("failed to wait for landmark detector: {}", err),
        }
    }
}

pub fn write_handshake<W: Write>(writer: &mut W, settings: &DetectorSettings) -> Result<()> {
    serde_json::to_writer(&mut *writer, settings)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_frame<W: Write>(writer: &mut W, size: FrameSize, jpeg: &[u8]) -> Result<()> {
    let len = u32::try_from(jpeg.len()).context("encoded frame is too large")?;

    writer.write_all(&size.width.to_le_bytes())?;
    writer.write_all(&size.height.to_le_bytes())?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(jpeg)?;
    writer.flush()?;
    Ok(())
}

/// Reads one JSON line into `line` and parses it.
pub fn read_detection<R: BufRead>(reader: &mut R, line: &mut String) -> Result<RawDetection> {
    line.clear();
    if reader.read_line(line)? == 0 {
        bail!("landmark detector closed its output");
    }

    serde_json::from_str(line.trim_end())
        .with_context(|| format!("invalid detector response {:?}", line.trim_end()))
}
