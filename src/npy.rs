//! Minimal NumPy `.npy` (format version 1.0) reading and writing for 2-D `f32` arrays.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{bail, Context, Result};
use ndarray::Array2;

const MAGIC: &[u8] = b"\x93NUMPY";
const PREAMBLE_LEN: usize = MAGIC.len() + 2 + 2;
const HEADER_ALIGN: usize = 64;

/// Writes `array` as a little-endian `f32` array in C order.
pub fn write_npy(path: impl AsRef<Path>, array: &Array2<f32>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_npy_to(&mut writer, array)?;
    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))
}

pub fn write_npy_to<W: Write>(writer: &mut W, array: &Array2<f32>) -> Result<()> {
    let (rows, cols) = array.dim();
    let mut header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
        rows, cols
    );

    // The header, including its trailing newline, pads the preamble out to a multiple of 64.
    let unpadded = PREAMBLE_LEN + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&(header.len() as u16).to_le_bytes())?;
    writer.write_all(header.as_bytes())?;

    for value in array.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }

    Ok(())
}

pub fn read_npy(path: impl AsRef<Path>) -> Result<Array2<f32>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    read_npy_from(&mut BufReader::new(file)).with_context(|| format!("reading {}", path.display()))
}

pub fn read_npy_from<R: Read>(reader: &mut R) -> Result<Array2<f32>> {
    let mut preamble = [0u8; PREAMBLE_LEN];
    reader.read_exact(&mut preamble)?;

    if &preamble[..MAGIC.len()] != MAGIC {
        bail!("missing \\x93NUMPY magic bytes");
    }
    if preamble[6] != 1 {
        bail!("unsupported npy version {}.{}", preamble[6], preamble[7]);
    }

    let header_len = u16::from_le_bytes([preamble[8], preamble[9]]) as usize;
    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header).context("npy header is not UTF-8")?;

    if !header.contains("'descr': '<f4'") {
        bail!("unsupported dtype in header {:?}", header.trim());
    }
    if !header.contains("'fortran_order': False") {
        bail!("fortran-ordered arrays are not supported");
    }

    let (rows, cols) = parse_shape(&header)?;

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() != rows * cols * 4 {
        bail!(
            "expected {} bytes of data for shape ({}, {}), found {}",
            rows * cols * 4,
            rows,
            cols,
            bytes.len()
        );
    }

    let data: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(Array2::from_shape_vec((rows, cols), data)?)
}

fn parse_shape(header: &str) -> Result<(usize, usize)> {
    const KEY: &str = "'shape': (";

    let start = header.find(KEY).context("npy header has no shape")? + KEY.len();
    let end = start + header[start..].find(')').context("unterminated shape")?;

    let dims = header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(str::parse::<usize>)
        .collect::<Result<Vec<_>, _>>()
        .context("invalid shape")?;

    match dims.as_slice() {
        [rows, cols] => Ok((*rows, *cols)),
        _ => bail!("expected a 2-D array, found shape {:?}", dims),
    }
}
