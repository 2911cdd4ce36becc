use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tempfile::NamedTempFile;

use crate::{BeatshiftError, Format, Result};

/// A decoded WAV file with its samples kept as raw interleaved bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Container spec, reused when the replacement payload is encoded.
    pub spec: WavSpec,
    pub format: Format,
    /// Little-endian sample bytes; 8-bit audio is stored unsigned.
    pub samples: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Unsigned8,
    Int16,
    Int24,
    Int32,
    Float32,
}

impl Encoding {
    fn from_spec(spec: &WavSpec) -> Result<Self> {
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 8) => Ok(Self::Unsigned8),
            (SampleFormat::Int, 16) => Ok(Self::Int16),
            (SampleFormat::Int, 24) => Ok(Self::Int24),
            (SampleFormat::Int, 32) => Ok(Self::Int32),
            (SampleFormat::Float, 32) => Ok(Self::Float32),
            (format, bits) => Err(BeatshiftError::invalid_format(format!(
                "unsupported sample layout: {format:?} with {bits} bits"
            ))),
        }
    }

    fn width(self) -> usize {
        match self {
            Self::Unsigned8 => 1,
            Self::Int16 => 2,
            Self::Int24 => 3,
            Self::Int32 | Self::Float32 => 4,
        }
    }
}

/// Decodes a WAV stream into its raw sample payload.
pub fn decode<R: Read>(source: R) -> Result<DecodedAudio> {
    let mut reader = WavReader::new(source)?;
    let spec = reader.spec();
    let encoding = Encoding::from_spec(&spec)?;
    let block_align = u32::from(spec.channels) * encoding.width() as u32;
    let format = Format::new(spec.sample_rate, block_align)?;

    let mut samples = Vec::with_capacity(reader.len() as usize * encoding.width());
    match encoding {
        Encoding::Unsigned8 => {
            for sample in reader.samples::<i8>() {
                samples.push((sample? as u8).wrapping_add(128));
            }
        }
        Encoding::Int16 => {
            for sample in reader.samples::<i16>() {
                samples.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        Encoding::Int24 => {
            for sample in reader.samples::<i32>() {
                samples.extend_from_slice(&sample?.to_le_bytes()[..3]);
            }
        }
        Encoding::Int32 => {
            for sample in reader.samples::<i32>() {
                samples.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        Encoding::Float32 => {
            for sample in reader.samples::<f32>() {
                samples.extend_from_slice(&sample?.to_le_bytes());
            }
        }
    }

    tracing::debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        bytes = samples.len(),
        "decoded wav payload"
    );

    Ok(DecodedAudio {
        spec,
        format,
        samples,
    })
}

/// Reads and decodes a WAV file. Unreadable input is a configuration error.
pub fn read_file(path: &Path) -> Result<DecodedAudio> {
    let file = File::open(path).map_err(|err| {
        BeatshiftError::config(format!("cannot read input '{}': {err}", path.display()))
    })?;
    decode(BufReader::new(file))
}

/// Encodes `samples` with the layout described by `spec`.
///
/// Bytes that do not complete a sample frame are dropped.
pub fn encode<W: Write + Seek>(sink: W, spec: WavSpec, samples: &[u8]) -> Result<()> {
    let encoding = Encoding::from_spec(&spec)?;
    let frame = encoding.width() * usize::from(spec.channels.max(1));
    let whole = samples.len() - samples.len() % frame;
    let mut writer = WavWriter::new(sink, spec)?;

    for chunk in samples[..whole].chunks_exact(encoding.width()) {
        match encoding {
            Encoding::Unsigned8 => writer.write_sample(chunk[0].wrapping_sub(128) as i8)?,
            Encoding::Int16 => writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?,
            Encoding::Int24 => {
                let sign = if chunk[2] & 0x80 != 0 { 0xff } else { 0x00 };
                writer.write_sample(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], sign]))?
            }
            Encoding::Int32 => {
                writer.write_sample(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))?
            }
            Encoding::Float32 => {
                writer.write_sample(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))?
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Encodes `samples` into a WAV file at `path`.
///
/// The file is encoded next to `path` and renamed into place once complete,
/// so a failed encode never leaves a partial file at `path`.
pub fn write_file(path: &Path, spec: WavSpec, samples: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut sink = BufWriter::new(staged.as_file_mut());
        encode(&mut sink, spec, samples)?;
        sink.flush()?;
    }
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}
