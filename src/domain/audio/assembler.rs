use super::error::AssemblyError;
use std::io::Cursor;

/// Merges per-chunk audio buffers, in chunk order, into one playable buffer.
///
/// Each synthesis backend comes paired with the assembler that understands the
/// container format it produces.
pub trait AudioAssembler: Send + Sync {
    fn assemble(&self, chunks: Vec<Vec<u8>>) -> Result<Vec<u8>, AssemblyError>;
}

/// Joins MP3 chunks by plain byte concatenation.
///
/// MPEG audio is a sequence of self-contained frames, so independently encoded
/// segments placed back to back decode as one stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mp3ConcatAssembler;

impl AudioAssembler for Mp3ConcatAssembler {
    fn assemble(&self, mut chunks: Vec<Vec<u8>>) -> Result<Vec<u8>, AssemblyError> {
        if chunks.is_empty() {
            return Err(AssemblyError::Empty);
        }
        if chunks.len() == 1 {
            return Ok(chunks.swap_remove(0));
        }

        for (index, chunk) in chunks.iter().enumerate().skip(1) {
            if chunk.starts_with(b"ID3") {
                tracing::debug!(chunk_index = index, "Chunk carries an ID3v2 tag, it will sit mid-stream");
            }
        }

        let merged = chunks.concat();
        tracing::debug!(
            chunk_count = chunks.len(),
            merged_bytes = merged.len(),
            "MP3 chunks concatenated"
        );
        Ok(merged)
    }
}

/// Rebuilds one WAV container from several.
///
/// Every chunk has its own RIFF header, so the sample frames are read out of each
/// chunk and written under a single header taken from the first one. All chunks
/// must share the same format.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavAssembler;

impl AudioAssembler for WavAssembler {
    fn assemble(&self, mut chunks: Vec<Vec<u8>>) -> Result<Vec<u8>, AssemblyError> {
        if chunks.is_empty() {
            return Err(AssemblyError::Empty);
        }
        if chunks.len() == 1 {
            return Ok(chunks.swap_remove(0));
        }

        let readers = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| {
                hound::WavReader::new(Cursor::new(chunk.as_slice())).map_err(|e| {
                    AssemblyError::InvalidContainer {
                        index,
                        message: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Validate every header before writing anything
        let spec = readers[0].spec();
        for (index, reader) in readers.iter().enumerate().skip(1) {
            let found = reader.spec();
            if found != spec {
                return Err(AssemblyError::FormatMismatch {
                    index,
                    expected: describe(&spec),
                    found: describe(&found),
                });
            }
        }

        let total_frames: u64 = readers.iter().map(|r| u64::from(r.duration())).sum();
        let mut output = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut output), spec)
                .map_err(|e| AssemblyError::Write(e.to_string()))?;

            for (index, reader) in readers.into_iter().enumerate() {
                copy_frames(reader, &mut writer, index)?;
            }

            writer
                .finalize()
                .map_err(|e| AssemblyError::Write(e.to_string()))?;
        }

        tracing::debug!(
            chunk_count = chunks.len(),
            total_frames,
            sample_rate = spec.sample_rate,
            merged_bytes = output.len(),
            "WAV chunks re-muxed under one header"
        );

        Ok(output)
    }
}

fn copy_frames<W>(
    reader: hound::WavReader<Cursor<&[u8]>>,
    writer: &mut hound::WavWriter<W>,
    index: usize,
) -> Result<(), AssemblyError>
where
    W: std::io::Write + std::io::Seek,
{
    let invalid = |e: hound::Error| AssemblyError::InvalidContainer {
        index,
        message: e.to_string(),
    };
    let write_failed = |e: hound::Error| AssemblyError::Write(e.to_string());

    match reader.spec().sample_format {
        hound::SampleFormat::Int => {
            for sample in reader.into_samples::<i32>() {
                writer.write_sample(sample.map_err(invalid)?).map_err(write_failed)?;
            }
        }
        hound::SampleFormat::Float => {
            for sample in reader.into_samples::<f32>() {
                writer.write_sample(sample.map_err(invalid)?).map_err(write_failed)?;
            }
        }
    }

    Ok(())
}

fn describe(spec: &hound::WavSpec) -> String {
    format!(
        "{} ch, {} bit {:?}, {} Hz",
        spec.channels, spec.bits_per_sample, spec.sample_format, spec.sample_rate
    )
}
