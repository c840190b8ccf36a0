use std::io::Cursor;
use symphonia::core::{
    formats::FormatOptions,
    io::{MediaSourceStream, MediaSourceStreamOptions},
    meta::MetadataOptions,
    probe::Hint,
};

/// Length in seconds of an MP3 buffer.
///
/// Uses the frame count reported by the container when available (Xing/Info
/// header or a frame scan), otherwise sums the durations of every packet.
pub fn mp3_duration_secs(audio: &[u8]) -> Result<f64, String> {
    let source = MediaSourceStream::new(
        Box::new(Cursor::new(audio.to_vec())),
        MediaSourceStreamOptions::default(),
    );
    let mut hint = Hint::new();
    hint.with_extension("mp3").mime_type("audio/mpeg");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("not an MP3 stream: {}", e))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| "no audio track found".to_string())?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| "sample rate missing".to_string())?;

    if let Some(n_frames) = params.n_frames {
        return Ok(n_frames as f64 / f64::from(sample_rate));
    }

    let mut total_frames: u64 = 0;
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => total_frames += packet.dur,
            Ok(_) => continue,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(format!("failed to read MP3 packets: {}", e)),
        }
    }

    if total_frames == 0 {
        return Err("stream contains no audio frames".to_string());
    }

    Ok(total_frames as f64 / f64::from(sample_rate))
}

/// Length in seconds of a WAV buffer: frames / sample rate
pub fn wav_duration_secs(audio: &[u8]) -> Result<f64, String> {
    let reader = hound::WavReader::new(Cursor::new(audio))
        .map_err(|e| format!("not a WAV container: {}", e))?;
    let spec = reader.spec();

    if spec.sample_rate == 0 {
        return Err("sample rate is zero".to_string());
    }

    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

/// Apply the zero fallback used when a provider returns audio whose metadata
/// cannot be read. The chunk is still kept; only its duration is unknown.
pub fn duration_or_zero(parsed: Result<f64, String>, service: &str, chunk_bytes: usize) -> f64 {
    match parsed {
        Ok(duration) => duration,
        Err(reason) => {
            tracing::warn!(
                service,
                chunk_bytes,
                reason = %reason,
                "Could not determine chunk duration, defaulting to 0.0"
            );
            0.0
        }
    }
}
