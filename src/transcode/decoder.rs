use std::io::Cursor;

use async_trait::async_trait;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::interface::{AudioTranscoder, TranscodeError};

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

const RESAMPLE_CHUNK: usize = 1024;

/// In-process transcoder: symphonia probe/decode, mono downmix, 16 kHz
/// resample, 16-bit PCM WAV out.
pub struct SymphoniaTranscoder;

impl SymphoniaTranscoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SymphoniaTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioTranscoder for SymphoniaTranscoder {
    async fn transcode(&self, audio: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        // Decoding is CPU-bound, but voice clips are a few seconds long.
        let (samples, source_rate) = decode_to_mono_pcm(audio)?;

        let samples = if source_rate != TARGET_SAMPLE_RATE {
            resample(&samples, source_rate, TARGET_SAMPLE_RATE)?
        } else {
            samples
        };

        debug!(
            samples = samples.len(),
            duration_secs = samples.len() as f32 / TARGET_SAMPLE_RATE as f32,
            "Audio normalized to 16kHz mono PCM"
        );

        write_wav(&samples)
    }
}

/// Decode any container/codec symphonia understands into interleaved-to-mono
/// f32 samples at the source rate.
fn decode_to_mono_pcm(data: &[u8]) -> Result<(Vec<f32>, u32), TranscodeError> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TranscodeError(format!("probe: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| TranscodeError("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| TranscodeError("unknown sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| TranscodeError(format!("codec: {}", e)))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(TranscodeError(format!("packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(TranscodeError(format!("decode: {}", e))),
        };

        let spec = *decoded.spec();
        let frames = decoded.frames();
        if frames == 0 {
            continue;
        }

        let mut buf = SampleBuffer::<f32>::new(frames as u64, spec);
        buf.copy_interleaved_ref(decoded);

        if channels > 1 {
            for frame in buf.samples().chunks(channels) {
                mono.push(frame.iter().sum::<f32>() / channels as f32);
            }
        } else {
            mono.extend_from_slice(buf.samples());
        }
    }

    if mono.is_empty() {
        return Err(TranscodeError("no audio samples decoded".to_string()));
    }

    Ok((mono, source_rate))
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, TranscodeError> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, 1)
        .map_err(|e| TranscodeError(format!("resampler init: {}", e)))?;

    let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize + RESAMPLE_CHUNK);

    for chunk in samples.chunks(RESAMPLE_CHUNK) {
        let input = if chunk.len() < RESAMPLE_CHUNK {
            let mut padded = chunk.to_vec();
            padded.resize(RESAMPLE_CHUNK, 0.0);
            padded
        } else {
            chunk.to_vec()
        };

        let processed = resampler
            .process(&[input], None)
            .map_err(|e| TranscodeError(format!("resample: {}", e)))?;

        if let Some(channel) = processed.first() {
            output.extend_from_slice(channel);
        }
    }

    // Trim the tail introduced by padding the final chunk
    let expected = (samples.len() as f64 * ratio) as usize;
    output.truncate(expected);

    Ok(output)
}

fn write_wav(samples: &[f32]) -> Result<Vec<u8>, TranscodeError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| TranscodeError(format!("wav: {}", e)))?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(value)
                .map_err(|e| TranscodeError(format!("wav: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| TranscodeError(format!("wav: {}", e)))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_fixture(sample_rate: u32, channels: u16, seconds: f32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let total = (sample_rate as f32 * seconds) as u32;
            for n in 0..total {
                let t = n as f32 / sample_rate as f32;
                let value = ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 8000.0) as i16;
                for _ in 0..channels {
                    writer.write_sample(value).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn read_spec(wav: &[u8]) -> hound::WavSpec {
        hound::WavReader::new(Cursor::new(wav.to_vec())).unwrap().spec()
    }

    #[tokio::test]
    async fn wav_passes_through_normalized() {
        let input = wav_fixture(16_000, 1, 0.25);
        let output = SymphoniaTranscoder::new().transcode(&input).await.unwrap();

        let spec = read_spec(&output);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[tokio::test]
    async fn stereo_input_is_downmixed() {
        let input = wav_fixture(16_000, 2, 0.25);
        let output = SymphoniaTranscoder::new().transcode(&input).await.unwrap();
        assert_eq!(read_spec(&output).channels, 1);
    }

    #[tokio::test]
    async fn high_rate_input_is_resampled() {
        let input = wav_fixture(44_100, 1, 0.25);
        let output = SymphoniaTranscoder::new().transcode(&input).await.unwrap();

        let reader = hound::WavReader::new(Cursor::new(output)).unwrap();
        assert_eq!(reader.spec().sample_rate, TARGET_SAMPLE_RATE);
        // 0.25s of audio should stay roughly 0.25s after resampling
        let duration = reader.duration() as f32 / TARGET_SAMPLE_RATE as f32;
        assert!((duration - 0.25).abs() < 0.05, "duration was {duration}");
    }

    #[tokio::test]
    async fn garbage_bytes_are_rejected() {
        let result = SymphoniaTranscoder::new().transcode(b"definitely not audio").await;
        assert!(result.is_err());
    }
}
