//! services/api/src/adapters/sst.rs
//!
//! This module contains the adapter for OpenAI's Speech-to-Text (Whisper) service.
//! It implements the `SpeechToTextService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use hound::{WavSpec, WavWriter};
use medminder_core::ports::{PortError, PortResult, SpeechToTextService};

/// Sample rate of the raw PCM16 audio the voice endpoint accepts.
pub const VOICE_SAMPLE_RATE_HZ: u32 = 48_000;

/// Wraps raw little-endian PCM16 mono samples into a WAV container, which is
/// what the transcription endpoint expects.
fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = std::io::Cursor::new(Vec::new());

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for chunk in pcm_data.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SpeechToTextService` port using the OpenAI Whisper API.
#[derive(Clone)]
pub struct OpenAiSstAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    sample_rate: u32,
}

impl OpenAiSstAdapter {
    /// Creates a new `OpenAiSstAdapter` expecting PCM16 input at
    /// [`VOICE_SAMPLE_RATE_HZ`].
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self {
            client,
            model,
            sample_rate: VOICE_SAMPLE_RATE_HZ,
        }
    }
}

//=========================================================================================
// `SpeechToTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechToTextService for OpenAiSstAdapter {
    /// Transcribes a slice of raw PCM16 audio data into text using the
    /// configured Whisper model.
    async fn transcribe_audio(&self, audio_data: &[u8]) -> PortResult<String> {
        let wav_data = pcm16_to_wav(audio_data, self.sample_rate)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode WAV: {}", e)))?;

        let input = AudioInput::from_vec_u8("user_audio.wav".into(), wav_data);

        let request = CreateTranscriptionRequest {
            file: input,
            model: self.model.clone(),
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_pcm16_into_a_riff_container() {
        // Two samples of silence.
        let pcm = [0u8, 0, 0, 0];
        let wav = pcm16_to_wav(&pcm, VOICE_SAMPLE_RATE_HZ).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header plus the payload.
        assert_eq!(wav.len(), 44 + pcm.len());
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let even = pcm16_to_wav(&[0u8, 0], VOICE_SAMPLE_RATE_HZ).unwrap();
        let odd = pcm16_to_wav(&[0u8, 0, 7], VOICE_SAMPLE_RATE_HZ).unwrap();
        assert_eq!(even.len(), odd.len());
    }
}
