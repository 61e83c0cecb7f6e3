//! Raw PCM sound cues
//!
//! Cue files (`*.8b`) are headerless 8-bit unsigned mono at 8 kHz.
//! Playback backends take WAV bytes, so clips can re-encode themselves.

/// A decoded sound ready for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub pcm_data: Vec<u8>,
}

impl SoundClip {
    pub const CUE_SAMPLE_RATE: u32 = 8000;

    /// Wrap mono PCM samples
    pub fn from_raw_pcm(data: &[u8], sample_rate: u32, bits_per_sample: u16) -> Self {
        SoundClip {
            sample_rate,
            channels: 1,
            bits_per_sample,
            pcm_data: data.to_vec(),
        }
    }

    /// Wrap the contents of a `.8b` cue file
    pub fn from_cue_bytes(data: &[u8]) -> Self {
        Self::from_raw_pcm(data, Self::CUE_SAMPLE_RATE, 8)
    }

    pub fn duration_ms(&self) -> u32 {
        let bytes_per_sec =
            self.sample_rate as u64 * self.channels as u64 * self.bits_per_sample as u64 / 8;
        if bytes_per_sec == 0 {
            return 0;
        }
        (self.pcm_data.len() as u64 * 1000 / bytes_per_sec) as u32
    }

    /// Encode as WAV file bytes
    pub fn to_wav(&self) -> Vec<u8> {
        let byte_rate = self.sample_rate * self.channels as u32 * self.bits_per_sample as u32 / 8;
        let block_align = self.channels * self.bits_per_sample / 8;
        let data_len = self.pcm_data.len() as u32;
        let file_len = 36 + data_len;

        let mut wav = Vec::with_capacity(file_len as usize + 8);

        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&file_len.to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&self.channels.to_le_bytes());
        wav.extend_from_slice(&self.sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&self.bits_per_sample.to_le_bytes());

        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.extend_from_slice(&self.pcm_data);

        wav
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_wav_header() {
        let clip = SoundClip::from_cue_bytes(&[0x80; 800]);
        assert_eq!(clip.duration_ms(), 100);

        let wav = clip.to_wav();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 8000);
        assert_eq!(u16::from_le_bytes(wav[34..36].try_into().unwrap()), 8);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 800);
        assert_eq!(wav.len(), 44 + 800);
    }
}
