//! Embedded music loops.
//!
//! When no assets directory is configured the catalog points at these
//! loops. They are short arpeggios synthesised into 16-bit mono WAV data
//! at load time, so the binary carries no audio files.

/// Sample rate of the synthesised loops.
pub const EMBEDDED_SAMPLE_RATE: u32 = 22_050;

const AMPLITUDE: f32 = 0.3;
const FADE_MS: u32 = 10;

/// (frequency in Hz, duration in ms) for each note of the home loop.
const HOME_NOTES: &[(f32, u32)] = &[(523.25, 300), (659.25, 300), (783.99, 300), (659.25, 300)];

/// The game loop is faster and a little bouncier.
const GAME_NOTES: &[(f32, u32)] = &[(392.00, 200), (523.25, 200), (392.00, 200), (587.33, 200)];

/// Returns the WAV data of the embedded loop called `name`.
///
/// Returns `None` for unknown names.
#[must_use]
pub fn embedded_track_wav(name: &str) -> Option<Vec<u8>> {
    let notes = match name {
        "home" => HOME_NOTES,
        "game" => GAME_NOTES,
        _ => return None,
    };
    Some(encode_wav(&synthesize(notes), EMBEDDED_SAMPLE_RATE))
}

/// Returns the names of all embedded loops.
#[must_use]
pub const fn embedded_track_names() -> &'static [&'static str] {
    &["home", "game"]
}

fn synthesize(notes: &[(f32, u32)]) -> Vec<i16> {
    let rate = EMBEDDED_SAMPLE_RATE as f32;
    let fade = (EMBEDDED_SAMPLE_RATE * FADE_MS / 1000) as usize;
    let mut samples = Vec::new();

    for &(freq, ms) in notes {
        let len = (EMBEDDED_SAMPLE_RATE * ms / 1000) as usize;
        for i in 0..len {
            // Linear fade at both ends of each note avoids clicks at the joins.
            let envelope = if i < fade {
                i as f32 / fade as f32
            } else if i + fade > len {
                (len - i) as f32 / fade as f32
            } else {
                1.0
            };
            let t = i as f32 / rate;
            let value = (2.0 * std::f32::consts::PI * freq * t).sin() * AMPLITUDE * envelope;
            samples.push((value * f32::from(i16::MAX)) as i16);
        }
    }

    samples
}

fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut wav = Vec::with_capacity(44 + data_len as usize);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk: PCM, mono, 16-bit
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_loops_exist() {
        for name in embedded_track_names() {
            assert!(embedded_track_wav(name).is_some(), "missing loop {name}");
        }
        assert!(embedded_track_wav("menu").is_none());
    }

    #[test]
    fn test_wav_header() {
        let data = embedded_track_wav("home").unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(&data[36..40], b"data");

        let riff_len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        assert_eq!(riff_len as usize, data.len() - 8);
    }

    #[test]
    fn test_home_loop_length() {
        let data = embedded_track_wav("home").unwrap();
        let data_len = u32::from_le_bytes([data[40], data[41], data[42], data[43]]);
        // Four notes of 300 ms at 22050 Hz, two bytes per sample.
        assert_eq!(data_len, 4 * 6615 * 2);
    }

    #[test]
    fn test_loop_starts_and_ends_silent() {
        let samples = synthesize(HOME_NOTES);
        assert_eq!(samples[0], 0);
        assert!(samples.last().unwrap().abs() < 200);
    }

    #[test]
    fn test_loops_are_quiet() {
        let samples = synthesize(GAME_NOTES);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak <= (f32::from(i16::MAX) * AMPLITUDE) as u16 + 1);
        assert!(peak > 0);
    }
}
