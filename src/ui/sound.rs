/// Sound engine: procedural drum and chime effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use crate::sim::audio::{AudioPort, Tone};

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::domain::rules::{HitGrade, MAX_COLUMNS};

    const SAMPLE_RATE: u32 = 22050;

    /// Drum pitch per column, low on the left.
    const COLUMN_PITCH: [f32; MAX_COLUMNS] = [
        110.0, 131.0, 165.0, 196.0, 220.0, 262.0, 330.0, 392.0,
    ];

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// `[column][grade]`, grade 0 = normal, 1 = perfect.
        sfx_hit: Vec<[Arc<Vec<u8>>; 2]>,
        sfx_count: Arc<Vec<u8>>,
        sfx_go: Arc<Vec<u8>>,
        sfx_miss: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let sfx_hit = COLUMN_PITCH
                .iter()
                .map(|&f| [
                    Arc::new(make_wav(&gen_drum(f, false))),
                    Arc::new(make_wav(&gen_drum(f, true))),
                ])
                .collect();

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_hit,
                sfx_count: Arc::new(make_wav(&gen_blip(660.0, 0.09, 0.3))),
                sfx_go: Arc::new(make_wav(&gen_blip(1320.0, 0.25, 0.3))),
                sfx_miss: Arc::new(make_wav(&gen_miss())),
            })
        }

        fn play_buf(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_hit(&self, column: usize, grade: HitGrade) {
            let slot = match grade {
                HitGrade::Normal => 0,
                HitGrade::Perfect => 1,
            };
            if let Some(bufs) = self.sfx_hit.get(column) {
                self.play_buf(&bufs[slot]);
            }
        }

        pub fn play_count(&self) { self.play_buf(&self.sfx_count); }
        pub fn play_go(&self) { self.play_buf(&self.sfx_go); }
        pub fn play_miss(&self) { self.play_buf(&self.sfx_miss); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Tom-like hit: pitch drops quickly from 2x to the base frequency,
    /// with a short noise click on the attack. Perfect hits add a bright third harmonic.
    fn gen_drum(freq: f32, perfect: bool) -> Vec<f32> {
        let duration = 0.18;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0x2545_f491;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let f = freq * (1.0 + (-t * 18.0).exp());
                phase += f / SAMPLE_RATE as f32;
                let body = (phase * 2.0 * std::f32::consts::PI).sin();

                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let click = noise * (-t * 60.0).exp();

                let ti = i as f32 / SAMPLE_RATE as f32;
                let shine = if perfect {
                    (ti * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.35
                } else {
                    0.0
                };

                let env = (1.0 - t).powf(2.0);
                (body * 0.7 + click * 0.3 + shine) * env * 0.4
            })
            .collect()
    }

    /// Run over: descending minor arpeggio.
    fn gen_miss() -> Vec<f32> {
        let notes = [392.0_f32, 311.0, 262.0, 196.0];
        let note_dur = 0.11;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                // Sine + 3rd harmonic for a hollow, buzzy tone
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= (fade_len - k) as f32 / fade_len as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let samples = gen_blip(440.0, 0.01, 0.5);
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
        }

        #[test]
        fn generated_samples_stay_in_range() {
            for &f in &COLUMN_PITCH {
                for perfect in [false, true] {
                    assert!(gen_drum(f, perfect).iter().all(|s| s.abs() <= 1.0));
                }
            }
            assert!(gen_miss().iter().all(|s| s.abs() <= 1.0));
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(feature = "sound")]
impl AudioPort for SoundEngine {
    fn play(&self, tone: Tone) {
        match tone {
            Tone::Hit { column, grade } => self.play_hit(column, grade),
            Tone::Count => self.play_count(),
            Tone::Go => self.play_go(),
            Tone::Miss => self.play_miss(),
        }
    }
}

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
}

#[cfg(not(feature = "sound"))]
impl AudioPort for SoundEngine {
    fn play(&self, _tone: Tone) {}
}
