//! Local sound playback for phase transitions.

use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::traits::{FeatureCall, FeatureHandler, FeatureResult};

pub struct SoundHandler;

impl SoundHandler {
    /// Probe the default audio output; headless machines fail here and
    /// the feature stays uninitialized.
    pub fn new() -> FeatureResult<Self> {
        let (_stream, _handle) = OutputStream::try_default()?;
        Ok(Self)
    }

    // The output stream is not Send, so it is opened per call inside
    // the worker rather than held across them.
    fn play(path: &Path, volume: f32) -> FeatureResult {
        tracing::debug!(path = %path.display(), volume, "playing sound");
        let (_stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.set_volume(volume);
        sink.append(Decoder::new(BufReader::new(File::open(path)?))?);
        sink.sleep_until_end();
        Ok(())
    }
}

impl FeatureHandler for SoundHandler {
    fn handle(&mut self, call: FeatureCall) -> FeatureResult {
        match call {
            FeatureCall::PlaySound { path, volume } => Self::play(&path, volume),
            other => {
                tracing::debug!(?other, "call outside sound capability");
                Ok(())
            }
        }
    }
}
