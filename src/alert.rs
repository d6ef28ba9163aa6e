use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, Sink};

/// Sound collaborator for the countdown's ending alert. Playback failure is
/// a collaborator problem: it is logged and swallowed, never surfaced to the
/// state machine.
pub trait AlertSink {
    fn play_alert_once(&mut self);
    fn stop_alert(&mut self);
}

/// No-sound sink for tests and `--muted` runs.
#[derive(Debug, Default)]
pub struct NullAlert;

impl AlertSink for NullAlert {
    fn play_alert_once(&mut self) {}
    fn stop_alert(&mut self) {}
}

struct Playback {
    // Keeps the audio device open for the lifetime of the sink.
    _stream: OutputStream,
    sink: Sink,
}

/// Plays the configured sound file, or a generated tone when none is set.
pub struct SpeakerAlert {
    sound_file: Option<PathBuf>,
    playback: Option<Playback>,
}

const TONE_FREQUENCY_HZ: f32 = 880.0;
const TONE_DURATION: Duration = Duration::from_secs(4);

impl SpeakerAlert {
    pub fn new(sound_file: Option<PathBuf>) -> Self {
        Self {
            sound_file,
            playback: None,
        }
    }
}

impl AlertSink for SpeakerAlert {
    fn play_alert_once(&mut self) {
        self.stop_alert();

        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(err) => {
                eprintln!("warning: could not open audio output: {err}");
                return;
            }
        };
        let sink = match Sink::try_new(&stream_handle) {
            Ok(sink) => sink,
            Err(err) => {
                eprintln!("warning: could not create audio sink: {err}");
                return;
            }
        };

        match &self.sound_file {
            Some(path) => {
                let file = match File::open(path) {
                    Ok(file) => file,
                    Err(err) => {
                        eprintln!(
                            "warning: could not open alert sound {}: {err}",
                            path.display()
                        );
                        return;
                    }
                };
                match Decoder::new(BufReader::new(file)) {
                    Ok(source) => sink.append(source),
                    Err(err) => {
                        eprintln!(
                            "warning: could not decode alert sound {}: {err}",
                            path.display()
                        );
                        return;
                    }
                }
            }
            None => {
                let tone = SineWave::new(TONE_FREQUENCY_HZ)
                    .take_duration(TONE_DURATION)
                    .amplify(0.20);
                sink.append(tone);
            }
        }

        self.playback = Some(Playback {
            _stream: stream,
            sink,
        });
    }

    fn stop_alert(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.sink.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_alert_is_inert() {
        let mut sink = NullAlert;
        sink.play_alert_once();
        sink.stop_alert();
    }

    #[test]
    fn stop_without_playback_is_a_no_op() {
        let mut sink = SpeakerAlert::new(None);
        sink.stop_alert();
        sink.stop_alert();
    }
}
