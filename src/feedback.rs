use std::io::Write;
use std::process::{Child, Command, Stdio};

/// Fire-and-forget audio and speech requests emitted while playing.
///
/// Every request is best-effort: implementations swallow failures so a
/// missing speech binary or a mute terminal never interrupts a session.
pub trait FeedbackSink {
    /// Play a short tone. Frequency and duration are hints; sinks without
    /// tone control may approximate.
    fn tone(&mut self, freq_hz: u32, duration_ms: u64);

    /// Speak a phrase, cancelling any phrase still in flight.
    fn speak(&mut self, text: &str, locale: &str);

    /// Cut off any in-flight speech.
    fn silence(&mut self) {}

    fn set_sound(&mut self, _enabled: bool) {}
    fn set_voice(&mut self, _enabled: bool) {}
}

/// Silent sink for headless runs and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn tone(&mut self, _freq_hz: u32, _duration_ms: u64) {}
    fn speak(&mut self, _text: &str, _locale: &str) {}
}

/// Production sink: terminal bell for tones, a platform speech command
/// (`say` on macOS, `espeak` elsewhere) for phrases.
pub struct TerminalFeedback {
    sound: bool,
    voice: bool,
    speaking: Option<Child>,
}

impl TerminalFeedback {
    pub fn new(sound: bool, voice: bool) -> Self {
        Self {
            sound,
            voice,
            speaking: None,
        }
    }
}

impl FeedbackSink for TerminalFeedback {
    fn tone(&mut self, _freq_hz: u32, _duration_ms: u64) {
        if !self.sound {
            return;
        }
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }

    fn speak(&mut self, text: &str, locale: &str) {
        if !self.voice {
            return;
        }
        self.silence();
        self.speaking = spawn_speaker(text, locale);
    }

    fn silence(&mut self) {
        if let Some(mut child) = self.speaking.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn set_sound(&mut self, enabled: bool) {
        self.sound = enabled;
    }

    fn set_voice(&mut self, enabled: bool) {
        if !enabled {
            self.silence();
        }
        self.voice = enabled;
    }
}

impl Drop for TerminalFeedback {
    fn drop(&mut self) {
        self.silence();
    }
}

fn spawn_speaker(text: &str, locale: &str) -> Option<Child> {
    let mut cmd = if cfg!(target_os = "macos") {
        let mut c = Command::new("say");
        c.arg(text);
        c
    } else {
        // espeak wants a bare language code, not a BCP 47 tag
        let lang = locale.split('-').next().unwrap_or("en");
        let mut c = Command::new("espeak");
        c.arg("-v").arg(lang).arg("-s").arg("140").arg(text);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .ok()
}

/// Test sink that records every request it receives. Clones share one log,
/// so a handle kept outside the game still sees what a boxed clone recorded.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingFeedback {
    log: std::rc::Rc<std::cell::RefCell<FeedbackLog>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct FeedbackLog {
    tones: Vec<(u32, u64)>,
    spoken: Vec<(String, String)>,
    silenced: usize,
}

#[cfg(test)]
impl RecordingFeedback {
    pub fn tones(&self) -> Vec<(u32, u64)> {
        self.log.borrow().tones.clone()
    }

    pub fn spoken(&self) -> Vec<(String, String)> {
        self.log.borrow().spoken.clone()
    }

    pub fn silenced(&self) -> usize {
        self.log.borrow().silenced
    }
}

#[cfg(test)]
impl FeedbackSink for RecordingFeedback {
    fn tone(&mut self, freq_hz: u32, duration_ms: u64) {
        self.log.borrow_mut().tones.push((freq_hz, duration_ms));
    }

    fn speak(&mut self, text: &str, locale: &str) {
        self.log
            .borrow_mut()
            .spoken
            .push((text.to_string(), locale.to_string()));
    }

    fn silence(&mut self) {
        self.log.borrow_mut().silenced += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_feedback_accepts_everything() {
        let mut sink = NullFeedback;
        sink.tone(540, 90);
        sink.speak("hola", "es-ES");
        sink.silence();
        sink.set_sound(false);
        sink.set_voice(true);
    }

    #[test]
    fn disabled_sound_skips_tones() {
        let mut sink = TerminalFeedback::new(false, false);
        // Nothing to observe directly; this must simply not write or spawn
        sink.tone(880, 90);
        sink.speak("hola", "es-ES");
        assert!(sink.speaking.is_none());
    }

    #[test]
    fn disabling_voice_cuts_speech() {
        let mut sink = TerminalFeedback::new(false, true);
        sink.set_voice(false);
        sink.speak("hola", "es-ES");
        assert!(sink.speaking.is_none());
    }

    #[test]
    fn silence_with_no_speech_is_noop() {
        let mut sink = TerminalFeedback::new(true, true);
        sink.silence();
        sink.silence();
    }

    #[test]
    fn recording_feedback_captures_requests() {
        let sink = RecordingFeedback::default();
        let mut boxed: Box<dyn FeedbackSink> = Box::new(sink.clone());
        boxed.tone(540, 90);
        boxed.tone(880, 90);
        boxed.speak("eres suficiente", "es-ES");

        assert_eq!(sink.tones(), vec![(540, 90), (880, 90)]);
        assert_eq!(sink.spoken().len(), 1);
        assert_eq!(sink.spoken()[0].1, "es-ES");
    }
}
