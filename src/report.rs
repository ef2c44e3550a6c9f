use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::Result;
use crate::speech::{RecognitionResponse, SpeechRecognitionAlternative};

/// Printed when no audio path is given.
pub const NO_ARGUMENT_MESSAGE: &str = "No argument provided.";

/// Writes the console report for a transcription run.
///
/// The report is produced in stages because the header lines are printed before the
/// (potentially long) recognition call starts:
///
/// ```text
/// Audio file:  clip.wav
/// Sample Rate (Hz): 16000
///
/// "hello world" (confidence=0.95)
///
/// Time duration :  1.234567s
/// ```
pub struct Report<W: Write> {
    w: W,
    word_time_offsets: bool,
}

impl<W: Write> Report<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            word_time_offsets: false,
        }
    }

    /// Also print one indented line per word under each alternative.
    pub fn with_word_time_offsets(mut self, enabled: bool) -> Self {
        self.word_time_offsets = enabled;
        self
    }

    pub fn no_argument(&mut self) -> Result<()> {
        writeln!(self.w, "{NO_ARGUMENT_MESSAGE}")?;
        self.w.flush()?;
        Ok(())
    }

    pub fn audio_file(&mut self, path: &Path) -> Result<()> {
        writeln!(self.w, "Audio file:  {}", path.display())?;
        self.w.flush()?;
        Ok(())
    }

    pub fn sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        writeln!(self.w, "Sample Rate (Hz): {sample_rate}")?;
        self.w.flush()?;
        Ok(())
    }

    /// Print every alternative in service order, framed by blank lines.
    pub fn transcripts(&mut self, response: &RecognitionResponse) -> Result<()> {
        writeln!(self.w)?;
        for alt in response.alternatives() {
            self.alternative(alt)?;
        }
        writeln!(self.w)?;
        Ok(())
    }

    fn alternative(&mut self, alt: &SpeechRecognitionAlternative) -> Result<()> {
        writeln!(
            self.w,
            "\"{}\" (confidence={:.2})",
            alt.transcript, alt.confidence
        )?;

        if self.word_time_offsets {
            for word in &alt.words {
                writeln!(
                    self.w,
                    "    {:.3}s - {:.3}s  {}",
                    word.start_time.as_secs_f64(),
                    word.end_time.as_secs_f64(),
                    word.word
                )?;
            }
        }
        Ok(())
    }

    pub fn elapsed(&mut self, elapsed: Duration) -> Result<()> {
        writeln!(self.w, "Time duration :  {elapsed:?}")?;
        self.w.flush()?;
        Ok(())
    }
}
