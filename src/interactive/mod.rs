//! Interactive correction loop.
//!
//! A line-oriented request/response state machine:
//!
//! ```text
//! AwaitInput ──(4 numbers)──▶ Classify ──▶ AwaitConfirmation ──("n")──▶ AwaitCorrection
//!     ▲   └──(wrong arity)──┐                    │ (anything else)            │
//!     └─────────────────────┴────────────────────┴────────────────────────────┘
//! ```
//!
//! Inputs are normalized with the parameters fitted at training time. A
//! correction trains the classifier one step using the activations cached by
//! the preceding classification; no second forward pass is run. Malformed
//! input never ends the session; only end of input does.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::core::{Classifier, NetworkError};
use crate::data::{
    neutralize, parse_features, EncodedTarget, LabelEncoder, NormalizationParams, FEATURES,
};

pub const PROMPT_INPUT: &str = "Enter an Iris specification for recognition:";
pub const PROMPT_CONFIRM: &str = "Is this correct? (y/n)";
pub const PROMPT_CORRECTION: &str = "What was the correct classification?";
pub const MSG_INVALID: &str = "Invalid input!";
pub const MSG_UNRECOGNIZED: &str = "Couldn't recognize your input, skipping.";

/// Errors that end an interactive session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("classifier failed: {0}")]
    Network(#[from] NetworkError),
}

/// Loop state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum State {
    AwaitInput,
    Classify([f64; FEATURES]),
    AwaitConfirmation,
    AwaitCorrection,
}

/// Counters for a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Tuples classified
    pub classified: usize,
    /// Lines rejected for having the wrong number of fields
    pub rejected: usize,
    /// Classifications accepted without correction
    pub confirmed: usize,
    /// Corrections that trained the classifier
    pub corrected: usize,
    /// Corrections skipped because the label was not recognized
    pub skipped: usize,
}

/// One interactive session over a reader/writer pair.
pub struct Session<'a, C: ?Sized, R, W> {
    classifier: &'a mut C,
    params: &'a NormalizationParams,
    encoder: &'a LabelEncoder,
    input: R,
    output: W,
    summary: SessionSummary,
}

impl<'a, C, R, W> Session<'a, C, R, W>
where
    C: Classifier + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(
        classifier: &'a mut C,
        params: &'a NormalizationParams,
        encoder: &'a LabelEncoder,
        input: R,
        output: W,
    ) -> Self {
        Self {
            classifier,
            params,
            encoder,
            input,
            output,
            summary: SessionSummary::default(),
        }
    }

    /// Run until the input is exhausted.
    pub fn run(mut self) -> Result<SessionSummary, SessionError> {
        let mut state = State::AwaitInput;
        while let Some(next) = self.step(state)? {
            state = next;
        }
        tracing::info!(summary = ?self.summary, "session ended");
        Ok(self.summary)
    }

    /// Perform one transition. `None` means the input reached end of file.
    pub fn step(&mut self, state: State) -> Result<Option<State>, SessionError> {
        let next = match state {
            State::AwaitInput => {
                self.say(PROMPT_INPUT)?;
                let Some(line) = self.read_line()? else {
                    return Ok(None);
                };
                match parse_tuple(&line) {
                    Some(features) => State::Classify(features),
                    None => {
                        self.summary.rejected += 1;
                        self.say(MSG_INVALID)?;
                        State::AwaitInput
                    }
                }
            }
            State::Classify(features) => {
                let normalized = self.params.transform(&features);
                self.classifier.forward(&neutralize(&normalized))?;
                let outputs = self.classifier.outputs();
                self.summary.classified += 1;
                self.say(&format_confidence(&outputs, self.encoder))?;
                State::AwaitConfirmation
            }
            State::AwaitConfirmation => {
                self.say(PROMPT_CONFIRM)?;
                let Some(line) = self.read_line()? else {
                    return Ok(None);
                };
                if is_negative(&line) {
                    State::AwaitCorrection
                } else {
                    self.summary.confirmed += 1;
                    State::AwaitInput
                }
            }
            State::AwaitCorrection => {
                self.say(PROMPT_CORRECTION)?;
                let encoder = self.encoder;
                for (i, label) in encoder.labels().iter().enumerate() {
                    let entry = format!("{}. {label}", i + 1);
                    self.say(&entry)?;
                }
                let Some(line) = self.read_line()? else {
                    return Ok(None);
                };
                match resolve_correction(&line, encoder) {
                    Some(target) => {
                        self.classifier.train(target.as_slice())?;
                        self.summary.corrected += 1;
                        let error = self.classifier.recent_average_error();
                        tracing::info!(class = target.index(), error, "correction applied");
                        self.say(&format!(
                            "Thank you, my error rate is now: {:.2}%",
                            error * 100.0
                        ))?;
                    }
                    None => {
                        self.summary.skipped += 1;
                        self.say(MSG_UNRECOGNIZED)?;
                    }
                }
                State::AwaitInput
            }
        };
        tracing::debug!(?state, ?next, "transition");
        Ok(Some(next))
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")?;
        self.output.flush()
    }

    /// Next trimmed line, or `None` at end of input.
    ///
    /// Bytes that are not UTF-8 are replaced rather than failing the read, so
    /// such a line is rejected by the parsers like any other malformed input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
    }
}

/// Parse a user-entered tuple; `None` unless it has exactly `FEATURES` fields.
///
/// Individual fields fail open to 0.0 like dataset rows do.
pub fn parse_tuple(line: &str) -> Option<[f64; FEATURES]> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != FEATURES {
        return None;
    }
    let values = parse_features(&fields, false).ok()?;
    let mut out = [0.0; FEATURES];
    out.copy_from_slice(&values);
    Some(out)
}

/// `"X.XX% label, ..."` for each output and its label.
pub fn format_confidence(outputs: &[f64], encoder: &LabelEncoder) -> String {
    outputs
        .iter()
        .zip(encoder.labels())
        .map(|(p, label)| format!("{:.2}% {label}", p * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_negative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no")
}

/// Menu number (1-based) or an exact label.
fn resolve_correction(choice: &str, encoder: &LabelEncoder) -> Option<EncodedTarget> {
    let choice = choice.trim();
    match choice.parse::<usize>() {
        Ok(n) if n >= 1 => encoder.label(n - 1).and_then(|l| encoder.encode(l)),
        Ok(_) => None,
        Err(_) => encoder.encode(choice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tuple() {
        assert_eq!(parse_tuple("5.1,3.5,1.4,0.2"), Some([5.1, 3.5, 1.4, 0.2]));
        assert_eq!(parse_tuple(" 5.1, 3.5 ,1.4,0.2 "), Some([5.1, 3.5, 1.4, 0.2]));
        assert_eq!(parse_tuple("x,3.5,1.4,0.2"), Some([0.0, 3.5, 1.4, 0.2]));
        assert_eq!(parse_tuple("1,2,3"), None);
        assert_eq!(parse_tuple("1,2,3,4,5"), None);
        assert_eq!(parse_tuple(""), None);
    }

    #[test]
    fn test_format_confidence() {
        let enc = LabelEncoder::iris();
        assert_eq!(
            format_confidence(&[0.9712, 0.0251, -0.0033], &enc),
            "97.12% Iris-setosa, 2.51% Iris-versicolor, -0.33% Iris-virginica"
        );
    }

    #[test]
    fn test_is_negative() {
        assert!(is_negative("n"));
        assert!(is_negative("N"));
        assert!(is_negative(" no "));
        assert!(!is_negative("y"));
        assert!(!is_negative(""));
        assert!(!is_negative("nope"));
    }

    #[test]
    fn test_resolve_correction() {
        let enc = LabelEncoder::iris();
        assert_eq!(resolve_correction("1", &enc), EncodedTarget::one_hot(0));
        assert_eq!(resolve_correction("3", &enc), EncodedTarget::one_hot(2));
        assert_eq!(resolve_correction("Iris-versicolor", &enc), EncodedTarget::one_hot(1));
        assert_eq!(resolve_correction("0", &enc), None);
        assert_eq!(resolve_correction("4", &enc), None);
        assert_eq!(resolve_correction("iris-setosa", &enc), None);
    }
}
