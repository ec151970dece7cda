use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub text: String,
}

/// Append-only list of the messages exchanged in one chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one question and, if generation succeeded, its answer.
    ///
    /// Both entries are pushed together so a transcript always reads
    /// User, Assistant, User, Assistant... with a lone User entry for every
    /// failed generation.
    pub fn record(&mut self, question: impl Into<String>, answer: Option<String>) {
        self.entries.push(TranscriptEntry {
            sender: Sender::User,
            text: question.into(),
        });

        if let Some(answer) = answer {
            self.entries.push(TranscriptEntry {
                sender: Sender::Assistant,
                text: answer,
            });
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_exchanges_alternate() {
        let mut transcript = Transcript::new();
        for i in 0..3 {
            transcript.record(format!("q{i}"), Some(format!("a{i}")));
        }

        assert_eq!(transcript.len(), 6);
        for (i, entry) in transcript.entries().iter().enumerate() {
            let expected = if i % 2 == 0 {
                Sender::User
            } else {
                Sender::Assistant
            };
            assert_eq!(entry.sender, expected);
        }
        assert_eq!(transcript.entries()[4].text, "q2");
        assert_eq!(transcript.entries()[5].text, "a2");
    }

    #[test]
    fn failed_exchange_keeps_only_the_question() {
        let mut transcript = Transcript::new();
        transcript.record("first", Some("answer".to_string()));
        transcript.record("second", None);

        assert_eq!(transcript.len(), 3);
        let last = transcript.entries().last().unwrap();
        assert_eq!(last.sender, Sender::User);
        assert_eq!(last.text, "second");
    }

    #[test]
    fn serializes_as_a_plain_list() {
        let mut transcript = Transcript::new();
        transcript.record("hi", Some("hello".to_string()));

        let json = serde_json::to_value(&transcript).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "sender": "user", "text": "hi" },
                { "sender": "assistant", "text": "hello" },
            ])
        );
    }
}
