//! Chat transcript and game-result history for the current pairing.
//!
//! Both logs live as long as the same two seats stay occupied: they survive
//! a rematch and are wiped together when a seat is released.

use chrono::{DateTime, Utc};
use crossmark_board::Seat;
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A seat won.
    Winner(Seat),
    /// Nobody won.
    Draw,
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Winner(seat) => seat.serialize(serializer),
            Outcome::Draw => serializer.serialize_str("draw"),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(seat) => write!(f, "Player {} wins", seat),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EndReason {
    /// Three in a row or a full board.
    Normal,
    /// The active seat ran out of time.
    Timeout,
}

/// One finished match.
#[derive(Debug, Clone, PartialEq, Serialize, derive_new::new)]
pub struct GameRecord {
    /// Winning seat or draw.
    pub winner: Outcome,
    /// How the match ended.
    pub reason: EndReason,
    /// When the match ended.
    pub timestamp: DateTime<Utc>,
}

/// One chat line.
#[derive(Debug, Clone, PartialEq, Serialize, derive_new::new)]
pub struct ChatEntry {
    /// Seat that wrote the line.
    pub player: Seat,
    /// The text, trimmed.
    pub message: String,
    /// When it was received.
    pub timestamp: DateTime<Utc>,
}

/// Ephemeral chat and result history.
#[derive(Debug, Clone)]
pub struct SessionLog {
    chat: Vec<ChatEntry>,
    results: Vec<GameRecord>,
    max_chat_len: usize,
}

impl SessionLog {
    /// Creates an empty log accepting chat lines up to `max_chat_len` characters.
    pub fn new(max_chat_len: usize) -> Self {
        Self {
            chat: Vec::new(),
            results: Vec::new(),
            max_chat_len,
        }
    }

    /// Appends a chat line stamped with the current wall-clock time.
    ///
    /// Returns the stored entry, or `None` if the text is blank or too long.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn append_chat(&mut self, player: Seat, text: &str) -> Option<ChatEntry> {
        let message = text.trim();
        if message.is_empty() {
            debug!("Ignoring blank chat message");
            return None;
        }
        if message.chars().count() > self.max_chat_len {
            debug!(max = self.max_chat_len, "Ignoring over-long chat message");
            return None;
        }

        let entry = ChatEntry::new(player, message.to_string(), Utc::now());
        self.chat.push(entry.clone());
        Some(entry)
    }

    /// Appends a finished match and returns the whole history.
    #[instrument(skip(self))]
    pub fn append_result(&mut self, winner: Outcome, reason: EndReason) -> &[GameRecord] {
        self.results
            .push(GameRecord::new(winner, reason, Utc::now()));
        &self.results
    }

    /// Chat transcript, oldest first.
    pub fn chat(&self) -> &[ChatEntry] {
        &self.chat
    }

    /// Result history, oldest first.
    pub fn results(&self) -> &[GameRecord] {
        &self.results
    }

    /// Wipes both logs.
    #[instrument(skip(self), fields(chat = self.chat.len(), results = self.results.len()))]
    pub fn clear(&mut self) {
        self.chat.clear();
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_is_trimmed_and_ordered() {
        let mut log = SessionLog::new(100);
        log.append_chat(Seat::X, "  hello ").unwrap();
        log.append_chat(Seat::O, "hi").unwrap();

        let lines: Vec<_> = log
            .chat()
            .iter()
            .map(|e| (e.player, e.message.as_str()))
            .collect();
        assert_eq!(lines, vec![(Seat::X, "hello"), (Seat::O, "hi")]);
    }

    #[test]
    fn test_blank_and_long_chat_rejected() {
        let mut log = SessionLog::new(5);
        assert!(log.append_chat(Seat::X, "   ").is_none());
        assert!(log.append_chat(Seat::X, "toolong").is_none());
        assert!(log.append_chat(Seat::X, "fine!").is_some());
        assert_eq!(log.chat().len(), 1);
    }

    #[test]
    fn test_results_accumulate() {
        let mut log = SessionLog::new(100);
        log.append_result(Outcome::Winner(Seat::X), EndReason::Normal);
        let history = log.append_result(Outcome::Draw, EndReason::Normal);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].winner, Outcome::Draw);
    }

    #[test]
    fn test_clear_wipes_both() {
        let mut log = SessionLog::new(100);
        log.append_chat(Seat::O, "gg");
        log.append_result(Outcome::Winner(Seat::O), EndReason::Timeout);
        log.clear();
        assert!(log.chat().is_empty());
        assert!(log.results().is_empty());
    }

    #[test]
    fn test_outcome_wire_format() {
        assert_eq!(
            serde_json::to_value(Outcome::Winner(Seat::O)).unwrap(),
            serde_json::json!("O")
        );
        assert_eq!(
            serde_json::to_value(Outcome::Draw).unwrap(),
            serde_json::json!("draw")
        );
        assert_eq!(
            serde_json::to_value(EndReason::Timeout).unwrap(),
            serde_json::json!("timeout")
        );
    }
}
