//! Operator command vocabulary.

/// Every phrase the operator can type, in display order.
pub const VOCABULARY: [&str; 10] = [
    "stop",
    "display",
    "get link",
    "best move",
    "analyze",
    "play by time",
    "manual",
    "auto",
    "quit",
    "swap2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Stop,
    Display,
    GetLink,
    BestMove,
    Analyze,
    PlayByTime,
    Manual,
    Auto,
    Quit,
    Swap2,
}

impl OperatorCommand {
    /// Map a vocabulary entry (as returned by the matcher) to its command.
    pub fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "stop" => Self::Stop,
            "display" => Self::Display,
            "get link" => Self::GetLink,
            "best move" => Self::BestMove,
            "analyze" => Self::Analyze,
            "play by time" => Self::PlayByTime,
            "manual" => Self::Manual,
            "auto" => Self::Auto,
            "quit" => Self::Quit,
            "swap2" => Self::Swap2,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_word_maps_to_a_command() {
        for word in VOCABULARY {
            assert!(OperatorCommand::from_word(word).is_some(), "{word}");
        }
        assert_eq!(OperatorCommand::from_word("resign"), None);
    }
}
