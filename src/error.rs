use thiserror::Error;

/// Everything that can go wrong while fetching or reconciling a comic.
///
/// None of these are fatal: the widget keeps its last good state and the
/// next selection change or refresh interval tries again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComicError {
    #[error("network request failed: {0}")]
    Transport(String),

    #[error("malformed comic response: {0}")]
    MalformedResponse(String),

    #[error("gateway reported latest comic {reported}, but {known} is already known")]
    Regression { known: u32, reported: u32 },

    #[error("not a comic number: {0:?}")]
    InvalidNumber(String),
}

impl From<reqwest::Error> for ComicError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ComicError::MalformedResponse(err.to_string())
        } else {
            ComicError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_message_names_both_numbers() {
        let msg = ComicError::Regression { known: 800, reported: 799 }.to_string();
        assert!(msg.contains("800"));
        assert!(msg.contains("799"));
    }

    #[test]
    fn test_invalid_number_quotes_input() {
        let msg = ComicError::InvalidNumber("abc".to_string()).to_string();
        assert_eq!(msg, "not a comic number: \"abc\"");
    }
}
