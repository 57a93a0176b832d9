use chrono::{DateTime, Utc};

use crate::comic::{Comic, ComicId};
use crate::error::ComicError;

/// Whether the widget tracks the newest strip or a specific one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    FollowLatest,
    Pinned,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::FollowLatest => Mode::Pinned,
            Mode::Pinned => Mode::FollowLatest,
        }
    }
}

/// Persisted state of one comic widget.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub mode: Mode,
    /// Only consulted while `mode` is `Pinned`.
    pub pinned_number: Option<u32>,
    /// Highest strip number seen so far. Never decreases.
    pub known_latest: Option<u32>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub loaded_comic: Option<Comic>,
}

impl SelectionState {
    /// Parses and clamps `raw`, then pins it and drops the loaded comic.
    pub fn select_number(&mut self, raw: &str) -> Result<u32, ComicError> {
        let number = normalize(raw, self.known_latest)?;
        self.mode = Mode::Pinned;
        self.pinned_number = Some(number);
        self.loaded_comic = None;
        Ok(number)
    }

    /// Switches mode, keeping the pin and the bound so switching back restores
    /// the previous choice. Setting the current mode again is a no-op.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            self.mode = mode;
            self.loaded_comic = None;
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    /// Records a newly observed latest number. Returns `false` (and leaves the
    /// state alone) when it is lower than what is already known.
    pub(crate) fn raise_known_latest(&mut self, reported: u32, at: DateTime<Utc>) -> bool {
        if self.known_latest.is_some_and(|known| reported < known) {
            return false;
        }
        self.known_latest = Some(reported);
        self.last_refreshed_at = Some(at);

        match self.pinned_number {
            Some(pin) if pin > reported => self.pinned_number = Some(reported),
            None => self.pinned_number = Some(reported),
            _ => {}
        }
        true
    }
}

/// Which strip the widget should be showing right now.
pub fn resolve_target(state: &SelectionState) -> ComicId {
    match (state.mode, state.pinned_number) {
        (Mode::Pinned, Some(pin)) if state.known_latest.is_none_or(|known| pin <= known) => {
            ComicId::Number(pin)
        }
        _ => ComicId::Latest,
    }
}

/// Parses user input into a strip number within `[1, known_latest]`.
///
/// Without a known bound only the lower end is clamped.
pub fn normalize(raw: &str, known_latest: Option<u32>) -> Result<u32, ComicError> {
    let trimmed = raw.trim();
    let parsed: i64 = trimmed
        .parse()
        .map_err(|_| ComicError::InvalidNumber(trimmed.to_string()))?;
    Ok(clamp_number(parsed, known_latest))
}

pub fn clamp_number(value: i64, known_latest: Option<u32>) -> u32 {
    let upper = known_latest.map_or(i64::from(u32::MAX), |known| i64::from(known.max(1)));
    // value.clamp(1, upper) is always within u32 range
    u32::try_from(value.clamp(1, upper)).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn comic(num: u32) -> Comic {
        Comic {
            identifier: num,
            title: format!("Comic {num}"),
            image_url: format!("https://imgs.example/{num}.png"),
            alt_text: String::new(),
        }
    }

    fn pinned(pin: Option<u32>, known: Option<u32>) -> SelectionState {
        SelectionState {
            mode: Mode::Pinned,
            pinned_number: pin,
            known_latest: known,
            ..SelectionState::default()
        }
    }

    #[test]
    fn test_default_follows_latest() {
        let state = SelectionState::default();
        assert_eq!(state.mode, Mode::FollowLatest);
        assert_eq!(resolve_target(&state), ComicId::Latest);
    }

    #[test]
    fn test_pinned_without_number_resolves_latest() {
        assert_eq!(resolve_target(&pinned(None, Some(100))), ComicId::Latest);
    }

    #[test]
    fn test_pinned_without_bound_uses_pin() {
        assert_eq!(resolve_target(&pinned(Some(5000), None)), ComicId::Number(5000));
    }

    proptest! {
        #[test]
        fn prop_follow_latest_ignores_pin(pin in proptest::option::of(1u32..10_000), known in proptest::option::of(1u32..10_000)) {
            let state = SelectionState {
                mode: Mode::FollowLatest,
                pinned_number: pin,
                known_latest: known,
                ..SelectionState::default()
            };
            prop_assert_eq!(resolve_target(&state), ComicId::Latest);
        }

        #[test]
        fn prop_in_range_pin_is_target((known, pin) in (1u32..10_000).prop_flat_map(|k| (Just(k), 1..=k))) {
            prop_assert_eq!(resolve_target(&pinned(Some(pin), Some(known))), ComicId::Number(pin));
        }

        #[test]
        fn prop_out_of_range_pin_falls_back((known, pin) in (1u32..10_000).prop_flat_map(|k| (Just(k), (k + 1)..20_000))) {
            prop_assert_eq!(resolve_target(&pinned(Some(pin), Some(known))), ComicId::Latest);
        }

        #[test]
        fn prop_normalize_stays_in_bounds(value in any::<i64>(), known in 1u32..10_000) {
            let n = normalize(&value.to_string(), Some(known)).unwrap();
            prop_assert!((1..=known).contains(&n));
        }
    }

    #[rstest]
    #[case("0", Some(500), 1)]
    #[case("600", Some(500), 500)]
    #[case("42", Some(500), 42)]
    #[case("42", None, 42)]
    #[case("-7", None, 1)]
    #[case(" 12 ", Some(500), 12)]
    #[case("99999999999", Some(500), 500)]
    #[case("99999999999", None, u32::MAX)]
    fn test_normalize(#[case] raw: &str, #[case] known: Option<u32>, #[case] expected: u32) {
        assert_eq!(normalize(raw, known).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("4.5")]
    fn test_normalize_rejects_garbage(#[case] raw: &str) {
        assert!(matches!(normalize(raw, Some(10)), Err(ComicError::InvalidNumber(_))));
    }

    #[test]
    fn test_select_number_pins_and_clears_comic() {
        let mut state = SelectionState {
            known_latest: Some(500),
            loaded_comic: Some(comic(500)),
            ..SelectionState::default()
        };
        let refreshed = Some(Utc::now());
        state.last_refreshed_at = refreshed;

        assert_eq!(state.select_number("600").unwrap(), 500);
        assert_eq!(state.mode, Mode::Pinned);
        assert_eq!(state.pinned_number, Some(500));
        assert_eq!(state.loaded_comic, None);
        assert_eq!(state.last_refreshed_at, refreshed);
    }

    #[test]
    fn test_select_number_invalid_leaves_state() {
        let mut state = SelectionState {
            loaded_comic: Some(comic(3)),
            ..SelectionState::default()
        };
        let before = state.clone();
        assert!(state.select_number("x").is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_toggle_preserves_pin_and_bound() {
        let mut state = pinned(Some(10), Some(2955));
        state.loaded_comic = Some(comic(10));

        state.toggle_mode();
        assert_eq!(state.mode, Mode::FollowLatest);
        assert_eq!(state.loaded_comic, None);
        assert_eq!(state.pinned_number, Some(10));
        assert_eq!(state.known_latest, Some(2955));

        state.toggle_mode();
        assert_eq!(resolve_target(&state), ComicId::Number(10));
    }

    #[test]
    fn test_set_same_mode_keeps_comic() {
        let mut state = pinned(Some(10), Some(2955));
        state.loaded_comic = Some(comic(10));
        state.set_mode(Mode::Pinned);
        assert_eq!(state.loaded_comic, Some(comic(10)));
    }

    #[test]
    fn test_raise_known_latest_clamps_pin() {
        let mut state = pinned(Some(3000), None);
        let now = Utc::now();
        assert!(state.raise_known_latest(2955, now));
        assert_eq!(state.known_latest, Some(2955));
        assert_eq!(state.pinned_number, Some(2955));
        assert_eq!(state.last_refreshed_at, Some(now));
    }

    #[test]
    fn test_raise_known_latest_rejects_regression() {
        let mut state = pinned(Some(10), Some(800));
        let before = state.clone();
        assert!(!state.raise_known_latest(799, Utc::now()));
        assert_eq!(state, before);
    }
}
