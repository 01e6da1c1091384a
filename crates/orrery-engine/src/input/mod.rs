//! Keyboard and UI input, translated to store commands.
//!
//! Key codes are DOM `keyCode` values. `?` (help dialog) is handled by the
//! UI and never reaches the engine.

pub mod queue;

pub use queue::{InputEvent, InputQueue};

use crate::bodies::Body;
use crate::core::instant::Instant;
use crate::store::Selection;

pub const KEY_SPACE: u32 = 32;
pub const KEY_END: u32 = 35;
pub const KEY_HOME: u32 = 36;
pub const KEY_LEFT: u32 = 37;
pub const KEY_UP: u32 = 38;
pub const KEY_RIGHT: u32 = 39;
pub const KEY_DOWN: u32 = 40;
pub const KEY_C: u32 = 67;
pub const KEY_L: u32 = 76;
pub const KEY_O: u32 = 79;

/// `Custom` event kinds.
pub const CUSTOM_SET_SPEED: u32 = 1;
/// `a` = body id, or -1 to clear.
pub const CUSTOM_SELECT_BODY: u32 = 2;
/// `a` = days from J2000.
pub const CUSTOM_SET_INSTANT: u32 = 3;

/// Something the engine should do to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleOrbits,
    ToggleLabels,
    ToggleCinematic,
    TogglePause,
    Select(Selection),
    SetSpeed(f64),
    SetInstant(Instant),
}

impl Command {
    pub fn from_key(key_code: u32) -> Option<Command> {
        let command = match key_code {
            KEY_O => Command::ToggleOrbits,
            KEY_L => Command::ToggleLabels,
            KEY_C => Command::ToggleCinematic,
            KEY_SPACE => Command::TogglePause,
            KEY_RIGHT | KEY_DOWN => Command::Select(Selection::Next),
            KEY_LEFT | KEY_UP => Command::Select(Selection::Previous),
            KEY_HOME => Command::Select(Selection::First),
            KEY_END => Command::Select(Selection::Last),
            _ => return None,
        };
        Some(command)
    }

    pub fn from_custom(kind: u32, a: f64) -> Option<Command> {
        match kind {
            CUSTOM_SET_SPEED if a.is_finite() => Some(Command::SetSpeed(a)),
            CUSTOM_SELECT_BODY if a.is_finite() => {
                if a < 0.0 {
                    Some(Command::Select(Selection::None))
                } else {
                    Body::from_id(a as u32).map(|b| Command::Select(Selection::Body(b)))
                }
            }
            CUSTOM_SET_INSTANT if a.is_finite() => {
                Some(Command::SetInstant(Instant::from_days(a)))
            }
            _ => {
                log::debug!("Unhandled custom event kind={} a={}", kind, a);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_map() {
        assert_eq!(Command::from_key(KEY_O), Some(Command::ToggleOrbits));
        assert_eq!(Command::from_key(KEY_SPACE), Some(Command::TogglePause));
        assert_eq!(Command::from_key(KEY_DOWN), Some(Command::Select(Selection::Next)));
        assert_eq!(Command::from_key(KEY_UP), Some(Command::Select(Selection::Previous)));
        assert_eq!(Command::from_key(KEY_END), Some(Command::Select(Selection::Last)));
        // '?' is the help dialog
        assert_eq!(Command::from_key(191), None);
    }

    #[test]
    fn custom_events() {
        assert_eq!(Command::from_custom(CUSTOM_SET_SPEED, -10.0), Some(Command::SetSpeed(-10.0)));
        assert_eq!(
            Command::from_custom(CUSTOM_SELECT_BODY, 4.0),
            Some(Command::Select(Selection::Body(Body::Mars)))
        );
        assert_eq!(
            Command::from_custom(CUSTOM_SELECT_BODY, -1.0),
            Some(Command::Select(Selection::None))
        );
        assert_eq!(Command::from_custom(CUSTOM_SELECT_BODY, 99.0), None);
        assert_eq!(Command::from_custom(CUSTOM_SET_SPEED, f64::NAN), None);
        assert_eq!(Command::from_custom(42, 0.0), None);
    }
}
