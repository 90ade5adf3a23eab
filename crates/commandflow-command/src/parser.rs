//! Substring matching of recognized text against the known phrase set.

use crate::types::{Command, CursorTarget};

const MOVE_MOUSE_PHRASES: &[&str] = &["move mouse", "move the mouse"];
const CLOSE_WINDOW_PHRASES: &[&str] = &["exit window", "close window"];

/// Parse recognized text into a command, if any phrase matches.
///
/// Matching is case-insensitive substring search, so filler words around the
/// phrase ("please move the mouse now") still match. Unrecognized text is
/// simply `None`.
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.to_lowercase();
    let text = text.trim();

    if MOVE_MOUSE_PHRASES.iter().any(|p| text.contains(p)) {
        let target = if text.contains("top right") {
            CursorTarget::TopRight
        } else {
            CursorTarget::Default
        };
        return Some(Command::MoveCursor { target });
    }

    if CLOSE_WINDOW_PHRASES.iter().any(|p| text.contains(p)) {
        return Some(Command::CloseWindow);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_mouse_variants() {
        assert_eq!(
            parse_command("move mouse"),
            Some(Command::MoveCursor {
                target: CursorTarget::Default
            })
        );
        assert_eq!(
            parse_command("Move The Mouse"),
            Some(Command::MoveCursor {
                target: CursorTarget::Default
            })
        );
    }

    #[test]
    fn top_right_modifier() {
        assert_eq!(
            parse_command("move the mouse to the top right"),
            Some(Command::MoveCursor {
                target: CursorTarget::TopRight
            })
        );
    }

    #[test]
    fn close_window_variants() {
        assert_eq!(parse_command("exit window"), Some(Command::CloseWindow));
        assert_eq!(
            parse_command("please close window now"),
            Some(Command::CloseWindow)
        );
    }

    #[test]
    fn embedded_phrase_matches() {
        assert_eq!(
            parse_command("  Could you MOVE MOUSE please "),
            Some(Command::MoveCursor {
                target: CursorTarget::Default
            })
        );
    }

    #[test]
    fn move_wins_when_both_phrases_present() {
        // first matching category takes precedence, like the original scripts
        assert_eq!(
            parse_command("move mouse then close window"),
            Some(Command::MoveCursor {
                target: CursorTarget::Default
            })
        );
    }

    #[test]
    fn unrelated_text_is_no_match() {
        assert_eq!(parse_command("what a lovely day"), None);
        assert_eq!(parse_command(""), None);
        // reversed word order must not trigger
        assert_eq!(parse_command("the mouse moved"), None);
    }

    #[test]
    fn substring_matching_fires_inside_larger_words() {
        // "remove mouse" contains "move mouse"; substring matching accepts it
        assert_eq!(
            parse_command("remove mouse pad"),
            Some(Command::MoveCursor {
                target: CursorTarget::Default
            })
        );
    }

    #[test]
    fn top_right_without_move_phrase_is_no_match() {
        assert_eq!(parse_command("top right"), None);
    }
}
