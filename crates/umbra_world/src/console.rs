//! Developer console
//!
//! Commands are recognized by prefix, so `che f` is enough for
//! `cheat full`. Input is lower-cased and runs of spaces are collapsed
//! before matching. The last word of the input may be partial; every word
//! before it must match exactly.
//!
//! When a command is exactly as long as the typed prefix, it wins over
//! longer commands sharing that prefix. This is what lets `insert` take an
//! argument.

use crate::world::World;
use umbra_ai::Attribute;

/// What a console line resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Empty input
    None,
    /// Nothing matches
    Invalid,
    /// More than one command matches, or the match is not complete yet
    Incomplete,
    CheatFull,
    CamAutoswitch,
    CamMode,
    ToggleCamDebug,
    ToggleCamera,
    Insert,
}

/// A console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub text: &'static str,
    pub kind: CommandKind,
}

/// Result of [`CommandRecognizer::recognize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recognized {
    pub kind: CommandKind,
    /// The single candidate, if there is one
    pub command: Option<&'static str>,
    /// Length of the matched part of the normalized input
    pub offset: usize,
}

impl Recognized {
    fn bare(kind: CommandKind) -> Self {
        Self {
            kind,
            command: None,
            offset: 0,
        }
    }
}

/// Prefix matcher over the command table
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    commands: Vec<Command>,
}

impl Default for CommandRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRecognizer {
    /// Recognizer with the built-in commands
    pub fn new() -> Self {
        let command = |text, kind| Command { text, kind };
        Self {
            commands: vec![
                command("cheat full", CommandKind::CheatFull),
                command("camera autoswitch", CommandKind::CamAutoswitch),
                command("camera mode", CommandKind::CamMode),
                command("toogle camdebug", CommandKind::ToggleCamDebug),
                command("toogle camera", CommandKind::ToggleCamera),
                command("insert", CommandKind::Insert),
            ],
        }
    }

    /// Command table
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Match `input` against the command table
    pub fn recognize(&self, input: &str) -> Recognized {
        let clean = normalize(input);
        let typed = clean.as_bytes();
        let mut cmd_len = typed.len();
        if cmd_len == 0 {
            return Recognized::bare(CommandKind::None);
        }
        let prefix = typed.iter().rposition(|&b| b == b' ').unwrap_or(0);

        let mut count = 0;
        let mut suggestion: Option<&Command> = None;
        let mut suggestion_len = 0;

        for command in &self.commands {
            let text = command.text.as_bytes();
            let len = text.len();
            if len < prefix || typed[..prefix] != text[..prefix] {
                continue;
            }

            if cmd_len <= len && typed[..cmd_len] == text[..cmd_len] {
                let mut end = cmd_len;
                while end < len && text[end] != b' ' {
                    end += 1;
                }
                let same_word = suggestion
                    .map(|s| end == suggestion_len && s.text.as_bytes().get(..end) == Some(&text[..end]))
                    .unwrap_or(false);
                if !same_word {
                    suggestion = Some(command);
                    suggestion_len = end;
                    count += 1;
                }
            } else if prefix == len {
                cmd_len = prefix;
                suggestion = Some(command);
                suggestion_len = 0;
                count += 1;
            }
        }

        let Some(found) = suggestion.filter(|_| count > 0) else {
            return Recognized::bare(CommandKind::Invalid);
        };
        if count != 1 {
            return Recognized::bare(CommandKind::Incomplete);
        }

        let kind = if found.text.len() == cmd_len {
            found.kind
        } else {
            CommandKind::Incomplete
        };
        Recognized {
            kind,
            command: Some(found.text),
            offset: cmd_len,
        }
    }

    /// Extend `input` up to the end of the next word of the only candidate
    pub fn auto_complete(&self, input: &mut String) {
        let found = self.recognize(input);
        let (CommandKind::Incomplete, Some(text)) = (found.kind, found.command) else {
            return;
        };
        for c in text[found.offset.min(text.len())..].chars() {
            input.push(c);
            if c == ' ' {
                return;
            }
        }
    }

    /// Run a console line; false if it did not resolve to a command or the
    /// command failed
    pub fn exec(&self, world: &mut World, input: &str) -> bool {
        let found = self.recognize(input);
        match found.kind {
            CommandKind::None => true,
            CommandKind::Incomplete | CommandKind::Invalid => false,
            CommandKind::CheatFull => {
                if let Some(player) = world.player() {
                    let max = world
                        .actor(player)
                        .map(|a| a.attributes.get(Attribute::HitpointsMax))
                        .unwrap_or(0);
                    if let Err(err) = world.change_attribute(player, Attribute::Hitpoints, max, false, None) {
                        log::warn!("cheat full: {}", err);
                    }
                }
                true
            }
            CommandKind::CamAutoswitch
            | CommandKind::CamMode
            | CommandKind::ToggleCamDebug
            | CommandKind::ToggleCamera => true,
            CommandKind::Insert => {
                let clean = normalize(input);
                let argument = clean.get(found.offset..).unwrap_or("").trim();
                if argument.is_empty() {
                    return false;
                }
                let Some(pos) = world.player().and_then(|p| world.actor(p)).map(|a| a.position) else {
                    return false;
                };
                let ground = world.physics().drop_ray(pos[0], pos[1] + 1.0, pos[2]);
                let at = if ground.has_col { ground.point } else { pos };
                world.insert_by_symbol_name(argument, at)
            }
        }
    }
}

/// Lower-case, drop leading spaces and collapse runs of spaces
fn normalize(input: &str) -> String {
    let mut clean = String::with_capacity(input.len());
    for c in input.chars().take(255) {
        let c = c.to_ascii_lowercase();
        if c == ' ' && (clean.is_empty() || clean.ends_with(' ')) {
            continue;
        }
        clean.push(c);
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_command() {
        let console = CommandRecognizer::new();
        let found = console.recognize("  CHEAT   full");
        assert_eq!(found.kind, CommandKind::CheatFull);
        assert_eq!(found.offset, "cheat full".len());
    }

    #[test]
    fn test_partial_word_is_incomplete() {
        let console = CommandRecognizer::new();
        let found = console.recognize("che");
        assert_eq!(found.kind, CommandKind::Incomplete);
        assert_eq!(found.command, Some("cheat full"));
        assert_eq!(found.offset, 3);
    }

    #[test]
    fn test_shared_first_word_is_single_candidate() {
        let console = CommandRecognizer::new();
        let found = console.recognize("camera");
        assert_eq!(found.kind, CommandKind::Incomplete);
        assert_eq!(found.command, Some("camera autoswitch"));

        let mut line = String::from("camera");
        console.auto_complete(&mut line);
        assert_eq!(line, "camera ");
    }

    #[test]
    fn test_ambiguous_second_word() {
        let console = CommandRecognizer::new();
        let found = console.recognize("toogle cam");
        assert_eq!(found.kind, CommandKind::Incomplete);
        assert_eq!(found.command, None);
    }

    #[test]
    fn test_auto_complete_last_word() {
        let console = CommandRecognizer::new();
        let mut line = String::from("camera m");
        console.auto_complete(&mut line);
        assert_eq!(line, "camera mode");
        assert_eq!(console.recognize(&line).kind, CommandKind::CamMode);
    }

    #[test]
    fn test_exact_length_prefix_takes_argument() {
        let console = CommandRecognizer::new();
        let found = console.recognize("insert itfo_apple");
        assert_eq!(found.kind, CommandKind::Insert);
        assert_eq!(found.offset, 6);
        assert_eq!(console.recognize("insert").kind, CommandKind::Insert);
    }

    #[test]
    fn test_invalid_and_empty() {
        let console = CommandRecognizer::new();
        assert_eq!(console.recognize("xyzzy").kind, CommandKind::Invalid);
        assert_eq!(console.recognize("cheat half").kind, CommandKind::Invalid);
        assert_eq!(console.recognize("   ").kind, CommandKind::None);
    }
}
