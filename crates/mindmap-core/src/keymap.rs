//! Normal-mode key sequences.
//!
//! A [`KeySequence`] turns keystrokes such as `5j`, `dd` or `za` into command lines for
//! [`execute_line`](crate::execute_line). Bindings live in a [`Keymap`]; counted bindings
//! receive the typed count as `--count <n>`.

use std::collections::BTreeMap;

/// Key that opens the command line.
pub const COMMAND_LINE_KEY: char = ':';

/// Command bound to a key sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Command line to run.
    pub command: String,
    /// Whether a count prefix is forwarded as `--count`.
    pub counted: bool,
}

/// Key sequence to command bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: BTreeMap<String, Binding>,
}

impl Keymap {
    /// A keymap with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Bind `keys` to a command line. Replaces any existing binding.
    pub fn bind(&mut self, keys: impl Into<String>, command: impl Into<String>) {
        self.insert(keys.into(), command.into(), false);
    }

    /// Bind `keys` to a command that accepts a count.
    pub fn bind_counted(&mut self, keys: impl Into<String>, command: impl Into<String>) {
        self.insert(keys.into(), command.into(), true);
    }

    fn insert(&mut self, keys: String, command: String, counted: bool) {
        self.bindings.insert(keys, Binding { command, counted });
    }

    /// Exact binding for `keys`.
    pub fn lookup(&self, keys: &str) -> Option<&Binding> {
        self.bindings.get(keys)
    }

    /// Returns `true` if some longer binding starts with `keys`.
    pub fn is_prefix(&self, keys: &str) -> bool {
        self.bindings
            .range::<str, _>((std::ops::Bound::Excluded(keys), std::ops::Bound::Unbounded))
            .next()
            .is_some_and(|(bound, _)| bound.starts_with(keys))
    }

    /// All bindings ordered by key sequence.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(keys, binding)| (keys.as_str(), binding))
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        keymap.bind_counted("h", "left");
        keymap.bind_counted("j", "down");
        keymap.bind_counted("k", "up");
        keymap.bind_counted("l", "right");
        keymap.bind("dd", "delete --confirm");
        keymap.bind("yy", "copy");
        keymap.bind("za", "toggle");
        keymap.bind("zz", "center");
        keymap.bind("p", "paste");
        keymap.bind("u", "undo");
        keymap.bind("U", "redo");
        keymap.bind("o", "add-sibling");
        keymap.bind("a", "add-child");
        keymap.bind("i", "edit");
        keymap.bind("A", "append");
        keymap.bind("?", "help");
        keymap
    }
}

/// Result of feeding one key to a [`KeySequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// More keys are needed.
    Pending,
    /// A complete command line.
    Command(String),
    /// The command-line prompt should open.
    CommandLine,
    /// The typed keys match no binding; the sequence was reset.
    Unbound(String),
}

/// Accumulates normal-mode keys until they form a binding.
#[derive(Debug, Clone, Default)]
pub struct KeySequence {
    keymap: Keymap,
    count: Option<usize>,
    pending: String,
}

impl KeySequence {
    /// A sequence over `keymap`.
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            count: None,
            pending: String::new(),
        }
    }

    /// The keymap in use.
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Mutable access for rebinding at runtime.
    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    /// Keys typed so far, count included.
    pub fn pending(&self) -> String {
        match self.count {
            Some(count) => format!("{count}{}", self.pending),
            None => self.pending.clone(),
        }
    }

    /// Discard the partial sequence.
    pub fn reset(&mut self) {
        self.count = None;
        self.pending.clear();
    }

    /// Feed one key.
    pub fn push(&mut self, key: char) -> KeyOutcome {
        if self.pending.is_empty() {
            if let Some(digit) = key.to_digit(10) {
                // A leading zero is a key, not a count.
                if digit != 0 || self.count.is_some() {
                    let count = self.count.unwrap_or(0);
                    self.count = Some(count.saturating_mul(10).saturating_add(digit as usize));
                    return KeyOutcome::Pending;
                }
            }
            if key == COMMAND_LINE_KEY {
                self.reset();
                return KeyOutcome::CommandLine;
            }
        }

        self.pending.push(key);
        if let Some(binding) = self.keymap.lookup(&self.pending) {
            let command = match self.count {
                Some(count) if binding.counted => format!("{} --count {count}", binding.command),
                _ => binding.command.clone(),
            };
            self.reset();
            return KeyOutcome::Command(command);
        }
        if self.keymap.is_prefix(&self.pending) {
            return KeyOutcome::Pending;
        }

        let keys = self.pending();
        self.reset();
        KeyOutcome::Unbound(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(sequence: &mut KeySequence, keys: &str) -> Vec<KeyOutcome> {
        keys.chars().map(|key| sequence.push(key)).collect()
    }

    #[test]
    fn test_counted_motion() {
        let mut sequence = KeySequence::default();
        assert_eq!(
            feed(&mut sequence, "12j"),
            [
                KeyOutcome::Pending,
                KeyOutcome::Pending,
                KeyOutcome::Command("down --count 12".to_string()),
            ]
        );
        assert_eq!(sequence.push('k'), KeyOutcome::Command("up".to_string()));
    }

    #[test]
    fn test_zero_needs_a_leading_digit() {
        let mut sequence = KeySequence::default();
        assert_eq!(sequence.push('0'), KeyOutcome::Unbound("0".to_string()));
        feed(&mut sequence, "10");
        assert_eq!(sequence.pending(), "10");
        assert_eq!(sequence.push('l'), KeyOutcome::Command("right --count 10".to_string()));
    }

    #[test]
    fn test_multi_key_bindings() {
        let mut sequence = KeySequence::default();
        assert_eq!(sequence.push('d'), KeyOutcome::Pending);
        assert_eq!(
            sequence.push('d'),
            KeyOutcome::Command("delete --confirm".to_string())
        );
        assert_eq!(sequence.push('z'), KeyOutcome::Pending);
        assert_eq!(sequence.push('a'), KeyOutcome::Command("toggle".to_string()));
    }

    #[test]
    fn test_count_is_dropped_for_uncounted_bindings() {
        let mut sequence = KeySequence::default();
        assert_eq!(feed(&mut sequence, "3yy").pop(), Some(KeyOutcome::Command("copy".to_string())));
    }

    #[test]
    fn test_mismatch_resets() {
        let mut sequence = KeySequence::default();
        sequence.push('2');
        sequence.push('d');
        assert_eq!(sequence.push('x'), KeyOutcome::Unbound("2dx".to_string()));
        assert_eq!(sequence.pending(), "");
        assert_eq!(sequence.push('j'), KeyOutcome::Command("down".to_string()));
    }

    #[test]
    fn test_command_line_key() {
        let mut sequence = KeySequence::default();
        sequence.push('4');
        assert_eq!(sequence.push(':'), KeyOutcome::CommandLine);
        assert_eq!(sequence.pending(), "");
    }

    #[test]
    fn test_custom_bindings() {
        let mut keymap = Keymap::empty();
        keymap.bind("gg", "select root");
        assert!(keymap.is_prefix("g"));
        assert!(!keymap.is_prefix("gg"));
        assert!(!keymap.is_prefix("x"));

        let mut sequence = KeySequence::new(keymap);
        assert_eq!(
            feed(&mut sequence, "gg").pop(),
            Some(KeyOutcome::Command("select root".to_string()))
        );
        assert_eq!(sequence.push('j'), KeyOutcome::Unbound("j".to_string()));
    }
}
