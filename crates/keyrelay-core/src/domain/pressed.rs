//! The set of inputs this client currently considers held down.
//!
//! Operating systems repeat `keydown` while a key is held.  Forwarding every
//! repeat would flood the peer with presses it never asked for, so the
//! dispatcher consults this set before sending anything:
//!
//! - a `down` is sent only if the input was not already active;
//! - an `up` is sent only if the input was active.
//!
//! The set is cleared when the connection drops.  A key still held across a
//! reconnect is then sent again as a fresh `down` instead of being swallowed
//! as a repeat the peer never saw the start of.
//!
//! Membership is kept in insertion order so the status view lists inputs in
//! the order they were pressed.  A human holds only a handful of inputs at
//! once, so linear scans are fine.

use std::fmt;

use super::input::InputId;

/// Inputs for which a `down` was sent with no matching `up` since.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PressedKeySet {
    active: Vec<InputId>,
}

impl PressedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` active.
    ///
    /// Returns `true` if it was inactive (the caller should send a `down`),
    /// `false` if it was already active (auto-repeat; send nothing).
    pub fn activate(&mut self, id: &InputId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.active.push(id.clone());
        true
    }

    /// Marks `id` inactive.
    ///
    /// Returns `true` if it was active (the caller should send an `up`),
    /// `false` if it was not (spurious or duplicate release; send nothing).
    pub fn deactivate(&mut self, id: &InputId) -> bool {
        match self.active.iter().position(|held| held == id) {
            Some(index) => {
                self.active.remove(index);
                true
            }
            None => false,
        }
    }

    /// Forgets every active input.
    pub fn reset(&mut self) {
        self.active.clear();
    }

    pub fn contains(&self, id: &InputId) -> bool {
        self.active.iter().any(|held| held == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Active inputs, oldest press first.
    pub fn iter(&self) -> impl Iterator<Item = &InputId> {
        self.active.iter()
    }
}

/// Renders the set as `KeyW, KeyD`, or `(none)` when empty.
impl fmt::Display for PressedKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.active.is_empty() {
            return f.write_str("(none)");
        }
        for (i, id) in self.active.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(id.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> InputId {
        InputId::from(s)
    }

    #[test]
    fn test_first_activate_returns_true() {
        // Arrange
        let mut set = PressedKeySet::new();

        // Act
        let accepted = set.activate(&key("KeyW"));

        // Assert
        assert!(accepted);
        assert!(set.contains(&key("KeyW")));
    }

    #[test]
    fn test_repeated_activate_is_suppressed() {
        let mut set = PressedKeySet::new();
        set.activate(&key("KeyW"));

        // Every further down without an up is auto-repeat
        for _ in 0..5 {
            assert!(!set.activate(&key("KeyW")));
        }
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_deactivate_without_activate_returns_false() {
        let mut set = PressedKeySet::new();
        assert!(!set.deactivate(&key("KeyW")));
    }

    #[test]
    fn test_deactivate_after_activate_returns_true_once() {
        let mut set = PressedKeySet::new();
        set.activate(&key("KeyW"));

        assert!(set.deactivate(&key("KeyW")));
        assert!(!set.deactivate(&key("KeyW")), "duplicate up must be ignored");
        assert!(set.is_empty());
    }

    #[test]
    fn test_reset_allows_reactivation() {
        // Arrange: key held when the connection dropped
        let mut set = PressedKeySet::new();
        set.activate(&key("KeyW"));

        // Act
        set.reset();

        // Assert: the same key is a fresh press again
        assert!(set.is_empty());
        assert!(set.activate(&key("KeyW")));
    }

    #[test]
    fn test_display_lists_in_press_order() {
        let mut set = PressedKeySet::new();
        set.activate(&key("KeyW"));
        set.activate(&key("KeyD"));
        set.activate(&key("Space"));
        set.deactivate(&key("KeyD"));

        assert_eq!(set.to_string(), "KeyW, Space");
    }

    #[test]
    fn test_display_empty_set() {
        assert_eq!(PressedKeySet::new().to_string(), "(none)");
    }
}
