//! Input identifiers and on-screen control pads.
//!
//! An [`InputId`] is an opaque string naming a physical or logical control,
//! typically a DOM-style key code such as `"KeyW"` or `"ArrowUp"`.  Two ids are
//! the same input iff their strings are equal.
//!
//! A [`ControlPad`] maps named on-screen controls to the input ids they
//! drive.  Most controls drive a single id; *combo* controls (for example a
//! diagonal-movement button) drive several, declared as a comma-separated
//! list such as `"KeyW, KeyD"`.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::protocol::messages::Direction;

// ── InputId ───────────────────────────────────────────────────────────────────

/// Opaque identifier of a control, compared by exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(String);

impl InputId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Picks the identifier for a keyboard event.
    ///
    /// Keyboards report both a layout-independent `code` (`"KeyW"`) and a
    /// layout-dependent `key` (`"w"`).  The code is preferred; the key is
    /// used only when the code is empty.  Returns `None` when both are empty.
    pub fn from_code_or_key(code: &str, key: &str) -> Option<Self> {
        if !code.is_empty() {
            Some(Self::new(code))
        } else if !key.is_empty() {
            Some(Self::new(key))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for InputId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InputId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InputId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Splits a comma-separated combo declaration into input ids.
///
/// Items are trimmed and empty items are dropped, so `" KeyW, ,KeyD "`
/// yields `["KeyW", "KeyD"]`.
pub fn parse_codes(list: &str) -> Vec<InputId> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(InputId::from)
        .collect()
}

// ── Input commands ────────────────────────────────────────────────────────────

/// A user intent delivered by an input source to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// A keyboard key transition.
    Key {
        direction: Direction,
        input: InputId,
        /// The OS flagged this signal as auto-repeat.
        repeat: bool,
    },
    /// A press or release of a named on-screen control.
    Control { direction: Direction, name: String },
    /// Report the current status snapshot.
    ShowStatus,
    /// Stop the client.
    Quit,
}

// ── Control pad ───────────────────────────────────────────────────────────────

/// Errors raised while defining pad controls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// The control declared neither a code nor a non-empty combo.
    #[error("control '{0}' declares no input codes")]
    Empty(String),

    /// Two controls share a name.
    #[error("control '{0}' is defined more than once")]
    Duplicate(String),
}

/// Named on-screen controls and the input ids each one drives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlPad {
    controls: BTreeMap<String, Vec<InputId>>,
}

impl ControlPad {
    /// Creates an empty pad.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock driving layout: WASD, Space to stop, and four diagonals.
    pub fn with_defaults() -> Self {
        const DEFAULTS: &[(&str, &str)] = &[
            ("forward", "KeyW"),
            ("backward", "KeyS"),
            ("left", "KeyA"),
            ("right", "KeyD"),
            ("stop", "Space"),
            ("forward-left", "KeyW,KeyA"),
            ("forward-right", "KeyW,KeyD"),
            ("backward-left", "KeyS,KeyA"),
            ("backward-right", "KeyS,KeyD"),
        ];

        let controls = DEFAULTS
            .iter()
            .map(|(name, codes)| ((*name).to_string(), parse_codes(codes)))
            .collect();
        Self { controls }
    }

    /// Adds a control driving `codes`.
    pub fn define(&mut self, name: &str, codes: Vec<InputId>) -> Result<(), ControlError> {
        if codes.is_empty() {
            return Err(ControlError::Empty(name.to_string()));
        }
        if self.controls.contains_key(name) {
            return Err(ControlError::Duplicate(name.to_string()));
        }
        self.controls.insert(name.to_string(), codes);
        Ok(())
    }

    /// Adds a control from its two declaration attributes.
    ///
    /// A `combo` list takes precedence over a single `code`, matching how
    /// pad buttons are declared in page markup.
    pub fn define_from_attrs(
        &mut self,
        name: &str,
        code: Option<&str>,
        combo: Option<&str>,
    ) -> Result<(), ControlError> {
        let codes = match (combo, code) {
            (Some(list), _) => parse_codes(list),
            (None, Some(single)) => parse_codes(single).into_iter().take(1).collect(),
            (None, None) => Vec::new(),
        };
        self.define(name, codes)
    }

    /// The input ids driven by control `name`, if it exists.
    pub fn codes(&self, name: &str) -> Option<&[InputId]> {
        self.controls.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_ids_compare_by_exact_string() {
        assert_eq!(InputId::from("KeyW"), InputId::new("KeyW".to_string()));
        assert_ne!(InputId::from("KeyW"), InputId::from("keyw"));
    }

    #[test]
    fn test_from_code_or_key_prefers_code() {
        assert_eq!(
            InputId::from_code_or_key("KeyW", "w"),
            Some(InputId::from("KeyW"))
        );
    }

    #[test]
    fn test_from_code_or_key_falls_back_to_key() {
        assert_eq!(
            InputId::from_code_or_key("", "Unidentified"),
            Some(InputId::from("Unidentified"))
        );
        assert_eq!(InputId::from_code_or_key("", ""), None);
    }

    #[test]
    fn test_parse_codes_trims_and_drops_empty_items() {
        // Arrange / Act
        let codes = parse_codes(" KeyW, ,KeyD ,");

        // Assert
        assert_eq!(codes, vec![InputId::from("KeyW"), InputId::from("KeyD")]);
    }

    #[test]
    fn test_default_pad_has_diagonal_combos() {
        let pad = ControlPad::with_defaults();

        assert_eq!(
            pad.codes("forward-right"),
            Some(&[InputId::from("KeyW"), InputId::from("KeyD")][..])
        );
        assert_eq!(pad.codes("stop"), Some(&[InputId::from("Space")][..]));
        assert_eq!(pad.len(), 9);
    }

    #[test]
    fn test_combo_attribute_takes_precedence_over_code() {
        // Arrange
        let mut pad = ControlPad::new();

        // Act
        pad.define_from_attrs("diag", Some("KeyQ"), Some("KeyW,KeyA"))
            .unwrap();

        // Assert
        assert_eq!(
            pad.codes("diag"),
            Some(&[InputId::from("KeyW"), InputId::from("KeyA")][..])
        );
    }

    #[test]
    fn test_control_without_codes_is_rejected() {
        let mut pad = ControlPad::new();

        let result = pad.define_from_attrs("blank", None, Some(" , "));

        assert_eq!(result, Err(ControlError::Empty("blank".to_string())));
        assert!(pad.is_empty());
    }

    #[test]
    fn test_duplicate_control_is_rejected() {
        let mut pad = ControlPad::new();
        pad.define("up", vec![InputId::from("ArrowUp")]).unwrap();

        let result = pad.define("up", vec![InputId::from("KeyW")]);

        assert_eq!(result, Err(ControlError::Duplicate("up".to_string())));
        assert_eq!(pad.codes("up"), Some(&[InputId::from("ArrowUp")][..]));
    }

    #[test]
    fn test_unknown_control_has_no_codes() {
        let pad = ControlPad::with_defaults();
        assert_eq!(pad.codes("jump"), None);
    }
}
