//! Display labels in the supported languages.
//!
//! English is the default.  Brazilian Portuguese renders outcome lines such
//! as "Recebido: pressionar KeyW".

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::connection::ConnectionState;
use super::input::Direction;
use super::outcome::{Action, Command};

/// Language used for status and outcome labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    #[default]
    En,
    PtBr,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown locale '{0}' (expected 'en' or 'pt-br')")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Ok(Locale::En),
            "pt" | "pt-br" | "pt_br" => Ok(Locale::PtBr),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

impl Locale {
    pub fn direction(self, direction: Direction) -> &'static str {
        match (self, direction) {
            (Locale::En, Direction::Down) => "press",
            (Locale::En, Direction::Up) => "release",
            (Locale::PtBr, Direction::Down) => "pressionar",
            (Locale::PtBr, Direction::Up) => "soltar",
        }
    }

    pub fn command(self, command: Command) -> &'static str {
        match (self, command) {
            (Locale::En, Command::Forward) => "forward",
            (Locale::En, Command::Backward) => "backward",
            (Locale::En, Command::Left) => "left",
            (Locale::En, Command::Right) => "right",
            (Locale::En, Command::Stop) => "stop",
            (Locale::PtBr, Command::Forward) => "frente",
            (Locale::PtBr, Command::Backward) => "ré",
            (Locale::PtBr, Command::Left) => "esquerda",
            (Locale::PtBr, Command::Right) => "direita",
            (Locale::PtBr, Command::Stop) => "parar",
        }
    }

    pub fn action(self, action: Action) -> &'static str {
        match (self, action) {
            (Locale::En, Action::Start) => "Start",
            (Locale::En, Action::Stop) => "Stop",
            (Locale::PtBr, Action::Start) => "Iniciar",
            (Locale::PtBr, Action::Stop) => "Parar",
        }
    }

    pub fn received(self) -> &'static str {
        match self {
            Locale::En => "Received",
            Locale::PtBr => "Recebido",
        }
    }

    pub fn not_received(self) -> &'static str {
        match self {
            Locale::En => "Not received",
            Locale::PtBr => "Não recebido",
        }
    }

    /// Placeholder reason for a rejection that carried no error text.
    pub fn generic_error(self) -> &'static str {
        match self {
            Locale::En => "error",
            Locale::PtBr => "erro",
        }
    }

    pub fn timeout(self) -> &'static str {
        "timeout"
    }

    pub fn disconnected(self) -> &'static str {
        self.connection_state(ConnectionState::Disconnected)
    }

    pub fn connection_state(self, state: ConnectionState) -> &'static str {
        match (self, state) {
            (Locale::En, ConnectionState::Connecting) => "connecting",
            (Locale::En, ConnectionState::Connected) => "connected",
            (Locale::En, ConnectionState::Disconnected) => "disconnected",
            (Locale::En, ConnectionState::Erroring) => "error",
            (Locale::PtBr, ConnectionState::Connecting) => "conectando",
            (Locale::PtBr, ConnectionState::Connected) => "conectado",
            (Locale::PtBr, ConnectionState::Disconnected) => "desconectado",
            (Locale::PtBr, ConnectionState::Erroring) => "erro",
        }
    }

    /// Placeholder shown when no input is held.
    pub fn nothing_pressed(self) -> &'static str {
        match self {
            Locale::En => "(none)",
            Locale::PtBr => "(nenhuma)",
        }
    }
}
