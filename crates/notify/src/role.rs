//! Role command state machine
//!
//! Commands written to `disable` are classified into buckets and resolved
//! against the previously accepted command with a fixed transition table.

use protocol::{NotifyError, Result, RoleState};
use tracing::{info, warn};

/// Command stored at registration
pub const INITIAL_COMMAND: &str = "OFF";

/// Classification of a role command string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandBucket {
    /// `ON` or `ON_ALL_*`
    All,
    /// `OFF`
    Off,
    /// `ON_HOST_*`
    Host,
    /// `ON_CLIENT_*`
    Client,
}

impl CommandBucket {
    pub const ALL: [CommandBucket; 4] = [Self::All, Self::Off, Self::Host, Self::Client];

    /// Classify a command; `None` for anything unrecognized
    pub fn classify(command: &str) -> Option<Self> {
        if command == "ON" || command.starts_with("ON_ALL_") {
            Some(Self::All)
        } else if command == "OFF" {
            Some(Self::Off)
        } else if command.starts_with("ON_HOST_") {
            Some(Self::Host)
        } else if command.starts_with("ON_CLIENT_") {
            Some(Self::Client)
        } else {
            None
        }
    }

    fn row(&self) -> usize {
        match self {
            Self::All => 0,
            Self::Off => 1,
            Self::Host => 2,
            Self::Client => 3,
        }
    }

    /// Role taken when this bucket is not redundant with the previous one
    pub fn target(&self) -> RoleState {
        match self {
            Self::All => RoleState::All,
            Self::Off => RoleState::None,
            Self::Host => RoleState::Host,
            Self::Client => RoleState::Client,
        }
    }
}

/// Outcome of resolving a new command against the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Hand this role to the controller and persist the command
    Apply(RoleState),
    /// Redundant: persist the command, change nothing else
    Ignore,
    /// Unrecognized: persist nothing
    Invalid,
}

use Transition::{Apply, Ignore};

/// Indexed `[new][previous]` in bucket order All, Off, Host, Client
const TRANSITIONS: [[Transition; 4]; 4] = [
    [Ignore, Apply(RoleState::All), Apply(RoleState::All), Apply(RoleState::All)],
    [Apply(RoleState::None), Ignore, Apply(RoleState::None), Apply(RoleState::None)],
    [Apply(RoleState::Host), Apply(RoleState::Host), Ignore, Apply(RoleState::Host)],
    [Apply(RoleState::Client), Apply(RoleState::Client), Apply(RoleState::Client), Ignore],
];

/// Resolve a pair of classified commands
pub fn transition(new: CommandBucket, previous: CommandBucket) -> Transition {
    TRANSITIONS[new.row()][previous.row()]
}

/// Resolve raw command text against the previous command text
pub fn resolve(new: &str, previous: &str) -> Transition {
    match (CommandBucket::classify(new), CommandBucket::classify(previous)) {
        (Some(new), Some(previous)) => transition(new, previous),
        _ => Transition::Invalid,
    }
}

/// Current command and resolved role of one device
#[derive(Debug, Clone)]
pub struct RoleCommandResolver {
    command: String,
    state: RoleState,
}

impl Default for RoleCommandResolver {
    fn default() -> Self {
        Self {
            command: INITIAL_COMMAND.to_string(),
            state: RoleState::None,
        }
    }
}

impl RoleCommandResolver {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> RoleState {
        self.state
    }

    /// Resolve and persist a command
    ///
    /// On `Ok` the caller must hand the returned role to the controller.
    /// Redundant commands are persisted and reported as
    /// [`NotifyError::RedundantCommand`]; invalid ones leave everything as it
    /// was.
    pub fn submit(&mut self, command: &str) -> Result<RoleState> {
        info!(
            "role command: current={}, previous={}",
            command, self.command
        );
        match resolve(command, &self.command) {
            Transition::Apply(state) => {
                info!("cmd={} is accepted", command);
                self.command = command.to_string();
                self.state = state;
                Ok(state)
            }
            Transition::Ignore => {
                warn!("cmd={} is ignored but saved", command);
                self.command = command.to_string();
                Err(NotifyError::RedundantCommand(command.to_string()))
            }
            Transition::Invalid => {
                warn!("cmd={} is invalid", command);
                Err(NotifyError::InvalidCommand(command.to_string()))
            }
        }
    }

    /// Override the resolved role without touching the stored command
    pub fn force(&mut self, state: RoleState) {
        self.state = state;
    }
}
