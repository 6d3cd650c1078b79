// Library root for the raffle core: line parsing, identity keys, winner
// selection and configuration.

pub mod config;
pub mod parser;
pub mod participant;
pub mod selector;

pub use config::{ConfigError, RaffleConfig};
pub use parser::{parse, LineParser};
pub use participant::{IdentityKey, IdentityRules, Participant, ParticipantId};
pub use selector::{continue_draw, select_winners, DrawError, WinnerSelector};
