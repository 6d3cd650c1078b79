// Raffle session: the step machine that drives parsing, drawing and
// continuation rounds.
//
// Input --load_list--> Verification --draw--> Results
//   ^                       ^                   |
//   |                       +--continue_drawing-+
//   +------------------------reset--------------+
//
// Every operation either completes and transitions, or returns an error and
// leaves the session exactly as it was.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use sorteo_core::config::{ConfigError, RaffleConfig};
use sorteo_core::parser::LineParser;
use sorteo_core::participant::Participant;
use sorteo_core::selector::{DrawError, WinnerSelector};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no valid participants found; use one participant per line")]
    NoValidParticipants,

    #[error("cannot {action} while in the {step} step")]
    WrongStep { action: &'static str, step: Step },

    #[error("winner count must be between 1 and {max}, got {requested}")]
    InvalidWinnerCount { requested: usize, max: usize },

    #[error(transparent)]
    Draw(#[from] DrawError),
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Step {
    /// Waiting for a pasted list.
    Input,
    /// List loaded; the winner count is being chosen.
    Verification,
    /// Winners drawn and being revealed.
    Results,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Input => "input",
            Step::Verification => "verification",
            Step::Results => "results",
        };
        f.write_str(name)
    }
}

/// A completed draw, kept for the rest of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: usize,
    pub requested: usize,
    /// Entries in the pool when the round was drawn.
    pub pool_size: usize,
    pub winners: Vec<Participant>,
    pub drawn_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RaffleSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RaffleSession {
    config: RaffleConfig,
    parser: LineParser,
    selector: WinnerSelector,
    step: Step,
    participants: Vec<Participant>,
    winners: Vec<Participant>,
    history: Vec<RoundRecord>,
}

impl Default for RaffleSession {
    fn default() -> Self {
        let config = RaffleConfig::default();
        let selector = WinnerSelector::new(config.identity.rules());
        RaffleSession {
            config,
            parser: LineParser::default(),
            selector,
            step: Step::Input,
            participants: Vec::new(),
            winners: Vec::new(),
            history: Vec::new(),
        }
    }
}

impl RaffleSession {
    pub fn new(config: RaffleConfig) -> Result<Self, ConfigError> {
        let parser = LineParser::new(&config.parser)?;
        let selector = WinnerSelector::new(config.identity.rules());
        Ok(RaffleSession {
            config,
            parser,
            selector,
            step: Step::Input,
            participants: Vec::new(),
            winners: Vec::new(),
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &RaffleConfig {
        &self.config
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// The current pool. Reveal effects cycle through these names.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn winners(&self) -> &[Participant] {
        &self.winners
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    /// Pool entries minus winners of the current round.
    pub fn remaining_count(&self) -> usize {
        self.participants.len().saturating_sub(self.winners.len())
    }

    /// Distinct identities in the pool.
    pub fn unique_count(&self) -> usize {
        self.selector.distinct_identity_count(&self.participants)
    }

    /// Largest winner count the verification step offers.
    pub fn max_winners(&self) -> usize {
        self.participants.len().min(self.config.draw.max_winners)
    }

    /// Winner count preselected for a freshly loaded pool.
    pub fn default_winner_count(&self) -> usize {
        self.config.draw.default_winners.min(self.max_winners()).max(1)
    }

    /// Parse a pasted list and move to verification. A list without a single
    /// non-blank line is rejected and nothing changes.
    pub fn load_list(&mut self, raw_text: &str) -> Result<&[Participant], SessionError> {
        self.expect_step(Step::Input, "load a list")?;

        let parsed = self.parser.parse(raw_text);
        if parsed.is_empty() {
            warn!("Pasted list produced no participants");
            return Err(SessionError::NoValidParticipants);
        }

        info!("Participant list loaded: {} participants", parsed.len());
        self.participants = parsed;
        self.winners.clear();
        self.step = Step::Verification;
        Ok(&self.participants)
    }

    /// Draw `count` winners from the pool and move to results. The result
    /// may hold fewer than `count` entries when the pool has duplicates.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Result<&[Participant], SessionError> {
        self.expect_step(Step::Verification, "draw winners")?;

        let max = self.max_winners();
        if count == 0 || count > max {
            return Err(SessionError::InvalidWinnerCount {
                requested: count,
                max,
            });
        }

        let winners = self.selector.select_winners(&self.participants, count, rng)?;
        if winners.len() < count {
            info!(
                "Fewer distinct participants than requested winners: requested={}, drawn={}",
                count,
                winners.len()
            );
        }

        self.history.push(RoundRecord {
            round: self.history.len() + 1,
            requested: count,
            pool_size: self.participants.len(),
            winners: winners.clone(),
            drawn_at: Utc::now(),
        });
        self.winners = winners;
        self.step = Step::Results;
        Ok(&self.winners)
    }

    /// Remove every entry of this round's winners from the pool and return to
    /// verification for another round.
    pub fn continue_drawing(&mut self) -> Result<&[Participant], SessionError> {
        self.expect_step(Step::Results, "continue drawing")?;

        let remaining = match self.selector.continue_draw(&self.participants, &self.winners) {
            Ok(remaining) => remaining,
            Err(e) => {
                warn!("No participants left to draw: {}", e);
                return Err(e.into());
            }
        };

        info!(
            "Continuing with remaining participants: removed={}, remaining={}",
            self.participants.len() - remaining.len(),
            remaining.len()
        );
        self.participants = remaining;
        self.winners.clear();
        self.step = Step::Verification;
        Ok(&self.participants)
    }

    /// Drop the list, winners and history and return to input.
    pub fn reset(&mut self) {
        info!("Session reset after {} rounds", self.history.len());
        self.participants.clear();
        self.winners.clear();
        self.history.clear();
        self.step = Step::Input;
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::WrongStep {
                action,
                step: self.step,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_session_waits_for_input() {
        let session = RaffleSession::default();
        assert_eq!(session.step(), Step::Input);
        assert!(session.participants().is_empty());
        assert_eq!(session.max_winners(), 0);
    }

    #[test]
    fn blank_list_is_rejected_without_transition() {
        let mut session = RaffleSession::default();
        assert_eq!(
            session.load_list("  \n\n "),
            Err(SessionError::NoValidParticipants)
        );
        assert_eq!(session.step(), Step::Input);
    }

    #[test]
    fn draw_requires_verification_step() {
        let mut session = RaffleSession::default();
        let err = session.draw(1, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(
            err,
            SessionError::WrongStep {
                action: "draw winners",
                step: Step::Input
            }
        );
    }

    #[test]
    fn winner_count_is_capped_by_pool_and_config() {
        let config = RaffleConfig::from_toml_str("[draw]\nmax_winners = 2\n").unwrap();
        let mut session = RaffleSession::new(config).unwrap();
        session.load_list("A\nB\nC").unwrap();
        assert_eq!(session.max_winners(), 2);

        let err = session.draw(3, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, SessionError::InvalidWinnerCount { requested: 3, max: 2 });
        assert_eq!(session.step(), Step::Verification);

        let err = session.draw(0, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, SessionError::InvalidWinnerCount { requested: 0, max: 2 });
    }

    #[test]
    fn default_winner_count_fits_small_pools() {
        let config = RaffleConfig::from_toml_str("[draw]\ndefault_winners = 5\n").unwrap();
        let mut session = RaffleSession::new(config).unwrap();
        session.load_list("A\nB").unwrap();
        assert_eq!(session.default_winner_count(), 2);
    }

    #[test]
    fn exhausted_pool_keeps_state() {
        let mut session = RaffleSession::default();
        session.load_list("Ana\nana").unwrap();
        let winners = session.draw(2, &mut StdRng::seed_from_u64(4)).unwrap().to_vec();
        assert_eq!(winners.len(), 1);

        let err = session.continue_drawing().unwrap_err();
        assert_eq!(err, SessionError::Draw(DrawError::NoRemainingParticipants));
        assert_eq!(session.step(), Step::Results);
        assert_eq!(session.participants().len(), 2);
        assert_eq!(session.winners(), winners.as_slice());
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = RaffleSession::default();
        session.load_list("A\nB\nC").unwrap();
        session.draw(1, &mut StdRng::seed_from_u64(9)).unwrap();
        session.reset();

        assert_eq!(session.step(), Step::Input);
        assert!(session.participants().is_empty());
        assert!(session.winners().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn step_names_are_lowercase() {
        assert_eq!(Step::Verification.to_string(), "verification");
        let err = SessionError::WrongStep {
            action: "continue drawing",
            step: Step::Input,
        };
        assert_eq!(err.to_string(), "cannot continue drawing while in the input step");
    }
}
