// Winner selection: unbiased shuffle, then first-seen de-duplication by
// identity key. Continuation removes every entry of a past winner.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::participant::{IdentityKey, IdentityRules, Participant};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("at least one winner must be requested")]
    ZeroWinners,

    #[error("no participants remain once the winners are removed")]
    NoRemainingParticipants,
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Draws winners and filters pools under one set of identity rules.
#[derive(Debug, Clone, Default)]
pub struct WinnerSelector {
    rules: IdentityRules,
}

impl WinnerSelector {
    pub fn new(rules: IdentityRules) -> Self {
        WinnerSelector { rules }
    }

    pub fn rules(&self) -> &IdentityRules {
        &self.rules
    }

    /// Draw up to `count` winners with pairwise distinct identity keys.
    ///
    /// The pool is copied and shuffled (Fisher-Yates via `rng`); the first
    /// entry seen for each identity wins, later duplicates are skipped. The
    /// result is shorter than `count` when the pool has fewer distinct
    /// identities. `participants` is never reordered.
    pub fn select_winners<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Participant>, DrawError> {
        if count == 0 {
            return Err(DrawError::ZeroWinners);
        }

        let mut shuffled: Vec<&Participant> = participants.iter().collect();
        shuffled.shuffle(rng);

        let mut winners = Vec::with_capacity(count.min(participants.len()));
        let mut seen: HashSet<IdentityKey> = HashSet::new();
        let mut duplicates_skipped = 0usize;

        for participant in shuffled {
            if seen.insert(self.rules.key_for(participant)) {
                winners.push(participant.clone());
                if winners.len() >= count {
                    break;
                }
            } else {
                duplicates_skipped += 1;
            }
        }

        info!(
            "Winners drawn: pool={}, requested={}, drawn={}, duplicates_skipped={}",
            participants.len(),
            count,
            winners.len(),
            duplicates_skipped
        );

        Ok(winners)
    }

    /// The pool for the next round: every participant whose identity key does
    /// not belong to a winner, in original order.
    pub fn continue_draw(
        &self,
        participants: &[Participant],
        winners: &[Participant],
    ) -> Result<Vec<Participant>, DrawError> {
        let winner_keys = self.rules.keys_of(winners);

        let remaining: Vec<Participant> = participants
            .iter()
            .filter(|p| !winner_keys.contains(&self.rules.key_for(p)))
            .cloned()
            .collect();

        debug!(
            "Filtered {} winners out of pool: removed={}, remaining={}",
            winners.len(),
            participants.len() - remaining.len(),
            remaining.len()
        );

        if remaining.is_empty() {
            return Err(DrawError::NoRemainingParticipants);
        }
        Ok(remaining)
    }

    /// Number of distinct identities in `participants`, i.e. the most
    /// winners a single draw can produce.
    pub fn distinct_identity_count(&self, participants: &[Participant]) -> usize {
        self.rules.keys_of(participants).len()
    }
}

/// Draw with the default identity rules.
pub fn select_winners<R: Rng + ?Sized>(
    participants: &[Participant],
    count: usize,
    rng: &mut R,
) -> Result<Vec<Participant>, DrawError> {
    WinnerSelector::default().select_winners(participants, count, rng)
}

/// Filter winners out with the default identity rules.
pub fn continue_draw(
    participants: &[Participant],
    winners: &[Participant],
) -> Result<Vec<Participant>, DrawError> {
    WinnerSelector::default().continue_draw(participants, winners)
}

pub fn distinct_identity_count(participants: &[Participant]) -> usize {
    WinnerSelector::default().distinct_identity_count(participants)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
