use std::fmt::Display;
use crate::Error;
use crate::result::{DiceRollResult, ResultId};
use super::{DiceRollOption, OptionType};


/// Recomputes critical flags from the score instead of the die's side tables.
///
/// A score of at least `success_at` is a critical success, a score of at most
/// `failure_at` a critical failure. Handy when a modifier shifts what counts
/// as a critical result, or for Fate dice which never flag criticals on their own.
///
/// Runs after explosions, so it does not change which dice exploded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalRange {
    success_at: i32,
    failure_at: i32
}

impl CriticalRange {
    /// Flags scores `>= success_at` and `<= failure_at`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `failure_at >= success_at`.
    pub fn new(success_at: i32, failure_at: i32) -> Result<Self, Error> {
        if failure_at >= success_at {
            return Err(Error::invalid(format!(
                "critical failure threshold ({failure_at}) must be below the success threshold ({success_at})"
            )));
        }

        Ok(Self { success_at, failure_at })
    }

    /// Lowest score flagged as a critical success.
    pub fn success_at(&self) -> i32 {
        self.success_at
    }

    /// Highest score flagged as a critical failure.
    pub fn failure_at(&self) -> i32 {
        self.failure_at
    }
}

impl Display for CriticalRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cs>={}cf<={}", self.success_at, self.failure_at)
    }
}

impl DiceRollOption for CriticalRange {
    fn option_type(&self) -> OptionType {
        OptionType::Status
    }

    fn execute_roll_status_update_logic(&self, roll: &mut DiceRollResult, logical: &[ResultId]) -> Result<(), Error> {
        for &id in logical {
            let result = roll.result_mut(id)?;
            let score = result.score();

            result.set_critical_success(score >= self.success_at);
            result.set_critical_failure(score <= self.failure_at);
        }

        Ok(())
    }
}
