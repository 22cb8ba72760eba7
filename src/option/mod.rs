mod reroll;
mod explode;
mod drop_keep;
mod status;
mod success;
mod matching;

use std::fmt::{Debug, Display};
use crate::Error;
use crate::result::{DiceRollResult, DieRollResult, ResultId};

pub use reroll::{ReRoll, ReRollTrigger};
pub use explode::{Explode, ExplodeStyle, MAX_CHAIN_LENGTH};
pub use drop_keep::{DropKeep, Mode};
pub use status::CriticalRange;
pub use success::Successes;
pub use matching::LargestMatch;


/// Tag identifying the family an option belongs to.
///
/// A [`crate::DiceRollOptions`] collection holds at most one option per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    /// Re-rolls results matching a condition.
    ReRoll,
    /// Rolls additional dice.
    Explode,
    /// Recomputes critical flags.
    Status,
    /// Counts successes instead of adding scores.
    Success,
    /// Discards the highest or lowest results.
    DropKeep,
    /// Overrides the final total.
    Total,
    /// A user-defined family.
    Custom(&'static str)
}

impl Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::ReRoll => write!(f, "re-roll"),
            OptionType::Explode => write!(f, "explode"),
            OptionType::Status => write!(f, "status"),
            OptionType::Success => write!(f, "success"),
            OptionType::DropKeep => write!(f, "drop/keep"),
            OptionType::Total => write!(f, "total"),
            OptionType::Custom(name) => write!(f, "{name}")
        }
    }
}


/// A rule hooking into the stages of [`crate::DiceSet::roll`].
///
/// Every hook has a no-op default, so a rule only implements the stages it
/// cares about. Stages run in this order, each over every option of the set
/// before moving to the next:
///
/// 1. re-roll ([`DiceRollOption::allow_reroll`], [`DiceRollOption::execute_reroll_logic`])
/// 2. additional rolls ([`DiceRollOption::execute_additional_roll_logic`])
/// 3. status update ([`DiceRollOption::execute_roll_status_update_logic`])
/// 4. success calculation ([`DiceRollOption::execute_success_calculation_logic`])
/// 5. drop/keep ([`DiceRollOption::execute_drop_keep_logic`])
/// 6. virtual dice ([`DiceRollOption::execute_virtual_dice_creation_logic`])
/// 7. totals, then [`DiceRollOption::execute_post_roll_result_calculation`]
///
/// `Display` renders the option in dice notation (`kh3`, `!`, `r<2`...).
///
/// # Examples
/// ```
/// use diceforge::{DiceRollOption, DiceRollResult, DiceSet, Die, Error, OptionType, ScriptedRandom};
/// use std::fmt::Display;
///
/// /// Reports the number of dice rolled instead of their sum.
/// #[derive(Debug)]
/// struct CountDice;
///
/// impl Display for CountDice {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "#")
///     }
/// }
///
/// impl DiceRollOption for CountDice {
///     fn option_type(&self) -> OptionType {
///         OptionType::Custom("count")
///     }
///
///     fn execute_post_roll_result_calculation(&self, roll: &mut DiceRollResult) -> Result<(), Error> {
///         let count = roll.logical_ids().len() as i32;
///         roll.override_total_value(count);
///         Ok(())
///     }
/// }
///
/// let random = ScriptedRandom::shared([3, 5]);
/// let mut set = DiceSet::from_dice([Die::new(6, random.clone()).unwrap(), Die::new(6, random).unwrap()]).unwrap();
/// set.options_mut().add(CountDice).unwrap();
///
/// let roll = set.roll().unwrap();
/// assert_eq!(roll.total_value(), 2);
/// assert_eq!(roll.computed_total(), 8);
/// ```
pub trait DiceRollOption: Debug + Display + Send + Sync {
    /// The family of this option.
    fn option_type(&self) -> OptionType;

    /// Whether `result` should be re-rolled.
    fn allow_reroll(&self, _result: &DieRollResult) -> bool {
        false
    }

    /// Re-rolls the candidates accepted by [`DiceRollOption::allow_reroll`]
    /// and returns the ids of the new results.
    ///
    /// # Errors
    /// Propagates failures of [`DiceRollResult::reroll`].
    fn execute_reroll_logic(&self, roll: &mut DiceRollResult, candidates: &[ResultId]) -> Result<Vec<ResultId>, Error> {
        let mut rerolled = Vec::new();

        for &id in candidates {
            let result = roll.result(id)?;

            if !result.is_virtual() && result.next_roll().is_none() && self.allow_reroll(result) {
                rerolled.push(roll.reroll(id)?);
            }
        }

        Ok(rerolled)
    }

    /// Rolls additional dice and returns the ids of the new results.
    ///
    /// # Errors
    /// Implementations propagate failures of the result operations.
    fn execute_additional_roll_logic(&self, _roll: &mut DiceRollResult, _logical: &[ResultId]) -> Result<Vec<ResultId>, Error> {
        Ok(Vec::new())
    }

    /// Recomputes result flags such as criticality.
    ///
    /// # Errors
    /// Implementations return [`Error::InvalidArgument`] for foreign ids.
    fn execute_roll_status_update_logic(&self, _roll: &mut DiceRollResult, _logical: &[ResultId]) -> Result<(), Error> {
        Ok(())
    }

    /// Writes per-result success values.
    ///
    /// When the roll counts successes, this runs a second time after virtual
    /// dice are synthesized, receiving only the new virtual results.
    ///
    /// # Errors
    /// Implementations return [`Error::InvalidArgument`] for foreign ids.
    fn execute_success_calculation_logic(&self, _roll: &mut DiceRollResult, _logical: &[ResultId]) -> Result<(), Error> {
        Ok(())
    }

    /// Flags results as discarded.
    ///
    /// The links of a compounding chain are meant to be kept or discarded together.
    ///
    /// # Errors
    /// Implementations return [`Error::InvalidArgument`] for foreign ids.
    fn execute_drop_keep_logic(&self, _roll: &mut DiceRollResult, _logical: &[ResultId]) -> Result<(), Error> {
        Ok(())
    }

    /// Creates virtual results from the chains starting at `initial`
    /// and returns their ids.
    ///
    /// # Errors
    /// Propagates failures of [`DiceRollResult::add_virtual`].
    fn execute_virtual_dice_creation_logic(&self, _roll: &mut DiceRollResult, _initial: &[ResultId]) -> Result<Vec<ResultId>, Error> {
        Ok(Vec::new())
    }

    /// Runs after the total was computed; may override it.
    ///
    /// # Errors
    /// Implementations may fail with any [`Error`].
    fn execute_post_roll_result_calculation(&self, _roll: &mut DiceRollResult) -> Result<(), Error> {
        Ok(())
    }
}
