use std::fmt::Display;
use crate::result::DieRollResult;
use super::{DiceRollOption, OptionType};


/// Condition under which [`ReRoll`] rolls a die again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReRollTrigger {
    /// Results whose number is strictly below the threshold.
    Below(i32),
    /// Results flagged as critical failures.
    CriticalFailure
}


/// Re-rolls every matching result once, discarding the original.
///
/// The new result replaces the original in the logical pool and is kept
/// even if it matches again.
///
/// # Examples
/// ```
/// use diceforge::{DiceSet, Die, ReRoll, ScriptedRandom};
///
/// let random = ScriptedRandom::shared([1, 5, 1]);
/// let mut set = DiceSet::from_dice([Die::new(6, random.clone()).unwrap(), Die::new(6, random).unwrap()]).unwrap();
/// set.options_mut().add(ReRoll::below(2)).unwrap();
///
/// let roll = set.roll().unwrap();
/// assert_eq!(roll.discarded_dice().count(), 1);
/// assert_eq!(roll.total_value(), 5 + 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReRoll {
    trigger: ReRollTrigger
}

impl ReRoll {
    /// Re-rolls results below `threshold`.
    pub fn below(threshold: i32) -> Self {
        Self { trigger: ReRollTrigger::Below(threshold) }
    }

    /// Re-rolls critical failures.
    pub fn critical_failure() -> Self {
        Self { trigger: ReRollTrigger::CriticalFailure }
    }

    /// The re-roll condition.
    pub fn trigger(&self) -> ReRollTrigger {
        self.trigger
    }
}

impl Display for ReRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.trigger {
            ReRollTrigger::Below(threshold) => write!(f, "r<{threshold}"),
            ReRollTrigger::CriticalFailure => write!(f, "rcf")
        }
    }
}

impl DiceRollOption for ReRoll {
    fn option_type(&self) -> OptionType {
        OptionType::ReRoll
    }

    fn allow_reroll(&self, result: &DieRollResult) -> bool {
        match self.trigger {
            ReRollTrigger::Below(threshold) => result.number() < threshold,
            ReRollTrigger::CriticalFailure => result.is_critical_failure()
        }
    }
}
