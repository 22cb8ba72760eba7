use std::fmt::Display;
use crate::Error;
use crate::result::{DiceRollResult, ResultId, SUCCESSES};
use super::{DiceRollOption, OptionType};


/// Counts successes instead of adding scores.
///
/// Each logical result scoring at least `target` is worth one success.
/// With [`Successes::failures_at_most`], results scoring at or below the
/// threshold subtract one success. A roll with no net successes and a
/// critical failure is a botch.
///
/// # Examples
/// ```
/// use diceforge::{DiceSet, Die, ScriptedRandom, Successes};
///
/// let random = ScriptedRandom::shared([8, 3, 10, 1]);
/// let dice = (0..4).map(|_| Die::new(10, random.clone()).unwrap());
/// let mut set = DiceSet::from_dice(dice).unwrap();
/// set.options_mut().add(Successes::at_least(7).failures_at_most(1)).unwrap();
///
/// let roll = set.roll().unwrap();
/// assert!(roll.uses_successes());
/// assert_eq!(roll.total_value(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Successes {
    target: i32,
    failure_at: Option<i32>
}

impl Successes {
    /// Scores of at least `target` count as one success each.
    pub fn at_least(target: i32) -> Self {
        Self { target, failure_at: None }
    }

    /// Scores of at most `threshold` subtract one success each.
    pub fn failures_at_most(mut self, threshold: i32) -> Self {
        self.failure_at = Some(threshold);
        self
    }

    /// The success threshold.
    pub fn target(&self) -> i32 {
        self.target
    }

    /// The failure threshold, if any.
    pub fn failure_at(&self) -> Option<i32> {
        self.failure_at
    }

    fn successes(&self, score: i32) -> i32 {
        if score >= self.target {
            1
        } else if self.failure_at.is_some_and(|threshold| score <= threshold) {
            -1
        } else {
            0
        }
    }
}

impl Display for Successes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ">={}", self.target)?;

        match self.failure_at {
            Some(threshold) => write!(f, "f<={threshold}"),
            None => Ok(())
        }
    }
}

impl DiceRollOption for Successes {
    fn option_type(&self) -> OptionType {
        OptionType::Success
    }

    fn execute_success_calculation_logic(&self, roll: &mut DiceRollResult, logical: &[ResultId]) -> Result<(), Error> {
        for &id in logical {
            let result = roll.result_mut(id)?;
            let successes = self.successes(result.score());
            result.value_mut().set(SUCCESSES, successes);
        }

        roll.set_uses_successes(true);
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::{DiceSet, Die, DropKeep, Explode, ScriptedRandom};


    fn set_of(values: &[i32], option: Successes) -> DiceSet {
        let random = ScriptedRandom::shared(values.to_vec());
        let dice = values.iter().map(|_| Die::new(10, random.clone()).unwrap());
        let mut set = DiceSet::from_dice(dice).unwrap();
        set.options_mut().add(option).unwrap();
        set
    }

    #[test]
    fn test_counts_successes() {
        let roll = set_of(&[7, 6, 9, 10, 2], Successes::at_least(7)).roll().unwrap();

        assert_eq!(roll.total_value(), 3);
        assert_eq!(roll.successes(), 3);
        assert_eq!(roll.raw_dice()[1].value().get(SUCCESSES), Some(0));
        assert!(!roll.is_botched_roll());
    }

    #[test]
    fn test_failures_subtract() {
        let roll = set_of(&[8, 1, 1], Successes::at_least(8).failures_at_most(1)).roll().unwrap();

        assert_eq!(roll.total_value(), -1);
        assert!(roll.is_botched_roll());
    }

    #[test]
    fn test_botch_needs_critical_failure() {
        let roll = set_of(&[4, 5], Successes::at_least(8)).roll().unwrap();
        assert_eq!(roll.total_value(), 0);
        assert!(!roll.is_botched_roll());

        let roll = set_of(&[4, 1], Successes::at_least(8)).roll().unwrap();
        assert!(roll.is_botched_roll());
    }

    #[test]
    fn test_discarded_dice_do_not_count() {
        let mut set = set_of(&[9, 9, 2], Successes::at_least(8));
        set.options_mut().add(DropKeep::kl(1).unwrap()).unwrap();

        let roll = set.roll().unwrap();
        assert_eq!(roll.total_value(), 0);
    }

    #[test]
    fn test_compounded_die_counts_as_one() {
        let mut set = set_of(&[10, 3], Successes::at_least(8));
        set.remove(1);
        set.options_mut().add(Explode::compounding()).unwrap();

        let roll = set.roll().unwrap();
        let compounded = roll.logical_dice().next().unwrap();

        assert!(compounded.is_virtual());
        assert_eq!(compounded.number(), 13);
        assert_eq!(compounded.value().get(SUCCESSES), Some(1));
        assert_eq!(roll.total_value(), 1);
        assert!(!roll.is_botched_roll());
    }

    #[test]
    fn test_compounded_die_avoids_failure() {
        let mut set = set_of(&[10, 1, 1], Successes::at_least(12).failures_at_most(1));
        set.remove(2);
        set.options_mut().add(Explode::compounding()).unwrap();

        let roll = set.roll().unwrap();

        let numbers: Vec<i32> = roll.logical_dice().map(|result| result.number()).collect();
        assert_eq!(numbers, vec![1, 11]);
        assert_eq!(roll.total_value(), -1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Successes::at_least(6).to_string(), ">=6");
        assert_eq!(Successes::at_least(6).failures_at_most(1).to_string(), ">=6f<=1");
    }
}
