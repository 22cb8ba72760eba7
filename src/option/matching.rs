use std::fmt::Display;
use crate::Error;
use crate::result::DiceRollResult;
use super::{DiceRollOption, OptionType};


/// Reports the width of the largest matching set as the total, `0` without any match.
///
/// The computed sum stays available through [`DiceRollResult::computed_total`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LargestMatch;

impl Display for LargestMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w")
    }
}

impl DiceRollOption for LargestMatch {
    fn option_type(&self) -> OptionType {
        OptionType::Total
    }

    fn execute_post_roll_result_calculation(&self, roll: &mut DiceRollResult) -> Result<(), Error> {
        let width = roll.matching_ids().iter().map(Vec::len).max().unwrap_or(0);
        roll.override_total_value(i32::try_from(width).unwrap_or(i32::MAX));

        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::{DiceSet, Die, ScriptedRandom};


    fn roll_with(values: &[i32]) -> DiceRollResult {
        let random = ScriptedRandom::shared(values.to_vec());
        let dice = values.iter().map(|_| Die::new(10, random.clone()).unwrap());
        let mut set = DiceSet::from_dice(dice).unwrap();
        set.options_mut().add(LargestMatch).unwrap();

        set.roll().unwrap()
    }

    #[test]
    fn test_width_of_largest_set() {
        let roll = roll_with(&[3, 7, 3, 7, 7, 1]);

        assert_eq!(roll.total_value(), 3);
        assert_eq!(roll.computed_total(), 28);
        assert!(roll.is_overridden());

        let widths: Vec<usize> = roll.matching_dice_sets().iter().map(Vec::len).collect();
        assert_eq!(widths, vec![3, 2]);
    }

    #[test]
    fn test_no_match() {
        let roll = roll_with(&[2, 5, 9]);

        assert_eq!(roll.total_value(), 0);
        assert!(roll.matching_dice_sets().is_empty());
    }
}
