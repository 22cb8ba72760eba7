use std::{fmt::Display, sync::Arc};
use tracing::debug;
use crate::{DiceRollOptions, Die, DieKind, Error};
use crate::result::DiceRollResult;


/// Dice sharing one side count, rolled together under a set of [`DiceRollOptions`].
///
/// An empty set accepts dice of any side count; from then on every die
/// added must match it. Removing the last die resets the side count.
///
/// # Examples
/// ```
/// use diceforge::{DiceSet, Die, DropKeep, ScriptedRandom};
///
/// let random = ScriptedRandom::shared([2, 5, 6, 1]);
/// let mut set = DiceSet::new();
/// for _ in 0..4 {
///     set.add(Die::new(6, random.clone()).unwrap()).unwrap();
/// }
/// set.options_mut().add(DropKeep::kh(3).unwrap()).unwrap();
///
/// assert_eq!(set.to_string(), "4d6kh3");
/// assert_eq!(set.roll().unwrap().total_value(), 13);
///
/// // A d8 does not belong in a set of d6.
/// assert!(set.add(Die::new(8, random).unwrap()).is_err());
/// assert_eq!(set.len(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiceSet {
    dice: Vec<Arc<Die>>,
    options: DiceRollOptions,
    sides: u16
}

impl DiceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding `dice`.
    ///
    /// # Errors
    /// Returns [`Error::DiceMismatch`] if the dice do not all have the same side count.
    pub fn from_dice(dice: impl IntoIterator<Item = Die>) -> Result<Self, Error> {
        let mut set = Self::new();
        for die in dice {
            set.add(die)?;
        }

        Ok(set)
    }

    /// Replaces the options, returning the set for chaining.
    pub fn with_options(mut self, options: DiceRollOptions) -> Self {
        self.options = options;
        self
    }

    /// Appends `die`.
    ///
    /// # Errors
    /// Returns [`Error::DiceMismatch`] if `die` has a different side count; the set is left unchanged.
    pub fn add(&mut self, die: Die) -> Result<(), Error> {
        self.add_shared(Arc::new(die))
    }

    /// Appends an already shared die.
    ///
    /// # Errors
    /// Same as [`DiceSet::add`].
    pub fn add_shared(&mut self, die: Arc<Die>) -> Result<(), Error> {
        self.check(&die)?;
        self.dice.push(die);

        Ok(())
    }

    /// Inserts `die` at `index`.
    ///
    /// # Errors
    /// - Returns [`Error::DiceMismatch`] if `die` has a different side count.
    /// - Returns [`Error::InvalidArgument`] if `index > len`.
    pub fn insert(&mut self, index: usize, die: Die) -> Result<(), Error> {
        if index > self.dice.len() {
            return Err(Error::invalid(format!("index {index} is out of bounds for a set of {}", self.dice.len())));
        }

        let die = Arc::new(die);
        self.check(&die)?;
        self.dice.insert(index, die);

        Ok(())
    }

    fn check(&mut self, die: &Die) -> Result<(), Error> {
        if self.dice.is_empty() {
            self.sides = die.sides();
        } else if die.sides() != self.sides {
            return Err(Error::DiceMismatch { expected: self.sides, found: die.sides() });
        }

        Ok(())
    }

    /// Removes and returns the die at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Arc<Die>> {
        if index >= self.dice.len() {
            return None;
        }

        let die = self.dice.remove(index);
        if self.dice.is_empty() {
            self.sides = 0;
        }

        Some(die)
    }

    /// Removes every die. Options are kept.
    pub fn clear(&mut self) {
        self.dice.clear();
        self.sides = 0;
    }

    /// Number of dice.
    pub fn len(&self) -> usize {
        self.dice.len()
    }

    /// Returns `true` if the set holds no die.
    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Side count shared by the dice, `0` for an empty set.
    pub fn sides(&self) -> u16 {
        self.sides
    }

    /// Returns the die at `index`.
    pub fn get(&self, index: usize) -> Option<&Arc<Die>> {
        self.dice.get(index)
    }

    /// Returns the die at `index` mutably, e.g. to change its modifier.
    ///
    /// Results of earlier rolls keep the die as it was.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Die> {
        self.dice.get_mut(index).map(Arc::make_mut)
    }

    /// Iterates over the dice.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Die>> {
        self.dice.iter()
    }

    /// The options applied when rolling.
    pub fn options(&self) -> &DiceRollOptions {
        &self.options
    }

    /// Mutable access to the options.
    pub fn options_mut(&mut self) -> &mut DiceRollOptions {
        &mut self.options
    }

    /// Replaces the options, returning the previous ones.
    pub fn set_options(&mut self, options: DiceRollOptions) -> DiceRollOptions {
        std::mem::replace(&mut self.options, options)
    }

    /// Rolls every die once, then applies the options stage by stage.
    ///
    /// See [`crate::DiceRollOption`] for the stage order.
    ///
    /// # Errors
    /// Propagates failures of the random source and of the options.
    /// Nothing is returned from a failed roll.
    pub fn roll(&self) -> Result<DiceRollResult, Error> {
        let initial = self.dice.iter()
            .map(|die| die.roll())
            .collect::<Result<Vec<_>, Error>>()?;

        let mut roll = DiceRollResult::new(initial);
        debug!(set = %self, dice = self.dice.len(), "dice rolled");

        for option in &self.options {
            let logical = roll.logical_ids().to_vec();
            let any_allowed = roll.logical_dice().any(|result| option.allow_reroll(result));

            if any_allowed {
                let rerolled = option.execute_reroll_logic(&mut roll, &logical)?;
                debug!(%option, count = rerolled.len(), "re-roll stage");
                roll.substitute_rerolls(&rerolled);
            }
        }

        for option in &self.options {
            let logical = roll.logical_ids().to_vec();
            let added = option.execute_additional_roll_logic(&mut roll, &logical)?;

            if !added.is_empty() {
                debug!(%option, count = added.len(), "additional roll stage");
                roll.extend_logical(&added);
            }
        }

        for option in &self.options {
            let logical = roll.logical_ids().to_vec();
            option.execute_roll_status_update_logic(&mut roll, &logical)?;
        }

        for option in &self.options {
            let logical = roll.logical_ids().to_vec();
            option.execute_success_calculation_logic(&mut roll, &logical)?;
        }

        for option in &self.options {
            let logical = roll.logical_ids().to_vec();
            option.execute_drop_keep_logic(&mut roll, &logical)?;
            roll.prune_discarded();
        }
        debug!(logical = roll.logical_ids().len(), discarded = roll.discarded_dice().count(), "drop/keep stage");

        let mut synthesized = Vec::new();
        for option in &self.options {
            let initial = roll.initial_ids().to_vec();
            let created = option.execute_virtual_dice_creation_logic(&mut roll, &initial)?;

            if !created.is_empty() {
                debug!(%option, count = created.len(), "virtual dice stage");
                roll.absorb_virtual(&created);
                synthesized.extend(created);
            }
        }

        // Virtual dice count as one logical die each when counting successes.
        if roll.uses_successes() && !synthesized.is_empty() {
            for option in &self.options {
                option.execute_success_calculation_logic(&mut roll, &synthesized)?;
            }
        }

        roll.finalize();
        for option in &self.options {
            option.execute_post_roll_result_calculation(&mut roll)?;
        }

        debug!(
            total = roll.total_value(),
            computed = roll.computed_total(),
            botched = roll.is_botched_roll(),
            "roll finished"
        );

        Ok(roll)
    }
}

impl Display for DiceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.dice.first().map(|die| die.kind()) {
            Some(DieKind::Fate) => write!(f, "{}dF", self.dice.len())?,
            _ => write!(f, "{}d{}", self.dice.len(), self.sides)?
        }

        write!(f, "{}", self.options)
    }
}


/// A macro for conveniently creating [`DiceSet`] instances of standard dice.
///
/// # Syntax
/// - `dice!(SIDES)`: a single die of `SIDES` sides (e.g., `dice!(6)` for 1d6).
/// - `dice!(SIDES, COUNT)`: `COUNT` dice of `SIDES` sides (e.g., `dice!(10, 3)` for 3d10).
/// - `dice!(SIDES, COUNT, MODE_FN)`: adds a [`crate::DropKeep`] option with n = 1.
///   `MODE_FN` must be one of `kh`, `kl`, `dh`, `dl` (e.g., `dice!(20, 2, kh)` for 2d20kh1).
/// - `dice!(SIDES, COUNT, MODE_FN, N)`: same with a custom n (e.g., `dice!(6, 4, kh, 3)` for 4d6kh3).
///
/// # Returns
/// `Result<DiceSet, Error>`, built with a default [`crate::StandardDiceFactory`].
///
/// # Examples
/// ```
/// use diceforge::dice;
///
/// let d6 = dice!(6).unwrap();
/// assert_eq!(d6.to_string(), "1d6");
///
/// let advantage = dice!(20, 2, kh).unwrap();
/// assert_eq!(advantage.to_string(), "2d20kh1");
///
/// let stats = dice!(6, 4, dl, 1).unwrap();
/// assert_eq!(stats.to_string(), "4d6dl1");
///
/// assert!(dice!(1).is_err());
/// ```
#[macro_export]
macro_rules! dice {
    ($sides:literal) => {
        $crate::dice!($sides, 1)
    };

    ($sides:literal, $count:literal) => {
        $crate::DiceFactory::create(&$crate::StandardDiceFactory::default(), $count, Some($sides))
    };

    ($sides:literal, $count:literal, $mode:ident) => {
        $crate::dice!($sides, $count, $mode, 1)
    };

    ($sides:literal, $count:literal, $mode:ident, $n:literal) => {
        $crate::dice!($sides, $count).and_then(|mut set| {
            set.options_mut().add($crate::DropKeep::new($crate::Mode::$mode($n))?)?;
            Ok(set)
        })
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::{DropKeep, Explode, ReRoll, ScriptedRandom, SeededRandom, SharedRandom};
    use crate::result::ResultId;


    fn d(sides: u16, random: &SharedRandom) -> Die {
        Die::new(sides, random.clone()).unwrap()
    }

    #[test]
    fn test_mismatch_leaves_set_unchanged() {
        let random = SeededRandom::shared(1);
        let mut set = DiceSet::from_dice([d(6, &random), d(6, &random)]).unwrap();

        let err = set.add(d(8, &random)).unwrap_err();
        assert_eq!(err, Error::DiceMismatch { expected: 6, found: 8 });
        assert_eq!(set.len(), 2);
        assert_eq!(set.sides(), 6);

        assert!(set.insert(1, d(8, &random)).is_err());
        assert!(set.insert(5, d(6, &random)).is_err());
        set.insert(0, d(6, &random)).unwrap();
        assert_eq!(set.len(), 3);

        assert!(DiceSet::from_dice([d(6, &random), d(4, &random)]).is_err());
    }

    #[test]
    fn test_sides_reset_when_emptied() {
        let random = SeededRandom::shared(1);
        let mut set = DiceSet::from_dice([d(6, &random)]).unwrap();

        assert_eq!(set.sides(), 6);
        assert!(set.remove(3).is_none());
        assert!(set.remove(0).is_some());
        assert_eq!(set.sides(), 0);

        set.add(d(12, &random)).unwrap();
        assert_eq!(set.sides(), 12);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.sides(), 0);
    }

    #[test]
    fn test_get_mut_changes_modifier() {
        let random = ScriptedRandom::shared([3]);
        let mut set = DiceSet::from_dice([d(6, &random)]).unwrap();
        set.get_mut(0).unwrap().add(2).multiply_by(10);

        assert_eq!(set.get(0).unwrap().to_string(), "d6+2*10");
        assert_eq!(set.roll().unwrap().total_value(), 50);
    }

    #[test]
    fn test_empty_roll() {
        let roll = DiceSet::new().roll().unwrap();

        assert_eq!(roll.total_value(), 0);
        assert!(roll.raw_dice().is_empty());
        assert!(!roll.is_botched_roll());
    }

    #[test]
    fn test_pipeline_order() {
        // rolls: 1 4 6 | re-roll of the 1: 2 | explosion of the 6: 5
        let random = ScriptedRandom::shared([1, 4, 6, 2, 5]);
        let dice = (0..3).map(|_| d(6, &random));
        let options = DiceRollOptions::new()
            .with(DropKeep::kh(2).unwrap()).unwrap()
            .with(Explode::standard()).unwrap()
            .with(ReRoll::critical_failure()).unwrap();

        let set = DiceSet::from_dice(dice).unwrap().with_options(options);
        let roll = set.roll().unwrap();

        let numbers = |ids: &[ResultId]| -> Vec<i32> {
            ids.iter().map(|id| roll.result(*id).unwrap().number()).collect()
        };

        assert_eq!(numbers(roll.initial_ids()), vec![1, 4, 6]);
        assert_eq!(numbers(roll.logical_ids()), vec![6, 5]);
        assert_eq!(roll.raw_dice().len(), 5);
        assert_eq!(roll.discarded_dice().count(), 3);
        assert_eq!(roll.total_value(), 11);
        assert_eq!(set.to_string(), "3d6kh2!rcf");
    }

    #[test]
    fn test_botch_without_successes() {
        let random = ScriptedRandom::shared([1]);
        let roll = DiceSet::from_dice([d(6, &random), d(6, &random)]).unwrap().roll().unwrap();
        assert!(roll.is_botched_roll());

        let random = ScriptedRandom::shared([1, 2]);
        let roll = DiceSet::from_dice([d(6, &random), d(6, &random)]).unwrap().roll().unwrap();
        assert!(!roll.is_botched_roll());
    }

    #[test]
    fn test_failed_roll_returns_error() {
        let random = ScriptedRandom::shared([3, 9]);
        let set = DiceSet::from_dice([d(6, &random), d(6, &random)]).unwrap();

        assert!(matches!(set.roll(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_fate_display() {
        let random = SeededRandom::shared(3);
        let set = DiceSet::from_dice([Die::fate(random.clone()), Die::fate(random)]).unwrap();

        assert_eq!(set.to_string(), "2dF");
        let total = set.roll().unwrap().total_value();
        assert!((-2..=2).contains(&total));
    }

    #[test]
    fn test_dice_macro() {
        assert_eq!(dice!(6, 4, kh, 3).unwrap().to_string(), "4d6kh3");
        assert_eq!(dice!(8, 3).unwrap().len(), 3);
        assert!(dice!(6, 2, kh, 0).is_err());
    }
}
