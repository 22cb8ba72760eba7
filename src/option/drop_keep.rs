use std::fmt::Display;
use tracing::trace;
use crate::Error;
use crate::result::{DiceRollResult, ResultId};
use super::{DiceRollOption, OptionType};


/// Which results a [`DropKeep`] option discards: a number of the highest
/// or lowest results, either kept or dropped.
///
/// This is the rule behind the common notation suffixes `kh3`, `kl1`, `dh1` and `dl2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Keep `n` results and discard the others.
    Keep {
        /// If `true`, the `n` highest results are kept.
        /// If `false`, the `n` lowest results are kept.
        highest: bool,
        /// The number of results to keep.
        n: u16
    },

    /// Discard `n` results and keep the others.
    Drop {
        /// If `true`, the `n` highest results are dropped.
        /// If `false`, the `n` lowest results are dropped.
        highest: bool,
        /// The number of results to drop.
        n: u16
    }
}

impl Mode {
    /// Creates a [`Mode::Keep`] mode to keep the `n` highest results.
    pub fn kh(n: u16) -> Self {
        Mode::Keep { highest: true, n }
    }

    /// Creates a [`Mode::Keep`] mode to keep the `n` lowest results.
    pub fn kl(n: u16) -> Self {
        Mode::Keep { highest: false, n }
    }

    /// Creates a [`Mode::Drop`] mode to drop the `n` highest results.
    pub fn dh(n: u16) -> Self {
        Mode::Drop { highest: true, n }
    }

    /// Creates a [`Mode::Drop`] mode to drop the `n` lowest results.
    pub fn dl(n: u16) -> Self {
        Mode::Drop { highest: false, n }
    }

    /// The number of results kept or dropped.
    pub fn value(&self) -> u16 {
        match self {
            Mode::Keep { n, .. } | Mode::Drop { n, .. } => *n
        }
    }

    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `n == 0`.
    fn validate_non_zero(self) -> Result<Self, Error> {
        match self.value() {
            0 => Err(Error::invalid(format!("cannot keep or drop zero dice ({self})"))),
            _ => Ok(self)
        }
    }

    /// How many results of a pool of `len` survive, and whether those are the highest.
    fn kept(&self, len: usize) -> (bool, usize) {
        match *self {
            Mode::Keep { highest, n } => (highest, (n as usize).min(len)),
            Mode::Drop { n, .. } if n as usize >= len => (true, len),
            Mode::Drop { highest, n } => (!highest, len - n as usize)
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (prefix, highest, n) = match self {
            Mode::Keep { highest, n } => ('k', highest, n),
            Mode::Drop { highest, n } => ('d', highest, n)
        };

        write!(f, "{}{}{}", prefix, if *highest { "h" } else { "l" }, n)
    }
}


/// Discards the highest or lowest results of the logical pool.
///
/// Results are ranked by score. Ties are broken by pool position:
/// the earlier result ranks first, whether keeping highest or lowest.
/// Dropping at least as many results as the pool holds discards nothing.
/// A compounding chain counts as one result worth the sum of its links.
///
/// # Examples
/// ```
/// use diceforge::{DiceSet, Die, DropKeep, ScriptedRandom};
///
/// let random = ScriptedRandom::shared([2, 5, 6, 1]);
/// let dice = (0..4).map(|_| Die::new(6, random.clone()).unwrap());
/// let mut set = DiceSet::from_dice(dice).unwrap();
/// set.options_mut().add(DropKeep::kh(3).unwrap()).unwrap();
///
/// let roll = set.roll().unwrap();
/// let kept: Vec<i32> = roll.logical_dice().map(|result| result.number()).collect();
///
/// assert_eq!(kept, vec![2, 5, 6]);
/// assert_eq!(roll.total_value(), 13);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropKeep {
    mode: Mode
}

impl DropKeep {
    /// Wraps `mode` into an option.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the mode keeps or drops zero results.
    pub fn new(mode: Mode) -> Result<Self, Error> {
        Ok(Self { mode: mode.validate_non_zero()? })
    }

    /// Keeps the `n` highest results.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `n == 0`.
    pub fn kh(n: u16) -> Result<Self, Error> {
        Self::new(Mode::kh(n))
    }

    /// Keeps the `n` lowest results.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `n == 0`.
    pub fn kl(n: u16) -> Result<Self, Error> {
        Self::new(Mode::kl(n))
    }

    /// Drops the `n` highest results.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `n == 0`.
    pub fn dh(n: u16) -> Result<Self, Error> {
        Self::new(Mode::dh(n))
    }

    /// Drops the `n` lowest results.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `n == 0`.
    pub fn dl(n: u16) -> Result<Self, Error> {
        Self::new(Mode::dl(n))
    }

    /// The selection rule.
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl Display for DropKeep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mode)
    }
}

impl DiceRollOption for DropKeep {
    fn option_type(&self) -> OptionType {
        OptionType::DropKeep
    }

    fn execute_drop_keep_logic(&self, roll: &mut DiceRollResult, logical: &[ResultId]) -> Result<(), Error> {
        let units = compounding_units(roll, logical)?;

        let (highest, n) = self.mode.kept(units.len());
        for unit in discarded(highest, n, units) {
            for id in unit {
                trace!(%id, mode = %self.mode, "die discarded");
                roll.result_mut(id)?.set_discarded(true);
            }
        }

        Ok(())
    }
}


/// Groups the non-discarded logical results into ranking units.
///
/// Links of one compounding chain form a single unit scored by their summed
/// number through the die's modifier; every other result is a unit on its own.
/// Units are ordered by the pool position of their first member.
fn compounding_units(roll: &DiceRollResult, logical: &[ResultId]) -> Result<Vec<(Vec<ResultId>, i32)>, Error> {
    let mut heads: Vec<ResultId> = Vec::new();
    let mut members: Vec<Vec<ResultId>> = Vec::new();
    let mut sums: Vec<i32> = Vec::new();

    for &id in logical {
        let result = roll.result(id)?;
        if result.was_discarded() {
            continue;
        }

        let head = chain_head(roll, id)?;
        match heads.iter().position(|h| *h == head) {
            Some(unit) => {
                members[unit].push(id);
                sums[unit] = sums[unit].saturating_add(result.number());
            },
            None => {
                heads.push(head);
                members.push(vec![id]);
                sums.push(result.number());
            }
        }
    }

    let mut units = Vec::with_capacity(heads.len());
    for ((head, ids), sum) in heads.into_iter().zip(members).zip(sums) {
        let score = roll.result(head)?.die().apply_modifier(sum);
        units.push((ids, score));
    }

    Ok(units)
}

/// First link of the compounding chain `id` belongs to, or `id` itself.
fn chain_head(roll: &DiceRollResult, id: ResultId) -> Result<ResultId, Error> {
    let mut head = id;

    if !roll.result(id)?.is_compounding() {
        return Ok(head);
    }

    while let Some(previous) = roll.result(head)?.previous_roll() {
        if !roll.result(previous)?.is_compounding() {
            break;
        }
        head = previous;
    }

    Ok(head)
}

fn discarded(highest: bool, n: usize, mut units: Vec<(Vec<ResultId>, i32)>) -> Vec<Vec<ResultId>> {
    if highest {
        units.sort_by(|a, b| b.1.cmp(&a.1));
    } else {
        units.sort_by(|a, b| a.1.cmp(&b.1));
    }

    units.into_iter()
        .skip(n)
        .map(|(ids, _)| ids)
        .collect()
}


#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use super::*;
    use crate::{DiceSet, Die, Explode, ScriptedRandom};
    use crate::test_strategies::mode_strategy;


    fn roll_with(values: &[i32], mode: Mode) -> DiceRollResult {
        let random = ScriptedRandom::shared(values.to_vec());
        let dice = values.iter().map(|_| Die::new(20, random.clone()).unwrap());
        let mut set = DiceSet::from_dice(dice).unwrap();
        set.options_mut().add(DropKeep::new(mode).unwrap()).unwrap();

        set.roll().unwrap()
    }

    fn logical(roll: &DiceRollResult) -> Vec<i32> {
        roll.logical_dice().map(|result| result.number()).collect()
    }

    fn discarded_numbers(roll: &DiceRollResult) -> Vec<i32> {
        roll.discarded_dice().map(|result| result.number()).collect()
    }

    proptest! {
        #[test]
        fn test_mode_constructors(n in 1..100u16) {
            let kh = matches!(Mode::kh(n), Mode::Keep { highest: true, .. });
            let kl = matches!(Mode::kl(n), Mode::Keep { highest: false, .. });
            let dh = matches!(Mode::dh(n), Mode::Drop { highest: true, .. });
            let dl = matches!(Mode::dl(n), Mode::Drop { highest: false, .. });

            prop_assert!(kh && kl && dh && dl);
            prop_assert_eq!(Mode::kh(n).value(), n);
        }

        #[test]
        fn test_mode_validation(n in 0..100u16, highest: bool) {
            let keep = DropKeep::new(Mode::Keep { highest, n });
            let drop = DropKeep::new(Mode::Drop { highest, n });

            if n == 0 {
                prop_assert!(matches!(keep, Err(Error::InvalidArgument(_))));
                prop_assert!(matches!(drop, Err(Error::InvalidArgument(_))));
            } else {
                prop_assert!(keep.is_ok());
                prop_assert!(drop.is_ok());
            }
        }

        #[test]
        fn test_mode_display(n in 1..100u16, highest: bool) {
            let keep = Mode::Keep { highest, n }.to_string();
            let drop = Mode::Drop { highest, n }.to_string();

            if highest {
                prop_assert_eq!(keep, format!("kh{n}"));
                prop_assert_eq!(drop, format!("dh{n}"));
            } else {
                prop_assert_eq!(keep, format!("kl{n}"));
                prop_assert_eq!(drop, format!("dl{n}"));
            }
        }

        #[test]
        fn test_discard_counts(
            values in prop::collection::vec(1..=20i32, 1..10),
            mode in mode_strategy(12)
        ) {
            let roll = roll_with(&values, mode);
            let len = values.len();

            let expected_kept = match mode {
                Mode::Keep { n, .. } => (n as usize).min(len),
                Mode::Drop { n, .. } if n as usize >= len => len,
                Mode::Drop { n, .. } => len - n as usize
            };

            prop_assert_eq!(roll.logical_ids().len(), expected_kept);
            prop_assert_eq!(roll.discarded_dice().count(), len - expected_kept);

            let kept: i32 = logical(&roll).iter().sum();
            prop_assert_eq!(roll.total_value(), kept);
        }

        #[test]
        fn test_kept_outrank_discarded(values in prop::collection::vec(1..=20i32, 2..10), n in 1..5u16) {
            let roll = roll_with(&values, Mode::kh(n));

            let lowest_kept = logical(&roll).into_iter().min();
            let highest_discarded = discarded_numbers(&roll).into_iter().max();

            if let (Some(kept), Some(discarded)) = (lowest_kept, highest_discarded) {
                prop_assert!(kept >= discarded);
            }
        }
    }

    #[test]
    fn test_keep_highest_preserves_pool_order() {
        let roll = roll_with(&[2, 5, 6, 1], Mode::kh(3));

        assert_eq!(logical(&roll), vec![2, 5, 6]);
        assert_eq!(discarded_numbers(&roll), vec![1]);
        assert_eq!(roll.total_value(), 13);
    }

    #[test]
    fn test_ties_broken_by_position() {
        let roll = roll_with(&[4, 4, 4], Mode::kh(1));
        assert!(!roll.raw_dice()[0].was_discarded());
        assert!(roll.raw_dice()[1].was_discarded());

        let roll = roll_with(&[4, 4, 4], Mode::kl(2));
        assert!(!roll.raw_dice()[0].was_discarded());
        assert!(!roll.raw_dice()[1].was_discarded());
        assert!(roll.raw_dice()[2].was_discarded());
    }

    #[test]
    fn test_drop_lowest() {
        let roll = roll_with(&[3, 18, 7, 12], Mode::dl(2));
        assert_eq!(logical(&roll), vec![18, 12]);

        let roll = roll_with(&[3, 18, 7, 12], Mode::dh(1));
        assert_eq!(logical(&roll), vec![3, 7, 12]);
    }

    #[test]
    fn test_compounding_chain_ranks_as_one_die() {
        let random = ScriptedRandom::shared([6, 5, 6, 2]);
        let dice = (0..2).map(|_| Die::new(6, random.clone()).unwrap());
        let mut set = DiceSet::from_dice(dice).unwrap();
        set.options_mut().add(Explode::compounding()).unwrap();
        set.options_mut().add(DropKeep::kh(1).unwrap()).unwrap();

        let roll = set.roll().unwrap();

        assert_eq!(logical(&roll), vec![14]);
        assert_eq!(roll.total_value(), 14);
        assert_eq!(discarded_numbers(&roll), vec![5]);

        let random = ScriptedRandom::shared([6, 5, 6, 2]);
        let dice = (0..2).map(|_| Die::new(6, random.clone()).unwrap());
        let mut set = DiceSet::from_dice(dice).unwrap();
        set.options_mut().add(Explode::compounding()).unwrap();
        set.options_mut().add(DropKeep::kl(1).unwrap()).unwrap();

        let roll = set.roll().unwrap();

        assert_eq!(logical(&roll), vec![5]);
        assert_eq!(discarded_numbers(&roll), vec![6, 6, 2]);
    }

    #[test]
    fn test_drop_everything_discards_nothing() {
        let roll = roll_with(&[3, 18], Mode::dh(5));

        assert_eq!(logical(&roll), vec![3, 18]);
        assert_eq!(roll.discarded_dice().count(), 0);
    }
}
