use std::{fmt::Display, sync::Arc};
use tracing::debug;
use crate::Error;
use crate::result::{DiceRollResult, DieRollResult, ResultId};
use super::{DiceRollOption, OptionType};


/// Maximum number of explosions chained onto a single die.
pub const MAX_CHAIN_LENGTH: usize = 100;


/// How an exploding die counts its extra rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplodeStyle {
    /// Every extra roll is a separate result.
    Standard,
    /// Extra rolls are summed into one virtual result.
    Compounding,
    /// Like compounding, with every extra roll lowered by one.
    Penetrating
}


/// Rolls a die again each time it lands on a critical success.
///
/// Extra rolls that are critical successes themselves keep exploding,
/// up to [`MAX_CHAIN_LENGTH`] times per die.
///
/// # Examples
/// ```
/// use diceforge::{DiceSet, Die, Explode, ScriptedRandom};
///
/// let random = ScriptedRandom::shared([6, 6, 4]);
/// let mut set = DiceSet::from_dice([Die::new(6, random).unwrap()]).unwrap();
/// set.options_mut().add(Explode::compounding()).unwrap();
///
/// let roll = set.roll().unwrap();
/// let logical: Vec<_> = roll.logical_dice().collect();
///
/// assert_eq!(logical.len(), 1);
/// assert!(logical[0].is_virtual());
/// assert_eq!(roll.total_value(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Explode {
    style: ExplodeStyle
}

impl Explode {
    /// Each extra roll counts on its own: `!`.
    pub fn standard() -> Self {
        Self { style: ExplodeStyle::Standard }
    }

    /// Extra rolls add up with the original into a single result: `!!`.
    pub fn compounding() -> Self {
        Self { style: ExplodeStyle::Compounding }
    }

    /// Compounding, each extra roll counting one less: `!p`.
    pub fn penetrating() -> Self {
        Self { style: ExplodeStyle::Penetrating }
    }

    /// How extra rolls are counted.
    pub fn style(&self) -> ExplodeStyle {
        self.style
    }

    fn qualifies(result: &DieRollResult) -> bool {
        !result.is_virtual()
            && !result.was_discarded()
            && result.next_roll().is_none()
            && result.is_critical_success()
    }

    fn explode(&self, roll: &mut DiceRollResult, id: ResultId) -> Result<ResultId, Error> {
        match self.style {
            ExplodeStyle::Standard => roll.explode(id),
            ExplodeStyle::Compounding => roll.explode_compounding(id),
            ExplodeStyle::Penetrating => roll.explode_penetrating(id)
        }
    }
}

impl Display for Explode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.style {
            ExplodeStyle::Standard => write!(f, "!"),
            ExplodeStyle::Compounding => write!(f, "!!"),
            ExplodeStyle::Penetrating => write!(f, "!p")
        }
    }
}

impl DiceRollOption for Explode {
    fn option_type(&self) -> OptionType {
        OptionType::Explode
    }

    fn execute_additional_roll_logic(&self, roll: &mut DiceRollResult, logical: &[ResultId]) -> Result<Vec<ResultId>, Error> {
        let mut added = Vec::new();

        for &start in logical {
            let mut current = start;
            let mut links = 0;

            while Self::qualifies(roll.result(current)?) {
                if links == MAX_CHAIN_LENGTH {
                    debug!(die = %start, "explosion chain capped at {MAX_CHAIN_LENGTH}");
                    break;
                }

                current = self.explode(roll, current)?;
                added.push(current);
                links += 1;
            }
        }

        Ok(added)
    }

    fn execute_virtual_dice_creation_logic(&self, roll: &mut DiceRollResult, initial: &[ResultId]) -> Result<Vec<ResultId>, Error> {
        if self.style == ExplodeStyle::Standard {
            return Ok(Vec::new());
        }

        let mut created = Vec::new();

        for &start in initial {
            if let Some(result) = compound_chain(roll, start)? {
                created.push(roll.add_virtual(result)?);
            }
        }

        Ok(created)
    }
}


/// Sums the non-discarded compounding links of the chain starting at `start`.
fn compound_chain(roll: &DiceRollResult, start: ResultId) -> Result<Option<DieRollResult>, Error> {
    let head = roll.result(start)?;
    let mut components = Vec::new();
    let mut total = 0i32;
    let mut cursor = Some(start);

    while let Some(id) = cursor {
        let link = roll.result(id)?;

        if link.is_compounding() && !link.was_discarded() {
            total = total.saturating_add(link.number());
            components.push(id);
        }

        cursor = link.next_roll();
    }

    if components.is_empty() {
        return Ok(None);
    }

    Ok(Some(DieRollResult::synthetic(Arc::clone(head.die()), total, components)))
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::{DiceSet, Die, ScriptedRandom};


    fn roll_with(values: &[i32], count: usize, option: Explode) -> DiceRollResult {
        let random = ScriptedRandom::shared(values.to_vec());
        let dice = (0..count).map(|_| Die::new(6, random.clone()).unwrap());
        let mut set = DiceSet::from_dice(dice).unwrap();
        set.options_mut().add(option).unwrap();

        set.roll().unwrap()
    }

    fn numbers<'a>(results: impl Iterator<Item = &'a DieRollResult>) -> Vec<i32> {
        results.map(DieRollResult::number).collect()
    }

    #[test]
    fn test_standard_explosion_chain() {
        let roll = roll_with(&[6, 3, 6, 2], 2, Explode::standard());

        assert_eq!(numbers(roll.logical_dice()), vec![6, 3, 6, 2]);
        assert_eq!(roll.total_value(), 17);

        let first = &roll.raw_dice()[0];
        assert_eq!(first.next_roll().map(ResultId::index), Some(2));
        assert!(!first.is_compounding());
    }

    #[test]
    fn test_compounding_replaces_links() {
        let roll = roll_with(&[6, 2, 6, 4], 2, Explode::compounding());

        assert_eq!(numbers(roll.logical_dice()), vec![2, 16]);
        assert_eq!(roll.total_value(), 18);

        let virtual_result = roll.logical_dice().find(|result| result.is_virtual()).unwrap();
        assert!(virtual_result.is_critical_success());
        assert_eq!(virtual_result.components().len(), 3);
        assert_eq!(roll.raw_dice().len(), 5);
    }

    #[test]
    fn test_penetrating_lowers_extra_rolls() {
        let roll = roll_with(&[6, 6, 4], 1, Explode::penetrating());

        assert_eq!(numbers(roll.raw_dice().iter().take(3)), vec![6, 5, 3]);
        assert_eq!(roll.total_value(), 14);
    }

    #[test]
    fn test_no_compounding_without_explosion() {
        let roll = roll_with(&[3, 4], 2, Explode::compounding());

        assert!(roll.logical_dice().all(|result| !result.is_virtual()));
        assert_eq!(roll.total_value(), 7);
    }

    #[test]
    fn test_chain_is_capped() {
        let roll = roll_with(&[6], 1, Explode::standard());

        assert_eq!(roll.raw_dice().len(), MAX_CHAIN_LENGTH + 1);
        assert_eq!(roll.total_value(), 6 * (MAX_CHAIN_LENGTH as i32 + 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Explode::standard().to_string(), "!");
        assert_eq!(Explode::compounding().to_string(), "!!");
        assert_eq!(Explode::penetrating().to_string(), "!p");
    }
}
