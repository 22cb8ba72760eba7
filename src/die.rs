use std::{fmt::Display, sync::Arc};
use tracing::trace;
use crate::{Error, Modifier, ModifierType, SharedRandom, ThreadRandom};
use crate::result::DieRollResult;


const FATE_SIDES: u16 = 6;


/// Distinguishes numbered dice from three-symbol Fate dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DieKind {
    /// A die numbered `1..=sides`.
    Standard,
    /// A six-faced die reading `-1`, `0` or `+1`.
    Fate
}


/// A single die: its side count, which sides are critical, an optional
/// modifier chain and the random source it rolls with.
///
/// Dice are shared through [`Arc`] by the results they produce, so that a
/// result can roll its die again when re-rolled or exploded.
///
/// # Examples
/// ```
/// use diceforge::{Die, SeededRandom};
/// use std::sync::Arc;
///
/// let die = Arc::new(Die::new(20, SeededRandom::shared(7)).unwrap());
/// let result = die.roll().unwrap();
///
/// assert!((1..=20).contains(&result.side_rolled()));
/// ```
#[derive(Debug, Clone)]
pub struct Die {
    sides: u16,
    kind: DieKind,
    critical_success: Vec<bool>,
    critical_failure: Vec<bool>,
    modifier: Option<Modifier>,
    random: SharedRandom
}

/// The raw outcome of one throw, before it is wrapped into a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Throw {
    pub side: i32,
    pub number: i32,
    pub critical_success: bool,
    pub critical_failure: bool
}

impl Die {
    /// Creates a new [`DieBuilder`] for a die with `sides` sides.
    ///
    /// # Examples
    /// ```
    /// use diceforge::{Die, ScriptedRandom};
    /// use std::sync::Arc;
    ///
    /// // Sides are 0-based indices: 9 and 10 are the top two faces of a d10.
    /// let die = Die::builder(10)
    ///     .critical_success_sides([8, 9])
    ///     .random(ScriptedRandom::shared([9]))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(Arc::new(die).roll().unwrap().is_critical_success());
    /// ```
    pub fn builder(sides: u16) -> DieBuilder {
        DieBuilder::new(sides)
    }

    /// Creates a standard die with default criticality:
    /// side 1 fails critically, the highest side succeeds critically.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `sides < 2`.
    pub fn new(sides: u16, random: SharedRandom) -> Result<Self, Error> {
        Self::builder(sides).random(random).build()
    }

    /// Creates a Fate die. Its criticality tables are fixed and all false.
    pub fn fate(random: SharedRandom) -> Self {
        Self {
            sides: FATE_SIDES,
            kind: DieKind::Fate,
            critical_success: vec![false; FATE_SIDES as usize],
            critical_failure: vec![false; FATE_SIDES as usize],
            modifier: None,
            random
        }
    }

    /// Number of faces.
    pub fn sides(&self) -> u16 {
        self.sides
    }

    /// Whether this is a standard or a Fate die.
    pub fn kind(&self) -> DieKind {
        self.kind
    }

    /// Critical success flags indexed by `side - 1`.
    pub fn critical_success_sides(&self) -> &[bool] {
        &self.critical_success
    }

    /// Critical failure flags indexed by `side - 1`.
    pub fn critical_failure_sides(&self) -> &[bool] {
        &self.critical_failure
    }

    /// The random source this die rolls with.
    pub fn random(&self) -> &SharedRandom {
        &self.random
    }

    /// The modifier chain attached to this die, if any.
    pub fn modifier(&self) -> Option<&Modifier> {
        self.modifier.as_ref()
    }

    /// Replaces the modifier chain, returning the previous one.
    pub fn set_modifier(&mut self, modifier: Option<Modifier>) -> Option<Modifier> {
        std::mem::replace(&mut self.modifier, modifier)
    }

    /// Replaces the modifier with a single `+value` node and returns it for chaining.
    pub fn add(&mut self, value: i32) -> &mut Modifier {
        self.replace_modifier(ModifierType::Add, value)
    }

    /// Replaces the modifier with a single `-value` node and returns it for chaining.
    pub fn subtract(&mut self, value: i32) -> &mut Modifier {
        self.replace_modifier(ModifierType::Subtract, value)
    }

    /// Replaces the modifier with a single `*value` node and returns it for chaining.
    pub fn multiply_by(&mut self, value: i32) -> &mut Modifier {
        self.replace_modifier(ModifierType::Multiply, value)
    }

    /// Replaces the modifier with a single `/value` node and returns it for chaining.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `value` is zero; the current modifier is kept.
    pub fn divide_by(&mut self, value: i32) -> Result<&mut Modifier, Error> {
        let node = Modifier::new(ModifierType::Divide, value)?;
        Ok(self.modifier.insert(node))
    }

    fn replace_modifier(&mut self, kind: ModifierType, value: i32) -> &mut Modifier {
        self.modifier.insert(Modifier::node(kind, value))
    }

    /// Passes `number` through the modifier chain, or returns it unchanged without one.
    pub fn apply_modifier(&self, number: i32) -> i32 {
        self.modifier.as_ref().map_or(number, |modifier| modifier.process(number))
    }

    /// Whether landing on `side` (1-based) is a critical success.
    pub fn is_critical_success_side(&self, side: i32) -> bool {
        side_flag(&self.critical_success, side)
    }

    /// Whether landing on `side` (1-based) is a critical failure.
    pub fn is_critical_failure_side(&self, side: i32) -> bool {
        side_flag(&self.critical_failure, side)
    }

    /// Rolls the die once.
    ///
    /// # Errors
    /// Propagates failures of the random source.
    pub fn roll(self: &Arc<Self>) -> Result<DieRollResult, Error> {
        let throw = self.throw()?;
        Ok(DieRollResult::concrete(Arc::clone(self), throw))
    }

    pub(crate) fn throw(&self) -> Result<Throw, Error> {
        let side = self.random.next_range(1, i32::from(self.sides) + 1)?;

        let throw = match self.kind {
            DieKind::Standard => Throw {
                side,
                number: side,
                critical_success: self.is_critical_success_side(side),
                critical_failure: self.is_critical_failure_side(side)
            },
            DieKind::Fate => Throw {
                side,
                number: fate_value(side),
                critical_success: false,
                critical_failure: false
            }
        };

        trace!(die = %self, side = throw.side, number = throw.number, "die rolled");
        Ok(throw)
    }
}

impl Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            DieKind::Standard => write!(f, "d{}", self.sides)?,
            DieKind::Fate => write!(f, "dF")?
        }

        match &self.modifier {
            Some(modifier) => write!(f, "{modifier}"),
            None => Ok(())
        }
    }
}


fn side_flag(table: &[bool], side: i32) -> bool {
    usize::try_from(side - 1)
        .ok()
        .and_then(|index| table.get(index).copied())
        .unwrap_or(false)
}

fn fate_value(side: i32) -> i32 {
    match side {
        ..=2 => -1,
        3 | 4 => 0,
        _ => 1
    }
}


/// A builder for [`Die`] instances.
///
/// Criticality tables left unset fall back to the usual convention:
/// side 1 is a critical failure and the highest side a critical success.
#[derive(Debug, Clone)]
pub struct DieBuilder {
    sides: u16,
    critical_success: Option<Vec<bool>>,
    critical_failure: Option<Vec<bool>>,
    invalid_side: Option<usize>,
    modifier: Option<Modifier>,
    random: Option<SharedRandom>
}

impl DieBuilder {
    fn new(sides: u16) -> Self {
        Self {
            sides,
            critical_success: None,
            critical_failure: None,
            invalid_side: None,
            modifier: None,
            random: None
        }
    }

    /// Marks the given 0-based side indices as critical successes.
    pub fn critical_success_sides(mut self, sides: impl IntoIterator<Item = usize>) -> Self {
        self.critical_success = Some(self.table_from(sides));
        self
    }

    /// Marks the given 0-based side indices as critical failures.
    pub fn critical_failure_sides(mut self, sides: impl IntoIterator<Item = usize>) -> Self {
        self.critical_failure = Some(self.table_from(sides));
        self
    }

    /// Supplies both criticality tables verbatim. Each must have one entry per side.
    pub fn critical_tables(mut self, success: Vec<bool>, failure: Vec<bool>) -> Self {
        self.critical_success = Some(success);
        self.critical_failure = Some(failure);
        self
    }

    /// Attaches a modifier chain.
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Sets the random source. Defaults to [`ThreadRandom`].
    pub fn random(mut self, random: SharedRandom) -> Self {
        self.random = Some(random);
        self
    }

    fn table_from(&mut self, sides: impl IntoIterator<Item = usize>) -> Vec<bool> {
        let mut table = vec![false; self.sides as usize];

        for side in sides {
            match table.get_mut(side) {
                Some(flag) => *flag = true,
                None => self.invalid_side = self.invalid_side.or(Some(side))
            }
        }

        table
    }

    /// Finalizes the configuration and builds the [`Die`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if
    /// - `sides < 2`,
    /// - a side index given to a `critical_*_sides` method is out of range,
    /// - a table given to [`DieBuilder::critical_tables`] does not have `sides` entries.
    pub fn build(self) -> Result<Die, Error> {
        if self.sides < 2 {
            return Err(Error::invalid(format!("sides must be 2 or greater, got {}", self.sides)));
        }

        if let Some(side) = self.invalid_side {
            return Err(Error::invalid(format!("side index {side} is out of range for a d{}", self.sides)));
        }

        let sides = self.sides as usize;
        let critical_success = match self.critical_success {
            Some(table) => checked_table(table, sides, "critical success")?,
            None => default_table(sides, sides - 1)
        };

        let critical_failure = match self.critical_failure {
            Some(table) => checked_table(table, sides, "critical failure")?,
            None => default_table(sides, 0)
        };

        Ok(Die {
            sides: self.sides,
            kind: DieKind::Standard,
            critical_success,
            critical_failure,
            modifier: self.modifier,
            random: self.random.unwrap_or_else(ThreadRandom::shared)
        })
    }
}

fn default_table(sides: usize, flagged: usize) -> Vec<bool> {
    let mut table = vec![false; sides];
    table[flagged] = true;
    table
}

fn checked_table(table: Vec<bool>, sides: usize, name: &str) -> Result<Vec<bool>, Error> {
    if table.len() != sides {
        return Err(Error::invalid(format!("{name} table has {} entries, expected {sides}", table.len())));
    }

    Ok(table)
}
