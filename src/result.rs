use std::{collections::{BTreeMap, HashSet}, fmt::Display, sync::Arc};
use tracing::trace;
use crate::{Die, Error};
use crate::die::Throw;


/// Key of the rolled number in a [`ResultValueSet`].
pub const NUMBER: &str = "Number";

/// Key under which success-counting options store a result's successes.
pub const SUCCESSES: &str = "Successes";


/// Named numeric values attached to a die result.
///
/// Every result carries at least [`NUMBER`]; options may add more,
/// such as [`SUCCESSES`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultValueSet(BTreeMap<String, i32>);

impl ResultValueSet {
    /// Creates a set holding only `number` under [`NUMBER`].
    pub fn with_number(number: i32) -> Self {
        let mut set = Self::default();
        set.set(NUMBER, number);
        set
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<i32> {
        self.0.get(key).copied()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: i32) -> Option<i32> {
        self.0.insert(key.into(), value)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<i32> {
        self.0.remove(key)
    }

    /// Shortcut for the [`NUMBER`] entry.
    pub fn number(&self) -> i32 {
        self.get(NUMBER).unwrap_or_default()
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}


/// Position of a [`DieRollResult`] inside the [`DiceRollResult`] that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultId(usize);

impl ResultId {
    /// Index in [`DiceRollResult::raw_dice`].
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for ResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}


/// Whether a result came from an actual throw or was synthesized by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Produced by rolling a die; can be re-rolled and exploded.
    Concrete,
    /// Stands in for several other results, e.g. a summed compounding chain.
    Virtual
}


/// The outcome of rolling one die.
#[derive(Debug, Clone)]
pub struct DieRollResult {
    die: Arc<Die>,
    kind: ResultKind,
    side_rolled: i32,
    value: ResultValueSet,
    is_critical_success: bool,
    is_critical_failure: bool,
    was_discarded: bool,
    is_compounding: bool,
    next_roll: Option<ResultId>,
    previous_roll: Option<ResultId>,
    components: Vec<ResultId>
}

impl DieRollResult {
    pub(crate) fn concrete(die: Arc<Die>, throw: Throw) -> Self {
        Self {
            die,
            kind: ResultKind::Concrete,
            side_rolled: throw.side,
            value: ResultValueSet::with_number(throw.number),
            is_critical_success: throw.critical_success,
            is_critical_failure: throw.critical_failure,
            was_discarded: false,
            is_compounding: false,
            next_roll: None,
            previous_roll: None,
            components: Vec::new()
        }
    }

    /// Creates a virtual result worth `number`, standing in for `components`.
    ///
    /// Virtual results are flagged as critical successes since they only
    /// come into existence through explosions. They cannot be re-rolled or exploded.
    pub fn synthetic(die: Arc<Die>, number: i32, components: Vec<ResultId>) -> Self {
        Self {
            die,
            kind: ResultKind::Virtual,
            side_rolled: number,
            value: ResultValueSet::with_number(number),
            is_critical_success: true,
            is_critical_failure: false,
            was_discarded: false,
            is_compounding: false,
            next_roll: None,
            previous_roll: None,
            components
        }
    }

    /// The die that was rolled.
    pub fn die(&self) -> &Arc<Die> {
        &self.die
    }

    /// Concrete or virtual.
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Shortcut for `kind() == ResultKind::Virtual`.
    pub fn is_virtual(&self) -> bool {
        self.kind == ResultKind::Virtual
    }

    /// The face the die landed on. For virtual results, the synthesized number.
    pub fn side_rolled(&self) -> i32 {
        self.side_rolled
    }

    /// The named values of this result.
    pub fn value(&self) -> &ResultValueSet {
        &self.value
    }

    /// Mutable access to the named values of this result.
    pub fn value_mut(&mut self) -> &mut ResultValueSet {
        &mut self.value
    }

    /// The [`NUMBER`] value: the face for standard dice, `-1..=1` for Fate dice.
    pub fn number(&self) -> i32 {
        self.value.number()
    }

    /// The number passed through the die's modifier chain; what totals add up.
    pub fn score(&self) -> i32 {
        self.die.apply_modifier(self.number())
    }

    /// The [`SUCCESSES`] value, `0` when none was computed.
    pub fn successes(&self) -> i32 {
        self.value.get(SUCCESSES).unwrap_or_default()
    }

    /// Whether the result counts as a critical success.
    pub fn is_critical_success(&self) -> bool {
        self.is_critical_success
    }

    /// Overrides the critical success flag.
    pub fn set_critical_success(&mut self, value: bool) {
        self.is_critical_success = value;
    }

    /// Whether the result counts as a critical failure.
    pub fn is_critical_failure(&self) -> bool {
        self.is_critical_failure
    }

    /// Overrides the critical failure flag.
    pub fn set_critical_failure(&mut self, value: bool) {
        self.is_critical_failure = value;
    }

    /// Discarded results stay in the raw pool but never count toward the total.
    pub fn was_discarded(&self) -> bool {
        self.was_discarded
    }

    /// Flags or unflags the result as discarded.
    pub fn set_discarded(&mut self, value: bool) {
        self.was_discarded = value;
    }

    /// Part of a compounding explosion chain.
    pub fn is_compounding(&self) -> bool {
        self.is_compounding
    }

    /// The result produced when this one was re-rolled or exploded.
    pub fn next_roll(&self) -> Option<ResultId> {
        self.next_roll
    }

    /// The result this one was re-rolled or exploded from.
    pub fn previous_roll(&self) -> Option<ResultId> {
        self.previous_roll
    }

    /// For virtual results, the results they were synthesized from.
    pub fn components(&self) -> &[ResultId] {
        &self.components
    }
}


/// Everything a [`crate::DiceSet::roll`] produced.
///
/// Owns every [`DieRollResult`] of the roll in creation order (the raw pool)
/// and exposes the partitions the rule pipeline derives from it.
/// Results refer to each other through [`ResultId`]s, forming one chain per die.
#[derive(Debug, Clone, Default)]
pub struct DiceRollResult {
    results: Vec<DieRollResult>,
    initial: Vec<ResultId>,
    logical: Vec<ResultId>,
    matching: Vec<Vec<ResultId>>,
    uses_successes: bool,
    is_botched: bool,
    computed_total: i32,
    override_total: Option<i32>
}

impl DiceRollResult {
    /// Wraps freshly rolled results; they form both the initial and the logical pool.
    pub fn new(initial: Vec<DieRollResult>) -> Self {
        let ids: Vec<ResultId> = (0..initial.len()).map(ResultId).collect();

        Self {
            results: initial,
            initial: ids.clone(),
            logical: ids,
            ..Self::default()
        }
    }

    /// Returns the result with the given id.
    pub fn get(&self, id: ResultId) -> Option<&DieRollResult> {
        self.results.get(id.0)
    }

    /// Returns the result with the given id mutably.
    pub fn get_mut(&mut self, id: ResultId) -> Option<&mut DieRollResult> {
        self.results.get_mut(id.0)
    }

    /// Like [`DiceRollResult::get`], failing on foreign ids.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `id` does not belong to this roll.
    pub fn result(&self, id: ResultId) -> Result<&DieRollResult, Error> {
        self.get(id).ok_or_else(|| foreign(id))
    }

    /// Like [`DiceRollResult::get_mut`], failing on foreign ids.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `id` does not belong to this roll.
    pub fn result_mut(&mut self, id: ResultId) -> Result<&mut DieRollResult, Error> {
        self.results.get_mut(id.0).ok_or_else(|| foreign(id))
    }

    /// The first result of every die, in dice order.
    pub fn initial_dice(&self) -> impl Iterator<Item = &DieRollResult> {
        self.resolve(&self.initial)
    }

    /// Every result, including re-rolls, explosions and virtual dice.
    pub fn raw_dice(&self) -> &[DieRollResult] {
        &self.results
    }

    /// The results that are scored.
    pub fn logical_dice(&self) -> impl Iterator<Item = &DieRollResult> {
        self.resolve(&self.logical)
    }

    /// Every result flagged as discarded, re-rolled ones included.
    pub fn discarded_dice(&self) -> impl Iterator<Item = &DieRollResult> {
        self.results.iter().filter(|result| result.was_discarded)
    }

    /// Groups of two or more logical results sharing a score, highest score first.
    pub fn matching_dice_sets(&self) -> Vec<Vec<&DieRollResult>> {
        self.matching.iter()
            .map(|set| self.resolve(set).collect())
            .collect()
    }

    /// Ids of [`DiceRollResult::initial_dice`].
    pub fn initial_ids(&self) -> &[ResultId] {
        &self.initial
    }

    /// Ids of [`DiceRollResult::logical_dice`].
    pub fn logical_ids(&self) -> &[ResultId] {
        &self.logical
    }

    /// Ids of [`DiceRollResult::matching_dice_sets`].
    pub fn matching_ids(&self) -> &[Vec<ResultId>] {
        &self.matching
    }

    /// Whether the total counts successes instead of adding scores.
    pub fn uses_successes(&self) -> bool {
        self.uses_successes
    }

    /// Switches the total to success counting.
    pub fn set_uses_successes(&mut self, value: bool) {
        self.uses_successes = value;
    }

    /// Sum of the [`SUCCESSES`] values of the logical pool.
    pub fn successes(&self) -> i32 {
        self.logical_dice().map(DieRollResult::successes).sum()
    }

    /// Whether the roll is a botch.
    pub fn is_botched_roll(&self) -> bool {
        self.is_botched
    }

    /// Overrides the botch flag. [`crate::DiceSet::roll`] sets it after every option ran.
    pub fn set_botched_roll(&mut self, value: bool) {
        self.is_botched = value;
    }

    /// The final value: the override when one is set, the computed total otherwise.
    pub fn total_value(&self) -> i32 {
        self.override_total.unwrap_or(self.computed_total)
    }

    /// The total as computed from the logical pool, ignoring any override.
    pub fn computed_total(&self) -> i32 {
        self.computed_total
    }

    /// Replaces the reported total without touching the underlying results.
    pub fn override_total_value(&mut self, value: i32) {
        self.override_total = Some(value);
    }

    /// Drops the override, restoring the computed total.
    pub fn clear_override(&mut self) {
        self.override_total = None;
    }

    /// Whether an override total is set.
    pub fn is_overridden(&self) -> bool {
        self.override_total.is_some()
    }

    /// Rolls the die of `id` again, discarding `id` in favor of the new result.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] if `id` does not belong to this roll.
    /// - [`Error::UnsupportedOperation`] if `id` is virtual or already has a follow-up roll.
    /// - Failures of the die's random source; the roll is left untouched.
    pub fn reroll(&mut self, id: ResultId) -> Result<ResultId, Error> {
        let next = self.roll_again(id, "re-roll")?;
        self.results[id.0].was_discarded = true;

        Ok(self.link(id, next, "re-rolled"))
    }

    /// Rolls the die of `id` again; both results count.
    ///
    /// # Errors
    /// Same as [`DiceRollResult::reroll`].
    pub fn explode(&mut self, id: ResultId) -> Result<ResultId, Error> {
        let next = self.roll_again(id, "explode")?;
        Ok(self.link(id, next, "exploded"))
    }

    /// Rolls the die of `id` again, flagging both results as compounding.
    ///
    /// # Errors
    /// Same as [`DiceRollResult::reroll`].
    pub fn explode_compounding(&mut self, id: ResultId) -> Result<ResultId, Error> {
        let mut next = self.roll_again(id, "explode")?;
        next.is_compounding = true;
        self.results[id.0].is_compounding = true;

        Ok(self.link(id, next, "compounded"))
    }

    /// Like [`DiceRollResult::explode_compounding`], with the new result's number lowered by one.
    ///
    /// # Errors
    /// Same as [`DiceRollResult::reroll`].
    pub fn explode_penetrating(&mut self, id: ResultId) -> Result<ResultId, Error> {
        let mut next = self.roll_again(id, "explode")?;
        next.is_compounding = true;
        let number = next.number();
        next.value.set(NUMBER, number - 1);
        self.results[id.0].is_compounding = true;

        Ok(self.link(id, next, "penetrated"))
    }

    /// Adds a virtual result to the raw pool.
    ///
    /// The pipeline later swaps its components for it in the logical pool.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `result` is not virtual
    /// or lists a component that does not belong to this roll.
    pub fn add_virtual(&mut self, result: DieRollResult) -> Result<ResultId, Error> {
        if !result.is_virtual() {
            return Err(Error::invalid("only virtual results can be added to a roll"));
        }

        if let Some(id) = result.components.iter().find(|id| self.get(**id).is_none()) {
            return Err(foreign(*id));
        }

        let id = ResultId(self.results.len());
        trace!(%id, number = result.number(), components = result.components.len(), "virtual die created");
        self.results.push(result);
        Ok(id)
    }

    fn roll_again(&self, id: ResultId, operation: &str) -> Result<DieRollResult, Error> {
        let current = self.result(id)?;

        if current.is_virtual() {
            return Err(Error::UnsupportedOperation(format!("cannot {operation} virtual result {id}")));
        }

        if let Some(next) = current.next_roll {
            return Err(Error::UnsupportedOperation(format!("result {id} was already followed by {next}")));
        }

        current.die.roll()
    }

    fn link(&mut self, id: ResultId, mut next: DieRollResult, action: &str) -> ResultId {
        let next_id = ResultId(self.results.len());
        next.previous_roll = Some(id);
        self.results[id.0].next_roll = Some(next_id);

        trace!(%id, next = %next_id, side = next.side_rolled, "{action}");
        self.results.push(next);
        next_id
    }

    fn resolve<'a>(&'a self, ids: &'a [ResultId]) -> impl Iterator<Item = &'a DieRollResult> {
        ids.iter().filter_map(|id| self.get(*id))
    }

    pub(crate) fn substitute_rerolls(&mut self, rerolled: &[ResultId]) {
        for &id in rerolled {
            let previous = self.get(id).and_then(|result| result.previous_roll);

            match previous.and_then(|previous| self.logical.iter().position(|l| *l == previous)) {
                Some(position) => self.logical[position] = id,
                None => self.logical.push(id)
            }
        }
    }

    pub(crate) fn extend_logical(&mut self, added: &[ResultId]) {
        for &id in added {
            if !self.logical.contains(&id) {
                self.logical.push(id);
            }
        }
    }

    pub(crate) fn absorb_virtual(&mut self, created: &[ResultId]) {
        let absorbed: HashSet<ResultId> = created.iter()
            .filter_map(|id| self.get(*id))
            .flat_map(|result| result.components.iter().copied())
            .collect();

        self.logical.retain(|id| !absorbed.contains(id));
        self.extend_logical(created);
    }

    pub(crate) fn prune_discarded(&mut self) {
        let results = &self.results;
        self.logical.retain(|id| results.get(id.0).is_some_and(|result| !result.was_discarded));
    }

    /// Computes matching sets, the botch flag and the total from the logical pool.
    pub(crate) fn finalize(&mut self) {
        let mut by_score: BTreeMap<i32, Vec<ResultId>> = BTreeMap::new();
        for &id in &self.logical {
            if let Some(result) = self.get(id) {
                by_score.entry(result.score()).or_default().push(id);
            }
        }

        self.matching = by_score.into_values()
            .rev()
            .filter(|set| set.len() > 1)
            .collect();

        let any_critical_failure = self.logical_dice().any(DieRollResult::is_critical_failure);

        if self.uses_successes {
            let successes = self.successes();
            self.is_botched = successes <= 0 && any_critical_failure;
            self.computed_total = successes;
        } else {
            self.is_botched = !self.logical.is_empty()
                && self.logical_dice().all(DieRollResult::is_critical_failure);
            self.computed_total = self.logical_dice()
                .fold(0i32, |total, result| total.saturating_add(result.score()));
        }
    }
}

fn foreign(id: ResultId) -> Error {
    Error::invalid(format!("result {id} does not belong to this roll"))
}
