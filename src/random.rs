use std::{fmt::Debug, sync::Arc};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};
use crate::Error;


/// A random source shared between dice.
pub type SharedRandom = Arc<dyn RandomSource>;


/// Supplies uniformly distributed integers to dice.
///
/// Implementors only provide [`RandomSource::generate`]; the bound checks
/// live in the provided [`RandomSource::next`] and [`RandomSource::next_range`].
pub trait RandomSource: Debug + Send + Sync {
    /// Produces a value in `[min, max)`. Callers guarantee `0 <= min < max`.
    ///
    /// # Errors
    /// Implementations may fail when they cannot honor the range,
    /// e.g. a scripted value that falls outside of it.
    fn generate(&self, min: i32, max: i32) -> Result<i32, Error>;

    /// Returns a value in `[0, max)`, or `0` when `max == 0`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `max` is negative.
    fn next(&self, max: i32) -> Result<i32, Error> {
        if max < 0 {
            return Err(Error::invalid("max must be non-negative"));
        }

        if max == 0 {
            return Ok(0);
        }

        self.generate(0, max)
    }

    /// Returns a value in `[min, max)`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if either bound is negative
    /// or `max <= min`.
    fn next_range(&self, min: i32, max: i32) -> Result<i32, Error> {
        if min < 0 || max < 0 {
            return Err(Error::invalid("bounds must be non-negative"));
        }

        if max <= min {
            return Err(Error::invalid(format!("max ({max}) must be greater than min ({min})")));
        }

        self.generate(min, max)
    }
}


/// Draws from `rand::rng()`, the thread-local generator, on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl ThreadRandom {
    /// Wraps a `ThreadRandom` into a [`SharedRandom`].
    pub fn shared() -> SharedRandom {
        Arc::new(ThreadRandom)
    }
}

impl RandomSource for ThreadRandom {
    fn generate(&self, min: i32, max: i32) -> Result<i32, Error> {
        Ok(rand::rng().random_range(min..max))
    }
}


/// A reproducible source backed by a seeded [`StdRng`].
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>
}

impl SeededRandom {
    /// Creates a source that yields the same sequence for the same `seed`.
    pub fn new(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    /// Wraps a seeded source into a [`SharedRandom`].
    pub fn shared(seed: u64) -> SharedRandom {
        Arc::new(Self::new(seed))
    }
}

impl RandomSource for SeededRandom {
    fn generate(&self, min: i32, max: i32) -> Result<i32, Error> {
        Ok(self.rng.lock().random_range(min..max))
    }
}


/// Replays a fixed list of values, wrapping around when exhausted.
///
/// Useful to pin down exact rolls, for instance in tests or when re-evaluating
/// a roll made with physical dice.
///
/// # Examples
/// ```
/// use diceforge::{Die, ScriptedRandom};
/// use std::sync::Arc;
///
/// let random = ScriptedRandom::shared([6, 2]);
/// let die = Arc::new(Die::new(6, random).unwrap());
///
/// assert_eq!(die.roll().unwrap().side_rolled(), 6);
/// assert_eq!(die.roll().unwrap().side_rolled(), 2);
/// assert_eq!(die.roll().unwrap().side_rolled(), 6);
/// ```
#[derive(Debug)]
pub struct ScriptedRandom {
    values: Vec<i32>,
    cursor: Mutex<usize>
}

impl ScriptedRandom {
    /// Creates a source replaying `values` in order.
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            cursor: Mutex::new(0)
        }
    }

    /// Wraps a scripted source into a [`SharedRandom`].
    pub fn shared(values: impl IntoIterator<Item = i32>) -> SharedRandom {
        Arc::new(Self::new(values))
    }
}

impl RandomSource for ScriptedRandom {
    fn generate(&self, min: i32, max: i32) -> Result<i32, Error> {
        if self.values.is_empty() {
            return Err(Error::invalid("scripted random source has no values"));
        }

        let mut cursor = self.cursor.lock();
        let value = self.values[*cursor % self.values.len()];
        *cursor += 1;

        if value < min || value >= max {
            return Err(Error::invalid(format!("scripted value {value} is outside of [{min}, {max})")));
        }

        Ok(value)
    }
}
