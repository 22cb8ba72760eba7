//! Tabletop dice: standard and Fate dice, modifier chains, and a rule pipeline
//! (re-rolls, explosions, keep/drop, success counting) producing auditable rolls.
#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]


#[cfg(test)]
mod test_strategies;

mod error;
mod random;
mod modifier;
mod die;
mod result;
mod option;
mod options;
mod dice_set;
mod code;
mod factory;

pub use error::Error;
pub use random::{RandomSource, SharedRandom, ThreadRandom, SeededRandom, ScriptedRandom};
pub use modifier::{Modifier, ModifierType};
pub use die::{Die, DieBuilder, DieKind};
pub use result::{
    DiceRollResult, DieRollResult,
    ResultId, ResultKind, ResultValueSet,
    NUMBER, SUCCESSES
};
pub use option::{
    DiceRollOption, OptionType,
    ReRoll, ReRollTrigger,
    Explode, ExplodeStyle, MAX_CHAIN_LENGTH,
    DropKeep, Mode,
    CriticalRange, Successes, LargestMatch
};
pub use options::DiceRollOptions;
pub use dice_set::DiceSet;
pub use code::{DieCode, DieFaces, DieCodeError, parse_die_code};
pub use factory::{DiceFactory, StandardDiceFactory, FateDiceFactory, AnyDiceFactory};
