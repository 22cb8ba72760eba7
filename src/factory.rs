use tracing::debug;
use crate::{DiceSet, Die, DieCode, DieCodeError, Error, SharedRandom, ThreadRandom, parse_die_code};


/// Builds [`DiceSet`]s from a quantity and a die type, or from a die code.
pub trait DiceFactory {
    /// Creates `quantity` dice of the given type.
    ///
    /// `kind` is the side count of standard dice; `None` stands for Fate dice.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the quantity is zero or the
    /// factory cannot build dice of `kind`.
    fn create(&self, quantity: u16, kind: Option<u16>) -> Result<DiceSet, Error>;

    /// Parses `code` and creates the dice it describes.
    ///
    /// # Errors
    /// - Returns [`Error::DieCode`] if `code` is malformed, or describes dice
    ///   this factory does not build ([`DieCodeError::Unrecognized`]).
    /// - Returns [`Error::InvalidArgument`] for values [`DiceFactory::create`] rejects.
    fn create_from_code(&self, code: &str) -> Result<DiceSet, Error> {
        let parsed = parse_die_code(code)?;

        if !self.accepts(&parsed) {
            return Err(DieCodeError::Unrecognized(code.trim().into()).into());
        }

        debug!(%parsed, "creating dice from code");
        self.create(parsed.quantity(), parsed.faces())
    }

    /// Whether this factory builds the kind of dice `code` describes.
    fn accepts(&self, _code: &DieCode) -> bool {
        true
    }
}


fn check_quantity(quantity: u16) -> Result<(), Error> {
    if quantity < 1 {
        return Err(Error::invalid("quantity must be greater than 0"));
    }

    Ok(())
}


/// Creates standard numbered dice.
///
/// # Examples
/// ```
/// use diceforge::{DiceFactory, ScriptedRandom, StandardDiceFactory};
///
/// let factory = StandardDiceFactory::new(ScriptedRandom::shared([4, 2, 6]));
/// let set = factory.create_from_code("3d6").unwrap();
///
/// assert_eq!(set.to_string(), "3d6");
/// assert_eq!(set.roll().unwrap().total_value(), 12);
///
/// assert!(factory.create(0, Some(6)).is_err());
/// assert!(factory.create(2, None).is_err());
/// assert!(factory.create_from_code("2dF").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct StandardDiceFactory {
    random: SharedRandom
}

impl StandardDiceFactory {
    /// A factory whose dice roll with `random`.
    pub fn new(random: SharedRandom) -> Self {
        Self { random }
    }
}

impl Default for StandardDiceFactory {
    fn default() -> Self {
        Self::new(ThreadRandom::shared())
    }
}

impl DiceFactory for StandardDiceFactory {
    fn create(&self, quantity: u16, kind: Option<u16>) -> Result<DiceSet, Error> {
        check_quantity(quantity)?;

        let sides = match kind {
            Some(sides) if sides >= 2 => sides,
            Some(sides) => return Err(Error::invalid(format!("sides must be 2 or greater, got {sides}"))),
            None => return Err(Error::invalid("a die type is required for standard dice"))
        };

        let dice = (0..quantity)
            .map(|_| Die::new(sides, self.random.clone()))
            .collect::<Result<Vec<_>, Error>>()?;

        DiceSet::from_dice(dice)
    }

    fn accepts(&self, code: &DieCode) -> bool {
        !code.is_fate()
    }
}


/// Creates Fate dice.
///
/// # Examples
/// ```
/// use diceforge::{DiceFactory, FateDiceFactory, SeededRandom};
///
/// let factory = FateDiceFactory::new(SeededRandom::shared(42));
/// let set = factory.create(4, None).unwrap();
///
/// assert_eq!(set.to_string(), "4dF");
/// assert!((-4..=4).contains(&set.roll().unwrap().total_value()));
///
/// assert!(factory.create(4, Some(6)).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FateDiceFactory {
    random: SharedRandom
}

impl FateDiceFactory {
    /// A factory whose dice roll with `random`.
    pub fn new(random: SharedRandom) -> Self {
        Self { random }
    }
}

impl Default for FateDiceFactory {
    fn default() -> Self {
        Self::new(ThreadRandom::shared())
    }
}

impl DiceFactory for FateDiceFactory {
    fn create(&self, quantity: u16, kind: Option<u16>) -> Result<DiceSet, Error> {
        check_quantity(quantity)?;

        if let Some(sides) = kind {
            return Err(Error::invalid(format!("Fate dice take no die type, got {sides}")));
        }

        DiceSet::from_dice((0..quantity).map(|_| Die::fate(self.random.clone())))
    }

    fn accepts(&self, code: &DieCode) -> bool {
        code.is_fate()
    }
}


/// Creates standard or Fate dice depending on the requested type.
///
/// # Examples
/// ```
/// use diceforge::{AnyDiceFactory, DiceFactory};
///
/// let factory = AnyDiceFactory::default();
///
/// assert_eq!(factory.create_from_code("2d8").unwrap().to_string(), "2d8");
/// assert_eq!(factory.create_from_code("dF").unwrap().to_string(), "1dF");
/// assert!(factory.create_from_code("0d6").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AnyDiceFactory {
    standard: StandardDiceFactory,
    fate: FateDiceFactory
}

impl AnyDiceFactory {
    /// A factory whose dice, of either kind, roll with `random`.
    pub fn new(random: SharedRandom) -> Self {
        Self {
            standard: StandardDiceFactory::new(random.clone()),
            fate: FateDiceFactory::new(random)
        }
    }
}

impl DiceFactory for AnyDiceFactory {
    fn create(&self, quantity: u16, kind: Option<u16>) -> Result<DiceSet, Error> {
        match kind {
            Some(_) => self.standard.create(quantity, kind),
            None => self.fate.create(quantity, kind)
        }
    }
}
