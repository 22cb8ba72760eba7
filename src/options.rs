use std::{collections::HashSet, fmt::Display, ops::{BitAnd, BitOr}, sync::Arc};
use crate::Error;
use crate::option::{DiceRollOption, OptionType};


/// The rules attached to a [`crate::DiceSet`], at most one per [`OptionType`].
///
/// Options keep their insertion order, which is the order they run in
/// within each stage of a roll.
///
/// # Examples
/// ```
/// use diceforge::{DiceRollOptions, DropKeep, Error, Explode, OptionType};
///
/// let mut options = DiceRollOptions::default();
/// options.add(Explode::standard()).unwrap().add(DropKeep::kh(2).unwrap()).unwrap();
///
/// let conflict = options.add(DropKeep::dl(1).unwrap());
/// assert!(matches!(conflict, Err(Error::OptionConflict(OptionType::DropKeep))));
/// assert_eq!(options.to_string(), "!kh2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiceRollOptions {
    options: Vec<Arc<dyn DiceRollOption>>,
    types: HashSet<OptionType>
}

impl DiceRollOptions {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `option`, returning `self` for chaining.
    ///
    /// # Errors
    /// Returns [`Error::OptionConflict`] if an option of the same type is present;
    /// the collection is left unchanged.
    pub fn add(&mut self, option: impl DiceRollOption + 'static) -> Result<&mut Self, Error> {
        self.add_shared(Arc::new(option))
    }

    /// Adds an already shared option.
    ///
    /// # Errors
    /// Same as [`DiceRollOptions::add`].
    pub fn add_shared(&mut self, option: Arc<dyn DiceRollOption>) -> Result<&mut Self, Error> {
        let option_type = option.option_type();

        if !self.types.insert(option_type) {
            return Err(Error::OptionConflict(option_type));
        }

        self.options.push(option);
        Ok(self)
    }

    /// Builder flavored [`DiceRollOptions::add`].
    ///
    /// # Errors
    /// Same as [`DiceRollOptions::add`].
    pub fn with(mut self, option: impl DiceRollOption + 'static) -> Result<Self, Error> {
        self.add(option)?;
        Ok(self)
    }

    /// Whether an option equal to `option` is present: the same instance,
    /// or one of the same type with the same notation.
    pub fn contains(&self, option: &dyn DiceRollOption) -> bool {
        self.options.iter().any(|present| same_option(present.as_ref(), option))
    }

    /// Whether an option of type `option_type` is present.
    pub fn contains_type(&self, option_type: OptionType) -> bool {
        self.types.contains(&option_type)
    }

    /// Returns the option of type `option_type`.
    pub fn get(&self, option_type: OptionType) -> Option<&Arc<dyn DiceRollOption>> {
        self.options.iter().find(|option| option.option_type() == option_type)
    }

    /// Removes and returns the option of type `option_type`.
    pub fn remove(&mut self, option_type: OptionType) -> Option<Arc<dyn DiceRollOption>> {
        let index = self.options.iter().position(|option| option.option_type() == option_type)?;
        self.types.remove(&option_type);

        Some(self.options.remove(index))
    }

    /// Iterates over the options in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DiceRollOption>> {
        self.options.iter()
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Returns `true` when no option is present.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Options of `self` followed by those of `other`.
    ///
    /// Options of `other` equal to one already present are skipped.
    ///
    /// # Errors
    /// Returns [`Error::OptionConflict`] if `other` holds a different option
    /// of a type present in `self`.
    pub fn union(&self, other: &DiceRollOptions) -> Result<DiceRollOptions, Error> {
        let mut union = self.clone();

        for option in other.iter() {
            if !union.contains(option.as_ref()) {
                union.add_shared(Arc::clone(option))?;
            }
        }

        Ok(union)
    }

    /// Options of `self` that are also in `other`, in the order of `self`.
    pub fn intersection(&self, other: &DiceRollOptions) -> DiceRollOptions {
        let mut intersection = DiceRollOptions::default();

        for option in self.iter().filter(|option| other.contains(option.as_ref())) {
            intersection.options.push(Arc::clone(option));
            intersection.types.insert(option.option_type());
        }

        intersection
    }
}

fn same_option(a: &dyn DiceRollOption, b: &dyn DiceRollOption) -> bool {
    std::ptr::addr_eq(a, b)
        || (a.option_type() == b.option_type() && a.to_string() == b.to_string())
}

impl Display for DiceRollOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for option in &self.options {
            write!(f, "{option}")?;
        }

        Ok(())
    }
}

impl BitOr for &DiceRollOptions {
    type Output = Result<DiceRollOptions, Error>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitAnd for &DiceRollOptions {
    type Output = DiceRollOptions;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl<'a> IntoIterator for &'a DiceRollOptions {
    type Item = &'a Arc<dyn DiceRollOption>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn DiceRollOption>>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::{CriticalRange, DropKeep, Explode, LargestMatch, ReRoll};


    fn options(list: Vec<Arc<dyn DiceRollOption>>) -> DiceRollOptions {
        let mut options = DiceRollOptions::default();
        for option in list {
            options.add_shared(option).unwrap();
        }
        options
    }

    #[test]
    fn test_add_conflict_leaves_unchanged() {
        let mut options = DiceRollOptions::new();
        options.add(ReRoll::below(2)).unwrap();

        let err = options.add(ReRoll::critical_failure()).unwrap_err();

        assert_eq!(err, Error::OptionConflict(OptionType::ReRoll));
        assert_eq!(options.len(), 1);
        assert_eq!(options.to_string(), "r<2");
    }

    #[test]
    fn test_get_and_remove() {
        let mut options = DiceRollOptions::new()
            .with(Explode::standard()).unwrap()
            .with(LargestMatch).unwrap();

        assert!(options.contains_type(OptionType::Total));
        assert_eq!(options.get(OptionType::Explode).map(|option| option.to_string()), Some("!".into()));

        let removed = options.remove(OptionType::Explode).unwrap();
        assert_eq!(removed.option_type(), OptionType::Explode);
        assert!(!options.contains_type(OptionType::Explode));
        assert!(options.remove(OptionType::Explode).is_none());

        options.add(Explode::compounding()).unwrap();
        assert_eq!(options.to_string(), "w!!");
    }

    #[test]
    fn test_contains_by_notation() {
        let options = DiceRollOptions::new().with(DropKeep::kh(3).unwrap()).unwrap();

        assert!(options.contains(&DropKeep::kh(3).unwrap()));
        assert!(!options.contains(&DropKeep::kh(2).unwrap()));
        assert!(!options.contains(&Explode::standard()));
    }

    #[test]
    fn test_union() {
        let shared: Arc<dyn DiceRollOption> = Arc::new(Explode::standard());
        let left = options(vec![Arc::clone(&shared), Arc::new(DropKeep::kh(1).unwrap())]);
        let right = options(vec![shared, Arc::new(CriticalRange::new(6, 1).unwrap())]);

        let union = (&left | &right).unwrap();
        assert_eq!(union.len(), 3);
        assert_eq!(union.to_string(), "!kh1cs>=6cf<=1");

        let equal = options(vec![Arc::new(DropKeep::kh(1).unwrap())]);
        assert_eq!((&left | &equal).unwrap().len(), 2);

        let conflicting = options(vec![Arc::new(DropKeep::dl(1).unwrap())]);
        assert_eq!((&left | &conflicting).unwrap_err(), Error::OptionConflict(OptionType::DropKeep));
    }

    #[test]
    fn test_intersection() {
        let left = options(vec![
            Arc::new(ReRoll::below(2)),
            Arc::new(Explode::standard()),
            Arc::new(DropKeep::kh(1).unwrap())
        ]);
        let right = options(vec![
            Arc::new(DropKeep::kh(1).unwrap()),
            Arc::new(ReRoll::below(2)),
            Arc::new(Explode::penetrating())
        ]);

        let intersection = &left & &right;

        assert_eq!(intersection.to_string(), "r<2kh1");
        assert!(intersection.contains_type(OptionType::DropKeep));
        assert!(!intersection.contains_type(OptionType::Explode));
    }
}
