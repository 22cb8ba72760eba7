use std::fmt::Display;
use crate::Error;


/// The arithmetic operation a [`Modifier`] node applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierType {
    /// Adds the node value.
    Add,
    /// Subtracts the node value.
    Subtract,
    /// Multiplies by the node value.
    Multiply,
    /// Divides by the node value, rounding the quotient up.
    Divide
}

impl ModifierType {
    /// Applies the operation to `input` with `value` as right operand.
    ///
    /// Additive and multiplicative operations saturate at the `i32` bounds.
    /// Division rounds toward positive infinity, so `10 / 4 == 3` and `-10 / 4 == -2`.
    /// A zero divisor leaves `input` untouched; [`Modifier`] never holds one.
    pub fn op(&self, input: i32, value: i32) -> i32 {
        use ModifierType as Op;
        match self {
            Op::Add => input.saturating_add(value),
            Op::Subtract => input.saturating_sub(value),
            Op::Multiply => input.saturating_mul(value),
            Op::Divide => div_ceil(input, value).unwrap_or(input)
        }
    }

    fn symbol(&self) -> char {
        match self {
            ModifierType::Add => '+',
            ModifierType::Subtract => '-',
            ModifierType::Multiply => '*',
            ModifierType::Divide => '/'
        }
    }
}

impl Display for ModifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}


fn div_ceil(input: i32, value: i32) -> Option<i32> {
    let quotient = input.checked_div(value)?;
    let remainder = input.checked_rem(value)?;

    if remainder != 0 && ((remainder > 0) == (value > 0)) {
        Some(quotient + 1)
    } else {
        Some(quotient)
    }
}


/// One node of an arithmetic chain applied to a die's rolled number.
///
/// Nodes are processed left to right: `+5*2` turns `3` into `16`.
/// A chain only grows through the node-returning methods, each of which
/// replaces this node's `next` link with a fresh node.
///
/// # Examples
/// ```
/// use diceforge::{Modifier, ModifierType};
///
/// let mut modifier = Modifier::new(ModifierType::Add, 5).unwrap();
/// modifier.multiply_by(2);
///
/// assert_eq!(modifier.process(3), 16);
/// assert_eq!(modifier.to_string(), "+5*2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifier {
    kind: ModifierType,
    value: i32,
    next: Option<Box<Modifier>>
}

impl Modifier {
    /// Creates a single-node chain.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for a [`ModifierType::Divide`] node with a zero value.
    pub fn new(kind: ModifierType, value: i32) -> Result<Self, Error> {
        if kind == ModifierType::Divide && value == 0 {
            return Err(Error::invalid("cannot divide by zero"));
        }

        Ok(Self::node(kind, value))
    }

    pub(crate) fn node(kind: ModifierType, value: i32) -> Self {
        Self { kind, value, next: None }
    }

    /// The operation of this node.
    pub fn kind(&self) -> ModifierType {
        self.kind
    }

    /// The right operand of this node.
    pub fn value(&self) -> i32 {
        self.value
    }

    /// The node following this one, if any.
    pub fn next(&self) -> Option<&Modifier> {
        self.next.as_deref()
    }

    /// Links a new `+value` node after this one and returns it.
    pub fn add(&mut self, value: i32) -> &mut Modifier {
        self.link(Self::node(ModifierType::Add, value))
    }

    /// Links a new `-value` node after this one and returns it.
    pub fn subtract(&mut self, value: i32) -> &mut Modifier {
        self.link(Self::node(ModifierType::Subtract, value))
    }

    /// Links a new `*value` node after this one and returns it.
    pub fn multiply_by(&mut self, value: i32) -> &mut Modifier {
        self.link(Self::node(ModifierType::Multiply, value))
    }

    /// Links a new `/value` node after this one and returns it.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `value` is zero, leaving the chain unchanged.
    pub fn divide_by(&mut self, value: i32) -> Result<&mut Modifier, Error> {
        let node = Self::new(ModifierType::Divide, value)?;
        Ok(self.link(node))
    }

    fn link(&mut self, node: Modifier) -> &mut Modifier {
        self.next.insert(Box::new(node))
    }

    /// Runs `seed` through this node and every node after it.
    pub fn process(&self, seed: i32) -> i32 {
        self.iter().fold(seed, |acc, node| node.kind.op(acc, node.value))
    }

    /// Iterates over this node and the ones linked after it.
    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        std::iter::successors(Some(self), |node| node.next())
    }

    /// Number of nodes from this one to the end of the chain.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in self.iter() {
            write!(f, "{}{}", node.kind, node.value)?;
        }

        Ok(())
    }
}
