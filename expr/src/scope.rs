//! Variables, constants and the scope chain used to resolve them.

use hashbrown::{HashMap, HashSet};
use once_cell::sync::Lazy;

use core::{fmt, iter};

use crate::error::ScopeError;

/// Value that can be assigned to a [`Variable`].
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    /// Numeric value.
    Number(f64),
    /// Textual value; must be parseable as a floating-point number.
    Text(String),
}

impl VarValue {
    fn to_number(&self, name: &str) -> Result<f64, ScopeError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(text) => text.trim().parse().map_err(|_| ScopeError::BadValue {
                name: name.to_owned(),
                value: text.clone(),
            }),
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => fmt::Display::fmt(value, formatter),
            Self::Text(text) => formatter.write_str(text),
        }
    }
}

macro_rules! impl_from_number {
    ($($num:ty),+) => {
        $(
        impl From<$num> for VarValue {
            fn from(value: $num) -> Self {
                Self::Number(f64::from(value))
            }
        }
        )+
    };
}

impl_from_number!(f64, f32, i32, u32, i16, u16, i8, u8);

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Number(crate::ops::bool_to_f64(value))
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Named numeric cell owned by a [`Scope`]. A variable created as a constant rejects
/// all modifications.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    value: f64,
    constant: bool,
}

impl Variable {
    fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_owned(),
            value,
            constant: false,
        }
    }

    /// Returns the variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Checks whether this variable is a constant.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// Sets the numeric value of this variable.
    pub fn set_value(&mut self, value: f64) -> Result<(), ScopeError> {
        if self.constant {
            return Err(ScopeError::ConstantModification {
                name: self.name.clone(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Sets the value of this variable from a number or a numeric string.
    pub fn set(&mut self, value: impl Into<VarValue>) -> Result<(), ScopeError> {
        let value = value.into().to_number(&self.name)?;
        self.set_value(value)
    }
}

/// Chained environment binding names to [`Variable`]s.
///
/// Lookups check the local variables first, then walk up the chain of parents.
/// Creation and removal always affect local variables only. The chain ends with
/// the [root scope](Self::root()), which holds built-in constants `pi` and `euler`.
///
/// # Examples
///
/// ```
/// use arithmetic_expr::Scope;
///
/// # fn main() -> anyhow::Result<()> {
/// let mut outer = Scope::new();
/// outer.create_with_value("x", 1.5)?;
/// let mut inner = outer.child();
/// inner.create_with_value("y", "2")?;
///
/// assert_eq!(inner.find_variable("x").unwrap().value(), 1.5);
/// assert!(inner.contains_variable("pi"));
/// assert!(!outer.contains_variable("y"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Scope<'p> {
    variables: HashMap<String, Variable>,
    parent: Option<&'p Scope<'p>>,
}

static ROOT: Lazy<Scope<'static>> = Lazy::new(|| {
    let mut root = Scope {
        variables: HashMap::new(),
        parent: None,
    };
    root.create_constant("pi", core::f64::consts::PI);
    root.create_constant("euler", core::f64::consts::E);
    root
});

impl Scope<'static> {
    /// Returns the process-wide root scope with built-in constants.
    pub fn root() -> &'static Self {
        &ROOT
    }

    /// Creates an empty scope that is a child of the [root scope](Self::root()).
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            parent: Some(Self::root()),
        }
    }
}

impl Default for Scope<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> Scope<'p> {
    /// Creates an empty child of this scope.
    pub fn child(&self) -> Scope<'_> {
        Scope {
            variables: HashMap::new(),
            parent: Some(self),
        }
    }

    /// Returns the parent scope, or `None` for a root scope.
    pub fn parent(&self) -> Option<&'p Scope<'p>> {
        self.parent
    }

    /// Checks whether this scope has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Iterates over this scope and all its ancestors, starting from this scope.
    pub fn ancestors(&self) -> impl Iterator<Item = &Scope<'p>> + '_ {
        iter::successors(Some(self), |scope| scope.parent)
    }

    /// Checks whether a variable is defined in this scope or any of its ancestors.
    pub fn contains_variable(&self, name: &str) -> bool {
        self.find_variable(name).is_some()
    }

    /// Finds a variable in this scope or any of its ancestors.
    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.ancestors().find_map(|scope| scope.variables.get(name))
    }

    /// Finds a variable in this scope or any of its ancestors. If the variable is not defined
    /// anywhere, creates it in this scope with zero value.
    pub fn get_variable(&mut self, name: &str) -> &Variable {
        if !self.variables.contains_key(name) {
            let parent = self.parent;
            if let Some(variable) = parent.and_then(|parent| parent.find_variable(name)) {
                return variable;
            }
        }
        self.create(name)
    }

    /// Gets a mutable reference to a variable defined in this scope. Variables in ancestor
    /// scopes are not considered.
    pub fn local_variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    /// Returns a variable defined in this scope, creating it with zero value if necessary.
    /// Variables in ancestor scopes are not considered.
    pub fn create(&mut self, name: &str) -> &mut Variable {
        self.variables
            .entry_ref(name)
            .or_insert_with(|| Variable::new(name, 0.0))
    }

    /// Creates a variable in this scope (or reuses an existing local one) and sets its value.
    pub fn create_with_value(
        &mut self,
        name: &str,
        value: impl Into<VarValue>,
    ) -> Result<&mut Variable, ScopeError> {
        let variable = self.create(name);
        variable.set(value)?;
        Ok(variable)
    }

    /// Creates a constant in this scope. An existing local constant with the same name
    /// is returned as is; an existing mutable variable is replaced.
    pub fn create_constant(&mut self, name: &str, value: f64) -> &Variable {
        let variable = self
            .variables
            .entry_ref(name)
            .or_insert_with(|| Variable::new(name, value));
        if !variable.constant {
            *variable = Variable {
                name: name.to_owned(),
                value,
                constant: true,
            };
        }
        variable
    }

    /// Removes a variable from this scope. Variables in ancestor scopes are not affected.
    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(name)
    }

    /// Iterates over names of variables defined in this scope.
    pub fn local_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables.keys().map(String::as_str)
    }

    /// Iterates over variables defined in this scope.
    pub fn local_variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.variables.values()
    }

    /// Iterates over variables visible from this scope. Variables shadowed by a descendant
    /// scope are skipped.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        let mut seen = HashSet::new();
        self.ancestors()
            .flat_map(|scope| scope.variables.values())
            .filter(move |variable| seen.insert(variable.name.as_str()))
    }

    /// Iterates over names of variables visible from this scope.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.variables().map(Variable::name)
    }
}
