//! Argument descriptors and resolved values.
//!
//! An [`Argument`] describes one positional parameter of a sub-command. Fixed
//! arguments consume exactly one token and are resolved through the
//! [`ArgumentRegistry`]. Limitless and collection arguments consume every
//! remaining token and are therefore only allowed in last position.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::RegistrationError;
use crate::resolver::ArgumentRegistry;

/// Declared value type of an argument or flag.
///
/// Identity is the [`TypeId`]; the name is kept for messages.
#[derive(Clone, Copy)]
pub struct ArgumentType {
    id: TypeId,
    name: &'static str,
}

impl ArgumentType {
    /// The argument type for `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path, e.g. `i32` or `Player`.
    pub fn simple_name(&self) -> &'static str {
        let name = self.name;
        let base = name.split('<').next().unwrap_or(name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Whether this is the type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ArgumentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArgumentType {}

impl Hash for ArgumentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgumentType").field(&self.name).finish()
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())
    }
}

/// Container produced by a collection argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Insertion order preserved, duplicates kept.
    List,
    /// Duplicates removed, no defined order.
    Set,
}

impl FromStr for ContainerKind {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" | "vec" | "sequence" => Ok(Self::List),
            "set" | "hashset" => Ok(Self::Set),
            _ => Err(RegistrationError::UnsupportedContainer(s.to_string())),
        }
    }
}

/// Shape of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentKind {
    /// Exactly one token.
    Fixed,
    /// Every remaining token, as an ordered list of strings.
    Limitless,
    /// Every remaining token, coerced into a container.
    Collection(ContainerKind),
}

impl ArgumentKind {
    /// Whether the argument consumes all remaining tokens.
    pub fn is_variadic(&self) -> bool {
        !matches!(self, Self::Fixed)
    }
}

/// A positional parameter of a sub-command.
///
/// Two arguments are equal only when name, declared type, optionality and
/// kind (including the container of a collection) all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Argument {
    name: String,
    value_type: ArgumentType,
    optional: bool,
    kind: ArgumentKind,
}

impl Argument {
    /// A single-token argument of the given type.
    pub fn fixed(name: impl Into<String>, value_type: ArgumentType, optional: bool) -> Self {
        Self {
            name: name.into(),
            value_type,
            optional,
            kind: ArgumentKind::Fixed,
        }
    }

    /// An argument collecting every remaining token as strings.
    pub fn limitless(name: impl Into<String>, optional: bool) -> Self {
        Self {
            name: name.into(),
            value_type: ArgumentType::of::<String>(),
            optional,
            kind: ArgumentKind::Limitless,
        }
    }

    /// A limitless argument coerced into `container`.
    pub fn collection(name: impl Into<String>, container: ContainerKind, optional: bool) -> Self {
        Self {
            name: name.into(),
            value_type: ArgumentType::of::<String>(),
            optional,
            kind: ArgumentKind::Collection(container),
        }
    }

    /// Parameter name used in messages and lookups.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type. For variadic arguments this is the element type.
    pub fn value_type(&self) -> ArgumentType {
        self.value_type
    }

    /// Whether a missing token yields the absent value.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Shape of the argument.
    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    /// Whether the argument consumes every remaining token.
    pub fn is_variadic(&self) -> bool {
        self.kind.is_variadic()
    }

    /// Resolve a single token through the resolver registered for the declared type.
    pub fn resolve_token<S: 'static>(
        &self,
        sender: &S,
        token: &str,
        resolvers: &ArgumentRegistry<S>,
    ) -> Result<Value, InvalidToken> {
        resolvers
            .resolve(&self.value_type, sender, token)
            .map(Value::Typed)
            .ok_or_else(|| InvalidToken {
                token: token.to_string(),
                argument_type: self.value_type,
            })
    }

    /// Resolve the remaining tokens into the aggregate value.
    ///
    /// Fixed arguments never receive the remainder; they are treated like a
    /// plain limitless argument here.
    pub fn resolve_rest(&self, tokens: &[String]) -> Value {
        match self.kind {
            ArgumentKind::Collection(ContainerKind::Set) => {
                Value::Set(tokens.iter().cloned().collect())
            }
            _ => Value::List(tokens.to_vec()),
        }
    }

    /// Value used when an optional argument received no token.
    pub fn absent_value(&self) -> Value {
        match self.kind {
            ArgumentKind::Fixed => Value::Absent,
            ArgumentKind::Collection(ContainerKind::Set) => Value::Set(HashSet::new()),
            _ => Value::List(Vec::new()),
        }
    }
}

/// A token rejected by its resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidToken {
    pub token: String,
    pub argument_type: ArgumentType,
}

/// A resolved argument value.
pub enum Value {
    /// Optional fixed argument without a token.
    Absent,
    /// Output of a type resolver.
    Typed(Box<dyn Any + Send + Sync>),
    /// Ordered tokens of a limitless or list argument.
    List(Vec<String>),
    /// Deduplicated tokens of a set argument.
    Set(HashSet<String>),
}

impl Value {
    /// Wrap an already-typed value.
    pub fn typed<T: Any + Send + Sync>(value: T) -> Self {
        Self::Typed(Box::new(value))
    }

    /// Borrow the value as `T`.
    ///
    /// Lists downcast to `Vec<String>` and sets to `HashSet<String>`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Absent => None,
            Self::Typed(value) => value.downcast_ref::<T>(),
            Self::List(list) => (list as &dyn Any).downcast_ref::<T>(),
            Self::Set(set) => (set as &dyn Any).downcast_ref::<T>(),
        }
    }

    /// Whether this is the value of a missing optional argument.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Tokens of a limitless or list value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// Tokens of a set value.
    pub fn as_set(&self) -> Option<&HashSet<String>> {
        match self {
            Self::Set(set) => Some(set),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Typed(_) => f.write_str("Typed(..)"),
            Self::List(list) => f.debug_tuple("List").field(list).finish(),
            Self::Set(set) => f.debug_tuple("Set").field(set).finish(),
        }
    }
}
