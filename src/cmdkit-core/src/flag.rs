//! Named flag arguments.
//!
//! Flags are pulled out of the token stream before the positional walk. Only
//! tokens naming a declared flag are consumed; anything else, including
//! undeclared dash tokens such as negative numbers, stays positional.

use std::any::Any;
use std::fmt;

use crate::argument::{ArgumentType, Value};
use crate::resolver::ArgumentRegistry;

/// Declaration of one flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlagSpec {
    short: Option<char>,
    long: Option<String>,
    argument: Option<ArgumentType>,
    required: bool,
}

impl FlagSpec {
    /// A flag written `-c`.
    pub fn short(short: char) -> Self {
        Self {
            short: Some(short),
            long: None,
            argument: None,
            required: false,
        }
    }

    /// A flag written `--name`.
    pub fn long(long: impl Into<String>) -> Self {
        Self {
            short: None,
            long: Some(long.into()),
            argument: None,
            required: false,
        }
    }

    /// Add a short name.
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Add a long name.
    pub fn with_long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    /// The flag takes a value resolved as `T`.
    pub fn with_argument<T: Any>(self) -> Self {
        self.with_argument_type(ArgumentType::of::<T>())
    }

    /// Make the flag take a value of `argument_type`.
    pub fn with_argument_type(mut self, argument_type: ArgumentType) -> Self {
        self.argument = Some(argument_type);
        self
    }

    /// Fail dispatch when the flag is missing.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Short name, if any.
    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    /// Long name, if any.
    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// Type of the value, for flags that take one.
    pub fn argument_type(&self) -> Option<ArgumentType> {
        self.argument
    }

    /// Whether the flag must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether `name` (without dashes) refers to this flag.
    pub fn answers_to(&self, name: &str) -> bool {
        if self.long.as_deref() == Some(name) {
            return true;
        }
        let mut chars = name.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if self.short == Some(c))
    }
}

impl fmt::Display for FlagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.long, self.short) {
            (Some(long), _) => write!(f, "--{long}"),
            (None, Some(short)) => write!(f, "-{short}"),
            (None, None) => f.write_str("-"),
        }
    }
}

/// Flags present in one invocation.
#[derive(Debug, Default)]
pub struct Flags {
    entries: Vec<(FlagSpec, Option<Value>)>,
}

impl Flags {
    /// Whether the flag was given. Accepts the long name or the short letter.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Resolved value of a value-taking flag.
    pub fn value<T: Any>(&self, name: &str) -> Option<&T> {
        self.find(name)?.as_ref()?.downcast_ref::<T>()
    }

    /// Number of flags present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no flag was given.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, name: &str) -> Option<&Option<Value>> {
        self.entries
            .iter()
            .find(|(spec, _)| spec.answers_to(name))
            .map(|(_, value)| value)
    }

    fn set(&mut self, spec: &FlagSpec, value: Option<Value>) {
        match self.entries.iter_mut().find(|(existing, _)| existing == spec) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((spec.clone(), value)),
        }
    }
}

/// Why flag extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// A required flag was not given.
    Missing(FlagSpec),
    /// A value-taking flag had no value.
    MissingArgument(FlagSpec),
    /// The resolver rejected the flag's value.
    Invalid {
        flag: FlagSpec,
        token: String,
        argument_type: ArgumentType,
    },
}

/// Split `tokens` into flags and positional tokens.
pub fn extract_flags<S: 'static>(
    specs: &[FlagSpec],
    tokens: &[String],
    sender: &S,
    resolvers: &ArgumentRegistry<S>,
    terminator: bool,
) -> Result<(Flags, Vec<String>), FlagError> {
    let mut flags = Flags::default();
    if specs.is_empty() {
        return Ok((flags, tokens.to_vec()));
    }

    let mut positional = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        index += 1;

        if terminator && token == "--" {
            positional.extend(tokens[index..].iter().cloned());
            break;
        }

        let Some((spec, inline)) = match_flag(specs, token) else {
            positional.push(token.clone());
            continue;
        };

        let Some(argument_type) = spec.argument else {
            flags.set(spec, None);
            continue;
        };

        let raw = match inline {
            Some(raw) => raw,
            None => match tokens.get(index) {
                Some(next) => {
                    index += 1;
                    next.as_str()
                }
                None => return Err(FlagError::MissingArgument(spec.clone())),
            },
        };

        let value = resolvers
            .resolve(&argument_type, sender, raw)
            .ok_or_else(|| FlagError::Invalid {
                flag: spec.clone(),
                token: raw.to_string(),
                argument_type,
            })?;
        flags.set(spec, Some(Value::Typed(value)));
    }

    if let Some(missing) = specs
        .iter()
        .find(|spec| spec.required && !flags.entries.iter().any(|(given, _)| given == *spec))
    {
        return Err(FlagError::Missing(missing.clone()));
    }

    Ok((flags, positional))
}

/// Match `--long`, `--long=value` or `-s` against the declared flags.
fn match_flag<'a, 't>(specs: &'a [FlagSpec], token: &'t str) -> Option<(&'a FlagSpec, Option<&'t str>)> {
    if let Some(body) = token.strip_prefix("--") {
        if body.is_empty() {
            return None;
        }
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let spec = specs.iter().find(|spec| spec.long.as_deref() == Some(name))?;
        // `--name=value` only applies to value-taking flags.
        if inline.is_some() && spec.argument.is_none() {
            return None;
        }
        return Some((spec, inline));
    }

    let body = token.strip_prefix('-')?;
    let mut chars = body.chars();
    let (Some(short), None) = (chars.next(), chars.next()) else {
        return None;
    };
    specs
        .iter()
        .find(|spec| spec.short == Some(short))
        .map(|spec| (spec, None))
}
