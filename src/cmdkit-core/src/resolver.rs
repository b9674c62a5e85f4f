//! Per-type argument resolvers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::argument::ArgumentType;

/// Boxed resolver: turns a raw token into a value of the registered type, or `None` on no match.
pub type ResolverFn<S> = Arc<dyn Fn(&S, &str) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Mapping from declared type to resolver.
pub struct ArgumentRegistry<S> {
    resolvers: HashMap<TypeId, (ArgumentType, ResolverFn<S>)>,
}

impl<S: 'static> ArgumentRegistry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Create a registry with resolvers for strings, numbers, `bool` and `char`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<String, _>(|_, token| Some(token.to_string()));
        registry.register_parsed::<i8>();
        registry.register_parsed::<i16>();
        registry.register_parsed::<i32>();
        registry.register_parsed::<i64>();
        registry.register_parsed::<i128>();
        registry.register_parsed::<isize>();
        registry.register_parsed::<u8>();
        registry.register_parsed::<u16>();
        registry.register_parsed::<u32>();
        registry.register_parsed::<u64>();
        registry.register_parsed::<u128>();
        registry.register_parsed::<usize>();
        registry.register_parsed::<f32>();
        registry.register_parsed::<f64>();
        registry.register_parsed::<bool>();
        registry.register_parsed::<char>();
        registry
    }

    /// Register the resolver for `T`, replacing any previous one.
    ///
    /// Returns `true` if a resolver was replaced.
    pub fn register<T, F>(&mut self, resolver: F) -> bool
    where
        T: Any + Send + Sync,
        F: Fn(&S, &str) -> Option<T> + Send + Sync + 'static,
    {
        let boxed: ResolverFn<S> = Arc::new(move |sender: &S, token: &str| {
            resolver(sender, token).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
        });
        let argument_type = ArgumentType::of::<T>();
        self.resolvers
            .insert(argument_type.id(), (argument_type, boxed))
            .is_some()
    }

    /// Register a resolver backed by [`FromStr`].
    pub fn register_parsed<T>(&mut self) -> bool
    where
        T: FromStr + Any + Send + Sync,
    {
        self.register::<T, _>(|_, token| token.parse::<T>().ok())
    }

    /// Resolve a token for `argument_type`.
    ///
    /// Returns `None` both when the resolver rejects the token and when no
    /// resolver is registered for the type.
    pub fn resolve(
        &self,
        argument_type: &ArgumentType,
        sender: &S,
        token: &str,
    ) -> Option<Box<dyn Any + Send + Sync>> {
        let (_, resolver) = self.resolvers.get(&argument_type.id())?;
        resolver(sender, token)
    }

    /// Whether a resolver is registered for `argument_type`.
    pub fn contains(&self, argument_type: &ArgumentType) -> bool {
        self.resolvers.contains_key(&argument_type.id())
    }

    /// All registered types.
    pub fn types(&self) -> impl Iterator<Item = &ArgumentType> {
        self.resolvers.values().map(|(argument_type, _)| argument_type)
    }

    /// Number of registered resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether no resolver is registered.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl<S: 'static> Default for ArgumentRegistry<S> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<S> Clone for ArgumentRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            resolvers: self.resolvers.clone(),
        }
    }
}
