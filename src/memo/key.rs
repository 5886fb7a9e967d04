//! Cache Key Module
//!
//! Derives hashable cache keys from a function identity and its arguments.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{CacheError, Result};
use crate::memo::serializer::to_key_part;

// == Key Part ==
/// Hashable image of one serialized argument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    /// `()` and unit structs
    Unit,
    /// `Option::None`
    None,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    /// IEEE-754 bits, with `-0.0` folded into `0.0` and one canonical NaN
    Float(u64),
    Str(String),
    Seq(Vec<KeyPart>),
    /// Entries sorted by key
    Map(Vec<(KeyPart, KeyPart)>),
}

impl KeyPart {
    /// Serializes `value` into a key part.
    ///
    /// Fails with [`CacheError::UnhashableArgument`] when the value's
    /// `Serialize` impl reports an error or an integer does not fit in 64 bits.
    pub fn from_arg<T>(function: &'static str, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        to_key_part(value).map_err(|e| CacheError::UnhashableArgument {
            function,
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Unit => write!(f, "()"),
            KeyPart::None => write!(f, "None"),
            KeyPart::Bool(b) => write!(f, "{b}"),
            KeyPart::Int(i) => write!(f, "{i}"),
            KeyPart::UInt(u) => write!(f, "{u}"),
            KeyPart::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            KeyPart::Str(s) => write!(f, "{s:?}"),
            KeyPart::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            KeyPart::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (name, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// == Cache Key ==
/// Identity of one memoized call: function, positional and keyword arguments.
///
/// Keyword arguments live in a sorted map, so the order they were supplied in
/// never affects equality or hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    function: &'static str,
    positional: Vec<KeyPart>,
    keyword: BTreeMap<String, KeyPart>,
}

impl CacheKey {
    /// Key for a call of `function` with no arguments.
    pub fn new(function: &'static str) -> Self {
        Self {
            function,
            positional: Vec::new(),
            keyword: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg<T>(mut self, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        self.positional.push(KeyPart::from_arg(self.function, value)?);
        Ok(self)
    }

    /// Sets a keyword argument, replacing an earlier one of the same name.
    pub fn kwarg<T>(mut self, name: impl Into<String>, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let part = KeyPart::from_arg(self.function, value)?;
        self.keyword.insert(name.into(), part);
        Ok(self)
    }

    /// Derives a key from a whole argument value.
    ///
    /// A value serializing to a sequence (tuples, vectors) supplies positional
    /// arguments, one serializing to a string-keyed map (structs, maps)
    /// supplies keyword arguments, unit supplies none, and anything else
    /// (including `None`) is a single positional argument.
    pub fn from_args<A>(function: &'static str, args: &A) -> Result<Self>
    where
        A: Serialize + ?Sized,
    {
        let mut key = Self::new(function);
        match KeyPart::from_arg(function, args)? {
            KeyPart::Unit => {}
            KeyPart::Seq(items) => key.positional = items,
            KeyPart::Map(pairs) if pairs.iter().all(|(k, _)| matches!(k, KeyPart::Str(_))) => {
                key.keyword = pairs
                    .into_iter()
                    .filter_map(|(k, v)| match k {
                        KeyPart::Str(name) => Some((name, v)),
                        _ => None,
                    })
                    .collect();
            }
            other => key.positional.push(other),
        }
        Ok(key)
    }

    pub fn function(&self) -> &'static str {
        self.function
    }

    pub fn positional(&self) -> &[KeyPart] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, KeyPart> {
        &self.keyword
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        let mut first = true;
        for part in &self.positional {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        for (name, part) in &self.keyword {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{name}={part}")?;
            first = false;
        }
        write!(f, ")")
    }
}
