//! # Typed Parameters
//!
//! Events carry a set of named, typed, possibly multi-valued parameters.
//! A [`Key<T>`] names a parameter and fixes its element type; setting values
//! on a key yields a [`Parameter<T>`] that can be merged into a [`ParamSet`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Errors from typed parameter extraction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    /// No parameter with this name is present.
    #[error("Parameter '{name}' is missing")]
    Missing { name: String },

    /// A parameter with this name exists but holds another element type.
    #[error("Parameter '{name}' holds {actual} values, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Type-erased parameter values as stored in a [`ParamSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values")]
pub enum ParamValues {
    Int(Vec<i32>),
    Long(Vec<i64>),
    Double(Vec<f64>),
    Bool(Vec<bool>),
    String(Vec<String>),
}

impl ParamValues {
    /// Name of the element type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => i32::TYPE_NAME,
            Self::Long(_) => i64::TYPE_NAME,
            Self::Double(_) => f64::TYPE_NAME,
            Self::Bool(_) => bool::TYPE_NAME,
            Self::String(_) => String::TYPE_NAME,
        }
    }

    /// Number of values held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Element types that can be stored in an event parameter.
pub trait ParamType: Clone + Send + Sync + 'static {
    /// Stable name of the element type.
    const TYPE_NAME: &'static str;

    /// Erase a typed value list.
    fn wrap(values: Vec<Self>) -> ParamValues;

    /// Recover a typed value list, `None` if the stored type differs.
    fn unwrap(values: &ParamValues) -> Option<Vec<Self>>;
}

macro_rules! impl_param_type {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl ParamType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn wrap(values: Vec<Self>) -> ParamValues {
                ParamValues::$variant(values)
            }

            fn unwrap(values: &ParamValues) -> Option<Vec<Self>> {
                match values {
                    ParamValues::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_param_type!(i32, Int, "int");
impl_param_type!(i64, Long, "long");
impl_param_type!(f64, Double, "double");
impl_param_type!(bool, Bool, "bool");
impl_param_type!(String, String, "string");

/// Typed name of a parameter.
pub struct Key<T> {
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ParamType> Key<T> {
    /// Create a key with the given parameter name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }

    /// Build a parameter holding `values`, in order.
    pub fn set(&self, values: impl IntoIterator<Item = T>) -> Parameter<T> {
        Parameter {
            name: self.name.clone(),
            values: values.into_iter().collect(),
        }
    }
}

impl<T> Key<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key").field("name", &self.name).finish()
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

pub fn int_key(name: impl Into<String>) -> Key<i32> {
    Key::new(name)
}

pub fn long_key(name: impl Into<String>) -> Key<i64> {
    Key::new(name)
}

pub fn double_key(name: impl Into<String>) -> Key<f64> {
    Key::new(name)
}

pub fn bool_key(name: impl Into<String>) -> Key<bool> {
    Key::new(name)
}

pub fn string_key(name: impl Into<String>) -> Key<String> {
    Key::new(name)
}

/// A named, ordered list of typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter<T> {
    name: String,
    values: Vec<T>,
}

impl<T> Parameter<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// First value, if any.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.values.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parameters of an event, keyed by name.
///
/// Adding a parameter whose name is already present replaces it, whatever
/// its previous element type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    params: BTreeMap<String, ParamValues>,
}

impl ParamSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return this set with `param` merged in.
    #[must_use]
    pub fn add<T: ParamType>(mut self, param: Parameter<T>) -> Self {
        self.insert(param);
        self
    }

    /// Merge `param` in place.
    pub fn insert<T: ParamType>(&mut self, param: Parameter<T>) {
        self.params.insert(param.name, T::wrap(param.values));
    }

    /// Extract the parameter named by `key`.
    pub fn get<T: ParamType>(&self, key: &Key<T>) -> Result<Parameter<T>, ParamError> {
        let stored = self
            .params
            .get(key.name())
            .ok_or_else(|| ParamError::Missing {
                name: key.name().to_string(),
            })?;

        let values = T::unwrap(stored).ok_or_else(|| ParamError::TypeMismatch {
            name: key.name().to_string(),
            expected: T::TYPE_NAME,
            actual: stored.type_name(),
        })?;

        Ok(Parameter {
            name: key.name().to_string(),
            values,
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Raw values stored under `name`.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&ParamValues> {
        self.params.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
