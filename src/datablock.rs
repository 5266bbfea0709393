//! Defines the [`BlockDataStore`] trait, which describes the section-scoped
//! key/value store that the cosmology pipeline writes its predictions into,
//! and [`InMemoryBlock`], a simple implementation of it.
//!
//! Every value lives at a `(section, name)` key. Values are either scalars or
//! 1D arrays of floats. The typed accessors provided by the trait handle the
//! conversions (and produce errors that name the offending key), so that
//! implementors only need to provide existence checks and raw reads.

use std::collections::HashMap;

use serde::Deserialize;

use crate::Error;

/// A single value held by a [`BlockDataStore`]
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BlockValue {
    Int(i64),
    Float(f64),
    FloatArray(Vec<f64>),
}

impl From<i64> for BlockValue {
    fn from(value: i64) -> Self {
        BlockValue::Int(value)
    }
}

impl From<f64> for BlockValue {
    fn from(value: f64) -> Self {
        BlockValue::Float(value)
    }
}

impl From<Vec<f64>> for BlockValue {
    fn from(value: Vec<f64>) -> Self {
        BlockValue::FloatArray(value)
    }
}

impl From<&[f64]> for BlockValue {
    fn from(value: &[f64]) -> Self {
        BlockValue::FloatArray(value.to_vec())
    }
}

/// The capability we need from the pipeline's data store
pub trait BlockDataStore {
    fn has_section(&self, section: &str) -> bool;

    fn has_value(&self, section: &str, name: &str) -> bool;

    /// Fetch the raw value stored at `(section, name)`.
    fn get(&self, section: &str, name: &str) -> Result<BlockValue, Error>;

    /// Fetch a non-negative integer (e.g. a bin count).
    fn get_int(&self, section: &str, name: &str) -> Result<usize, Error> {
        match self.get(section, name)? {
            BlockValue::Int(v) if v >= 0 => Ok(v as usize),
            _ => Err(Error::value_type(section, name, "a non-negative integer")),
        }
    }

    /// Fetch a scalar float. Integers are widened.
    fn get_f64(&self, section: &str, name: &str) -> Result<f64, Error> {
        match self.get(section, name)? {
            BlockValue::Float(v) => Ok(v),
            BlockValue::Int(v) => Ok(v as f64),
            BlockValue::FloatArray(_) => Err(Error::value_type(section, name, "a scalar")),
        }
    }

    /// Fetch a 1D array of floats.
    fn get_f64_array(&self, section: &str, name: &str) -> Result<Vec<f64>, Error> {
        match self.get(section, name)? {
            BlockValue::FloatArray(v) => Ok(v),
            _ => Err(Error::value_type(section, name, "an array of floats")),
        }
    }
}

/// A [`BlockDataStore`] that holds everything in memory.
///
/// This can be deserialized from a JSON object of objects, where the outer
/// keys are section names and the inner keys are value names.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct InMemoryBlock {
    sections: HashMap<String, HashMap<String, BlockValue>>,
}

impl InMemoryBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `(section, name)`, creating the section if
    /// necessary. Any existing value is replaced.
    pub fn put(&mut self, section: &str, name: &str, value: impl Into<BlockValue>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(name.to_string(), value.into());
    }

    /// Remove the value at `(section, name)`, returning it if it existed.
    pub fn remove(&mut self, section: &str, name: &str) -> Option<BlockValue> {
        self.sections.get_mut(section)?.remove(name)
    }
}

impl BlockDataStore for InMemoryBlock {
    fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    fn has_value(&self, section: &str, name: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|values| values.contains_key(name))
    }

    fn get(&self, section: &str, name: &str) -> Result<BlockValue, Error> {
        self.sections
            .get(section)
            .and_then(|values| values.get(name))
            .cloned()
            .ok_or_else(|| Error::missing_value(section, name))
    }
}
