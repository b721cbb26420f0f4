//! Property value snapshots used to detect dirty properties.

use crate::entity::EntityId;
use std::collections::BTreeMap;

/// A scalar property value as seen by the change tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Absent / null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Text.
    Text(String),
}

/// Conversion of a field into a [`PropertyValue`].
pub trait ToPropertyValue {
    /// Returns the snapshot value of `self`.
    fn to_property_value(&self) -> PropertyValue;
}

macro_rules! impl_to_property_value {
    ($variant:ident as $target:ty: $($t:ty),+) => {
        $(
            impl ToPropertyValue for $t {
                fn to_property_value(&self) -> PropertyValue {
                    PropertyValue::$variant(<$target>::from(*self))
                }
            }
        )+
    };
}

impl_to_property_value!(Int as i64: i8, i16, i32, i64);
impl_to_property_value!(UInt as u64: u8, u16, u32, u64);
impl_to_property_value!(Float as f64: f32, f64);

impl ToPropertyValue for bool {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Bool(*self)
    }
}

impl ToPropertyValue for String {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Text(self.clone())
    }
}

impl ToPropertyValue for &str {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Text((*self).to_owned())
    }
}

impl ToPropertyValue for EntityId {
    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::UInt(self.get())
    }
}

impl ToPropertyValue for PropertyValue {
    fn to_property_value(&self) -> PropertyValue {
        self.clone()
    }
}

impl<T: ToPropertyValue> ToPropertyValue for Option<T> {
    fn to_property_value(&self) -> PropertyValue {
        match self {
            Some(value) => value.to_property_value(),
            None => PropertyValue::Null,
        }
    }
}

/// Named property values of one entity at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySnapshot {
    values: BTreeMap<String, PropertyValue>,
}

impl PropertySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl ToPropertyValue) -> Self {
        self.insert(name, value.to_property_value());
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    /// Looks up a value by property name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Names of properties whose value differs between `self` and `current`.
    pub fn changed_properties<'a>(
        &'a self,
        current: &'a PropertySnapshot,
    ) -> impl Iterator<Item = &'a str> + 'a {
        current
            .values
            .iter()
            .filter(|(name, value)| self.values.get(name.as_str()) != Some(*value))
            .map(|(name, _)| name.as_str())
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the snapshot holds no properties.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
