use crate::domain::property::PropertyValue;
use serde::de::{Error, Unexpected};
use serde::{Deserialize, Deserializer};
use std::fmt::{Display, Formatter};

/// Declarative description of one device-exposed attribute, as found in a MIoT device description.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PropertyDescriptor {
    #[serde(default)]
    siid: u32,
    #[serde(default)]
    piid: u32,
    name: String,
    format: PropertyFormat,
    #[serde(default)]
    access: Access,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    value_range: Option<ValueRange>,
    #[serde(default)]
    value_list: Option<Vec<ValueListItem>>,
}

impl PropertyDescriptor {
    pub fn builder(name: impl Into<String>, format: PropertyFormat) -> PropertyDescriptorBuilder {
        PropertyDescriptorBuilder::new(name.into(), format)
    }

    pub fn key(&self) -> PropertyKey {
        PropertyKey::new(self.siid, self.piid)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> PropertyFormat {
        self.format
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn value_range(&self) -> Option<ValueRange> {
        self.value_range
    }

    pub fn value_list(&self) -> Option<&[ValueListItem]> {
        self.value_list.as_deref()
    }

    /// Coerces a value into the representation this property declares.
    pub fn format_value(&self, value: PropertyValue) -> PropertyValue {
        match (self.format, value) {
            (PropertyFormat::Bool, PropertyValue::Integer(n)) => PropertyValue::Boolean(n != 0),
            (PropertyFormat::Bool, PropertyValue::Float(n)) => PropertyValue::Boolean(n != 0.0),
            (PropertyFormat::Integer, PropertyValue::Float(n)) => PropertyValue::Integer(n.round() as i64),
            (PropertyFormat::Integer, PropertyValue::Boolean(b)) => PropertyValue::Integer(b as i64),
            (PropertyFormat::Float, PropertyValue::Integer(n)) => PropertyValue::Float(n as f64),
            (_, value) => value,
        }
    }
}

/// Identifies a property within one device by service and property instance id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PropertyKey {
    siid: u32,
    piid: u32,
}

impl PropertyKey {
    pub fn new(siid: u32, piid: u32) -> Self {
        PropertyKey { siid, piid }
    }
}

impl Display for PropertyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.siid, self.piid)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Deserialize)]
pub enum PropertyFormat {
    #[serde(rename = "bool")]
    Bool,
    #[serde(
        rename = "int32",
        alias = "int8",
        alias = "int16",
        alias = "int64",
        alias = "uint8",
        alias = "uint16",
        alias = "uint32"
    )]
    Integer,
    #[serde(rename = "float")]
    Float,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Access {
    readable: bool,
    writable: bool,
    notifiable: bool,
}

impl Access {
    pub fn new(readable: bool, writable: bool, notifiable: bool) -> Self {
        Access {
            readable,
            writable,
            notifiable,
        }
    }

    pub fn readable(&self) -> bool {
        self.readable
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn notifiable(&self) -> bool {
        self.notifiable
    }
}

impl Default for Access {
    fn default() -> Self {
        Access::new(true, true, true)
    }
}

impl<'de> Deserialize<'de> for Access {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let flags = Vec::<String>::deserialize(deserializer)?;
        let mut access = Access::new(false, false, false);
        for flag in &flags {
            match flag.as_str() {
                "read" => access.readable = true,
                "write" => access.writable = true,
                "notify" => access.notifiable = true,
                other => return Err(Error::invalid_value(Unexpected::Str(other), &"one of 'read', 'write' or 'notify'")),
            }
        }
        Ok(access)
    }
}

/// Inclusive integer domain of a property. A declared step is accepted but not kept, values are
/// never snapped to it.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ValueRange {
    min: i64,
    max: i64,
}

impl ValueRange {
    pub fn new(min: i64, max: i64) -> Self {
        ValueRange { min, max }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }
}

impl<'de> Deserialize<'de> for ValueRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawValueRange {
            // [min, max] or [min, max, step]
            Array(Vec<i64>),
            Object { min: i64, max: i64 },
        }

        match RawValueRange::deserialize(deserializer)? {
            RawValueRange::Array(values) => match values.as_slice() {
                [min, max] | [min, max, _] => Ok(ValueRange::new(*min, *max)),
                _ => Err(Error::invalid_length(values.len(), &"a value range of [min, max] or [min, max, step]")),
            },
            RawValueRange::Object { min, max } => Ok(ValueRange::new(min, max)),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct ValueListItem {
    value: i64,
    description: String,
}

impl ValueListItem {
    pub fn new(value: i64, description: impl Into<String>) -> Self {
        ValueListItem {
            value,
            description: description.into(),
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

pub struct PropertyDescriptorBuilder {
    descriptor: PropertyDescriptor,
}

impl PropertyDescriptorBuilder {
    pub fn new(name: String, format: PropertyFormat) -> Self {
        PropertyDescriptorBuilder {
            descriptor: PropertyDescriptor {
                siid: 0,
                piid: 0,
                name,
                format,
                access: Access::default(),
                unit: None,
                value_range: None,
                value_list: None,
            },
        }
    }

    pub fn iid(mut self, siid: u32, piid: u32) -> Self {
        self.descriptor.siid = siid;
        self.descriptor.piid = piid;
        self
    }

    pub fn access(mut self, access: Access) -> Self {
        self.descriptor.access = access;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.descriptor.unit = Some(unit.into());
        self
    }

    pub fn value_range(mut self, min: i64, max: i64) -> Self {
        self.descriptor.value_range = Some(ValueRange::new(min, max));
        self
    }

    pub fn value_list(mut self, items: Vec<ValueListItem>) -> Self {
        self.descriptor.value_list = Some(items);
        self
    }

    pub fn build(self) -> PropertyDescriptor {
        self.descriptor
    }
}
