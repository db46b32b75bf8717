mod descriptor;
mod property_value;

pub use descriptor::{Access, PropertyDescriptor, PropertyDescriptorBuilder, PropertyFormat, PropertyKey, ValueListItem, ValueRange};
pub use property_value::PropertyValue;
