//! Conversions between device-native property values and the normalized values a light entity
//! exposes.

use crate::domain::color::Rgb;
use crate::domain::property::{PropertyFormat, PropertyValue};
use crate::light::capability::ModeTable;

const MAX_BRIGHTNESS: f64 = 255.0;

/// Rescales a device brightness within `(min, max)` to `0..=255`, rounding to the nearest integer.
pub fn to_normalized_brightness(raw: i64, (min, max): (i64, i64)) -> u8 {
    if max == min {
        return if raw >= max { u8::MAX } else { 0 };
    }

    // Differences are taken in f64, in i64 they overflow at the extremes
    let normalized = (raw as f64 - min as f64) * MAX_BRIGHTNESS / (max as f64 - min as f64);
    normalized.round().clamp(0.0, MAX_BRIGHTNESS) as u8
}

/// Rescales a `0..=255` brightness to the device range `(min, max)`, clamped to that range.
pub fn to_device_brightness(normalized: u8, (min, max): (i64, i64)) -> i64 {
    let raw = min as f64 + normalized as f64 * (max as f64 - min as f64) / MAX_BRIGHTNESS;
    (raw.round() as i64).clamp(min.min(max), max.max(min))
}

/// Splits a packed `0xRRGGBB` color.
pub fn to_rgb_triple(raw: i64) -> Rgb {
    Rgb::new(((raw >> 16) & 0xFF) as u8, ((raw >> 8) & 0xFF) as u8, (raw & 0xFF) as u8)
}

pub fn from_rgb_triple(rgb: Rgb) -> i64 {
    ((rgb.red() as i64) << 16) | ((rgb.green() as i64) << 8) | rgb.blue() as i64
}

pub fn describe_mode(value: i64, table: &ModeTable) -> Option<&str> {
    table.describe(value)
}

pub fn value_for_description(description: &str, table: &ModeTable) -> Option<i64> {
    table.value_for(description)
}

/// Interprets a power value. Some devices report power as an integer where only `1` means on.
pub fn power_state(raw: &PropertyValue) -> Option<bool> {
    match raw {
        PropertyValue::Boolean(on) => Some(*on),
        PropertyValue::Integer(value) => Some(*value == 1),
        _ => None,
    }
}

/// The value to write to a power property, in the same representation the property declares.
pub fn power_value(format: PropertyFormat, on: bool) -> PropertyValue {
    match format {
        PropertyFormat::Bool => PropertyValue::Boolean(on),
        _ => PropertyValue::Integer(on as i64),
    }
}
