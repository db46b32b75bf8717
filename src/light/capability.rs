use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
pub enum ColorMode {
    OnOff,
    Brightness,
    ColorTemp,
    Rgb,
}

impl Display for ColorMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColorMode::OnOff => "onoff",
            ColorMode::Brightness => "brightness",
            ColorMode::ColorTemp => "color_temp",
            ColorMode::Rgb => "rgb",
        };
        write!(f, "{}", name)
    }
}

/// Bidirectional table between device mode values and their descriptions.
///
/// Descriptions double as the effect names shown to users. When a description occurs more than
/// once, the reverse lookup resolves to the value that comes first in forward order.
#[derive(PartialEq, Debug, Clone)]
pub struct ModeTable {
    entries: Vec<(i64, String)>,
    forward: HashMap<i64, usize>,
    reverse: HashMap<String, i64>,
}

impl ModeTable {
    /// Builds a table from `(value, description)` pairs. A repeated value keeps its first position
    /// but takes the description of the last occurrence.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        let mut table = ModeTable {
            entries: Vec::new(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
        };

        for (value, description) in entries {
            let description = description.into();
            match table.forward.get(&value) {
                Some(&index) => table.entries[index].1 = description,
                None => {
                    table.forward.insert(value, table.entries.len());
                    table.entries.push((value, description));
                }
            }
        }

        for (value, description) in &table.entries {
            table.reverse.entry(description.clone()).or_insert(*value);
        }

        table
    }

    pub fn describe(&self, value: i64) -> Option<&str> {
        self.forward.get(&value).map(|&index| self.entries[index].1.as_str())
    }

    pub fn value_for(&self, description: &str) -> Option<i64> {
        self.reverse.get(description).copied()
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, description)| description.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Capabilities derived from the property list of one light.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CapabilityModel {
    pub(crate) supported_color_modes: BTreeSet<ColorMode>,
    pub(crate) color_mode: Option<ColorMode>,
    pub(crate) brightness_scale: Option<(i64, i64)>,
    pub(crate) mode_table: Option<ModeTable>,
    pub(crate) color_temp_range_kelvin: Option<(i64, i64)>,
    pub(crate) effect: bool,
}

impl CapabilityModel {
    pub fn supported_color_modes(&self) -> &BTreeSet<ColorMode> {
        &self.supported_color_modes
    }

    pub fn supports(&self, mode: ColorMode) -> bool {
        self.supported_color_modes.contains(&mode)
    }

    pub fn color_mode(&self) -> Option<ColorMode> {
        self.color_mode
    }

    pub fn brightness_scale(&self) -> Option<(i64, i64)> {
        self.brightness_scale
    }

    pub fn mode_table(&self) -> Option<&ModeTable> {
        self.mode_table.as_ref()
    }

    pub fn color_temp_range_kelvin(&self) -> Option<(i64, i64)> {
        self.color_temp_range_kelvin
    }

    pub fn min_color_temp_kelvin(&self) -> Option<i64> {
        self.color_temp_range_kelvin.map(|(min, _)| min)
    }

    pub fn max_color_temp_kelvin(&self) -> Option<i64> {
        self.color_temp_range_kelvin.map(|(_, max)| max)
    }

    pub fn supports_effect(&self) -> bool {
        self.effect
    }

    pub fn effect_list(&self) -> Vec<&str> {
        self.mode_table.as_ref().map(|table| table.descriptions().collect()).unwrap_or_default()
    }

    pub(crate) fn set_color_mode(&mut self, mode: ColorMode) {
        self.color_mode = Some(mode);
    }
}
