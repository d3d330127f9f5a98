//! Ordered, de-duplicating command-line arguments.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::time::format_duration;

/// Which side of the `-i` input list an argument is emitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentPosition {
    PreInput,
    #[default]
    PostInput,
}

/// Renders a value the way the ffmpeg command-line parser expects it.
///
/// Numbers use `.` as the decimal separator and durations use
/// `H:MM:SS.mmm`, independent of the host locale.
pub trait ArgumentValue {
    fn to_argument_value(&self) -> String;
}

macro_rules! display_argument_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ArgumentValue for $ty {
                fn to_argument_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_argument_value!(i32, i64, u32, u64, usize, f64, str, String);

impl ArgumentValue for Duration {
    fn to_argument_value(&self) -> String {
        format_duration(*self)
    }
}

impl<T: ArgumentValue + ?Sized> ArgumentValue for &T {
    fn to_argument_value(&self) -> String {
        (**self).to_argument_value()
    }
}

/// A single `-name value` pair, or a bare `-name` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionArgument {
    name: String,
    value: Option<String>,
    position: ArgumentPosition,
}

impl ConversionArgument {
    pub fn new(
        name: impl Into<String>,
        value: Option<String>,
        position: ArgumentPosition,
    ) -> Self {
        let name = name.into().trim().to_string();
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self {
            name,
            value,
            position,
        }
    }

    /// A flag without a value (`-y`, `-re`).
    pub fn flag(name: impl Into<String>, position: ArgumentPosition) -> Self {
        Self::new(name, None, position)
    }

    pub fn pre_input(name: impl Into<String>, value: impl ArgumentValue) -> Self {
        Self::new(
            name,
            Some(value.to_argument_value()),
            ArgumentPosition::PreInput,
        )
    }

    pub fn post_input(name: impl Into<String>, value: impl ArgumentValue) -> Self {
        Self::new(
            name,
            Some(value.to_argument_value()),
            ArgumentPosition::PostInput,
        )
    }

    /// The name as given, without its leading dash.
    pub fn name(&self) -> &str {
        self.name.trim_start_matches('-')
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn position(&self) -> ArgumentPosition {
        self.position
    }

    /// Input designators accumulate instead of replacing each other.
    pub fn is_input(&self) -> bool {
        self.name() == "i"
    }
}

impl fmt::Display for ConversionArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "-{} {}", self.name(), value),
            None => write!(f, "-{}", self.name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ArgumentKey {
    name: String,
    position: ArgumentPosition,
    // Only set for `-i`, which is never de-duplicated.
    sequence: Option<u64>,
}

/// Arguments keyed by `(name, position)` in insertion order.
///
/// Adding an argument whose name and position are already present replaces
/// the earlier value in place. `-i` entries are the exception and always
/// accumulate.
#[derive(Debug, Clone, Default)]
pub struct ConversionArguments {
    entries: IndexMap<ArgumentKey, ConversionArgument>,
    next_input: u64,
}

impl ConversionArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, argument: ConversionArgument) -> &mut Self {
        let sequence = if argument.is_input() {
            self.next_input += 1;
            Some(self.next_input)
        } else {
            None
        };

        let key = ArgumentKey {
            name: argument.name().to_string(),
            position: argument.position(),
            sequence,
        };
        self.entries.insert(key, argument);
        self
    }

    pub fn add_pre_input(&mut self, name: &str, value: impl ArgumentValue) -> &mut Self {
        self.add(ConversionArgument::pre_input(name, value))
    }

    pub fn add_post_input(&mut self, name: &str, value: impl ArgumentValue) -> &mut Self {
        self.add(ConversionArgument::post_input(name, value))
    }

    pub fn add_pre_input_flag(&mut self, name: &str) -> &mut Self {
        self.add(ConversionArgument::flag(name, ArgumentPosition::PreInput))
    }

    pub fn add_post_input_flag(&mut self, name: &str) -> &mut Self {
        self.add(ConversionArgument::flag(name, ArgumentPosition::PostInput))
    }

    /// Removes every entry with this name, in either position.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        let name = name.trim().trim_start_matches('-');
        self.entries.retain(|key, _| key.name != name);
        self
    }

    /// Entries for one position, in insertion order.
    pub fn get(&self, position: ArgumentPosition) -> impl Iterator<Item = &ConversionArgument> {
        self.entries
            .values()
            .filter(move |argument| argument.position() == position)
    }

    /// The value of the most recent entry with this name and position.
    pub fn value_of(&self, name: &str, position: ArgumentPosition) -> Option<&str> {
        let name = name.trim_start_matches('-');
        self.get(position)
            .filter(|argument| argument.name() == name)
            .last()
            .and_then(ConversionArgument::value)
    }

    pub fn contains(&self, name: &str, position: ArgumentPosition) -> bool {
        let name = name.trim_start_matches('-');
        self.get(position).any(|argument| argument.name() == name)
    }

    /// Rendered `-name value` tokens for one position.
    pub fn render(&self, position: ArgumentPosition) -> Vec<String> {
        self.get(position).map(ToString::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionArgument> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
