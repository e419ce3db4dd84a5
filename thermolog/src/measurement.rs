//! Measurement data model and record selection.
//!
//! A [`Measurement`] is one temperature reading for one hardware component.
//! [`Target`] names either a single component or the aggregate of all of
//! them, and [`Selection`] picks a contiguous slice of a record file.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Display name of the pseudo-target that addresses every component.
pub const ALL_COMPONENTS: &str = "All components";

/// A single temperature reading.
///
/// Serialized with the field names `Component`, `Temperature` and
/// `Timestamp`, which is the on-disk record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    /// Name of the hardware component (e.g. `CPU`).
    pub component: String,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

impl Measurement {
    /// Creates a new measurement.
    pub fn new(component: impl Into<String>, temperature: f64, timestamp: i64) -> Self {
        Self {
            component: component.into(),
            temperature,
            timestamp,
        }
    }
}

/// Hardware components that can be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// The CPU package sensor.
    Cpu,
    /// The GPU core sensor.
    Gpu,
    /// The motherboard Super-I/O chip sensor.
    Motherboard,
}

impl Component {
    /// All measurable components, in the order batch operations visit them.
    pub const ALL: [Component; 3] = [Component::Gpu, Component::Cpu, Component::Motherboard];

    /// Returns the component name used in records and file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Component::Cpu => "CPU",
            Component::Gpu => "GPU",
            Component::Motherboard => "Motherboard",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownComponent(pub String);

impl fmt::Display for UnknownComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown component '{}' (expected CPU, GPU or Motherboard)", self.0)
    }
}

impl std::error::Error for UnknownComponent {}

impl FromStr for Component {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Component::Cpu),
            "gpu" => Ok(Component::Gpu),
            "motherboard" | "mb" => Ok(Component::Motherboard),
            _ => Err(UnknownComponent(s.to_string())),
        }
    }
}

/// The record file an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The aggregate file holding every component's records.
    All,
    /// A single component's file.
    Component(String),
}

impl Target {
    /// Creates a target for a single component name.
    pub fn component(name: impl Into<String>) -> Self {
        Target::Component(name.into())
    }

    /// Returns the name used for messages and export file names.
    pub fn name(&self) -> &str {
        match self {
            Target::All => ALL_COMPONENTS,
            Target::Component(name) => name,
        }
    }
}

impl From<Component> for Target {
    fn from(component: Component) -> Self {
        Target::Component(component.as_str().to_string())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case(ALL_COMPONENTS) {
            return Ok(Target::All);
        }
        trimmed.parse::<Component>().map(Target::from)
    }
}

/// Which end of a record file a bounded selection starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// The head of the file: the earliest inserted records.
    #[default]
    Start,
    /// The tail of the file: the most recently inserted records.
    End,
}

/// A contiguous slice of a record file.
///
/// `count == 0` selects every record. Otherwise at most `count` records are
/// selected from the given end, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Number of records to select, 0 for all.
    pub count: usize,
    /// Which end of the file to select from.
    pub direction: Direction,
}

impl Selection {
    /// Selects every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Selects the first `count` records.
    pub fn first(count: usize) -> Self {
        Self {
            count,
            direction: Direction::Start,
        }
    }

    /// Selects the last `count` records.
    pub fn last(count: usize) -> Self {
        Self {
            count,
            direction: Direction::End,
        }
    }

    /// Returns the index range selected from a file holding `total` records.
    pub fn range(&self, total: usize) -> Range<usize> {
        if self.count == 0 || self.count >= total {
            return 0..total;
        }
        match self.direction {
            Direction::Start => 0..self.count,
            Direction::End => total - self.count..total,
        }
    }
}
