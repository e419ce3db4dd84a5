//! Typed model of the Open Hardware Monitor sensor tree.
//!
//! The web server of Open Hardware Monitor serves `data.json`, a tree of
//! nodes with a display `Text`, nested `Children`, and a formatted `Value`
//! on leaf sensors:
//!
//! ```text
//! Sensor (root)
//! └── DESKTOP-1234                      <- system node
//!     ├── Intel Core i7-9700K           <- hardware node (CPU)
//!     │   └── Temperatures
//!     │       └── CPU Package  "52.0 °C"
//!     ├── NVIDIA GeForce RTX 2070       <- hardware node (GPU)
//!     │   └── Temperatures
//!     │       └── GPU Core     "48.0 °C"
//!     └── ASUS PRIME Z390-A             <- hardware node (motherboard)
//!         └── Nuvoton NCT6798D          <- Super-I/O chip
//!             └── Temperatures
//!                 └── CPU Core "41.0 °C"
//! ```

use serde::Deserialize;

use crate::config::SensorIdentifiers;
use crate::error::AcquisitionError;
use crate::measurement::Component;

/// Text of the category node grouping temperature sensors.
const TEMPERATURES: &str = "Temperatures";

/// One node of the sensor tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SensorNode {
    /// Display text of the node.
    #[serde(default)]
    pub text: String,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<SensorNode>,
    /// Formatted sensor value such as `"45.0 °C"`; empty on inner nodes.
    #[serde(default)]
    pub value: String,
}

impl SensorNode {
    /// Parses a sensor tree from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Parse`] if the text is not a sensor tree.
    pub fn from_json(json: &str) -> Result<Self, AcquisitionError> {
        serde_json::from_str(json).map_err(|e| AcquisitionError::Parse { source: e })
    }

    /// Returns the first direct child whose text contains `needle`.
    fn child_containing(&self, needle: &str) -> Option<&SensorNode> {
        self.children.iter().find(|child| child.text.contains(needle))
    }

    /// Iterates the hardware nodes, one level below the system nodes.
    fn hardware(&self) -> impl Iterator<Item = &SensorNode> {
        self.children
            .iter()
            .flat_map(|system| system.children.iter())
            .filter(|node| !node.children.is_empty())
    }

    /// Finds the raw value of the named sensor in this node's temperature category.
    fn temperature_value(&self, sensor: &str) -> Option<&str> {
        self.children
            .iter()
            .filter(|category| category.text == TEMPERATURES)
            .flat_map(|category| category.children.iter())
            .find(|node| node.text == sensor && !node.value.is_empty())
            .map(|node| node.value.as_str())
    }

    /// Reads the temperature of `component` using the configured identifiers.
    ///
    /// # Errors
    ///
    /// - [`AcquisitionError::ComponentNotFound`] if the hardware node or its
    ///   sensor is absent
    /// - [`AcquisitionError::InvalidValue`] if the sensor value is not a number
    pub fn temperature(
        &self,
        component: Component,
        identifiers: &SensorIdentifiers,
    ) -> Result<f64, AcquisitionError> {
        let raw = match component {
            Component::Cpu => self.hardware_temperature(&identifiers.cpu, "CPU Package"),
            Component::Gpu => self.hardware_temperature(&identifiers.gpu, "GPU Core"),
            Component::Motherboard => self
                .hardware()
                .find(|node| node.text.contains(identifiers.motherboard.as_str()))
                .and_then(|board| board.child_containing(&identifiers.chip))
                .and_then(|chip| chip.temperature_value("CPU Core")),
        };

        let raw = raw.ok_or_else(|| AcquisitionError::ComponentNotFound {
            component: component.to_string(),
        })?;
        parse_celsius(raw).ok_or_else(|| AcquisitionError::InvalidValue {
            component: component.to_string(),
            value: raw.to_string(),
        })
    }

    fn hardware_temperature(&self, identifier: &str, sensor: &str) -> Option<&str> {
        self.hardware()
            .find(|node| node.text.contains(identifier))
            .and_then(|node| node.temperature_value(sensor))
    }
}

/// Parses a formatted value such as `"45.0 °C"` into degrees.
///
/// Returns `None` for text that is not a finite number.
pub fn parse_celsius(value: &str) -> Option<f64> {
    let number = value.trim().trim_end_matches("°C").trim_end();
    // Some locales format the value with a decimal comma.
    number
        .replace(',', ".")
        .parse()
        .ok()
        .filter(|t: &f64| t.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifiers() -> SensorIdentifiers {
        SensorIdentifiers {
            cpu: "Intel".to_string(),
            gpu: "NVIDIA".to_string(),
            motherboard: "ASUS".to_string(),
            chip: "Nuvoton".to_string(),
        }
    }

    const TREE: &str = r#"{
        "id": 0, "Text": "Sensor", "Value": "",
        "Children": [{
            "id": 1, "Text": "DESKTOP-1234", "Value": "",
            "Children": [
                {"Text": "Intel Core i7-9700K", "Value": "", "Children": [
                    {"Text": "Clocks", "Value": "", "Children": [
                        {"Text": "CPU Package", "Value": "4600 MHz", "Children": []}
                    ]},
                    {"Text": "Temperatures", "Value": "", "Children": [
                        {"Text": "CPU Core #1", "Value": "50.0 °C", "Children": []},
                        {"Text": "CPU Package", "Value": "52.0 °C", "Children": []}
                    ]}
                ]},
                {"Text": "NVIDIA GeForce RTX 2070", "Value": "", "Children": [
                    {"Text": "Temperatures", "Value": "", "Children": [
                        {"Text": "GPU Core", "Value": "48.5 °C", "Children": []}
                    ]}
                ]},
                {"Text": "ASUS PRIME Z390-A", "Value": "", "Children": [
                    {"Text": "Nuvoton NCT6798D", "Value": "", "Children": [
                        {"Text": "Temperatures", "Value": "", "Children": [
                            {"Text": "CPU Core", "Value": "41.0 °C", "Children": []}
                        ]}
                    ]}
                ]}
            ]
        }]
    }"#;

    #[test]
    fn test_finds_each_component() {
        let tree = SensorNode::from_json(TREE).unwrap();
        let ids = identifiers();

        assert_eq!(tree.temperature(Component::Cpu, &ids).unwrap(), 52.0);
        assert_eq!(tree.temperature(Component::Gpu, &ids).unwrap(), 48.5);
        assert_eq!(tree.temperature(Component::Motherboard, &ids).unwrap(), 41.0);
    }

    #[test]
    fn test_missing_hardware_is_not_found() {
        let tree = SensorNode::from_json(TREE).unwrap();
        let ids = SensorIdentifiers {
            gpu: "Radeon".to_string(),
            ..identifiers()
        };

        let err = tree.temperature(Component::Gpu, &ids).unwrap_err();
        assert!(matches!(err, AcquisitionError::ComponentNotFound { .. }));
    }

    #[test]
    fn test_missing_chip_is_not_found() {
        let tree = SensorNode::from_json(TREE).unwrap();
        let ids = SensorIdentifiers {
            chip: "ITE".to_string(),
            ..identifiers()
        };

        assert!(tree.temperature(Component::Motherboard, &ids).is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SensorNode::from_json("<html>"),
            Err(AcquisitionError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_celsius() {
        assert_eq!(parse_celsius("45.0 °C"), Some(45.0));
        assert_eq!(parse_celsius("38,5 °C"), Some(38.5));
        assert_eq!(parse_celsius("n/a"), None);
        assert_eq!(parse_celsius("NaN °C"), None);
        assert_eq!(parse_celsius("inf"), None);
        assert_eq!(parse_celsius("-infinity °C"), None);
    }

    #[test]
    fn test_non_finite_sensor_value_is_invalid() {
        let tree = SensorNode::from_json(&TREE.replace("52.0 °C", "NaN °C")).unwrap();

        let err = tree.temperature(Component::Cpu, &identifiers()).unwrap_err();
        assert!(matches!(err, AcquisitionError::InvalidValue { .. }));
    }
}
