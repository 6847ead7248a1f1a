//! Hardware health and sensor families
//!
//! Component status strings are encoded as `1` for `ok`/`healthy` and `0`
//! for anything else. Components reported as `not_installed` or `unused`
//! are left out of every family, and so are names that match no hardware
//! grammar.

use crate::collector::Record;
use crate::exposition::MetricFamily;
use crate::identifier::{parse_hardware_name, HardwareBase, HardwareKind, HardwareName};

use super::NullPolicy;

const ABSENT_STATES: [&str; 2] = ["not_installed", "unused"];
const HEALTHY_STATES: [&str; 2] = ["ok", "healthy"];

/// Health value of a status string, `None` when the component is not there
pub fn health_value(status: &str) -> Option<f64> {
    if ABSENT_STATES.contains(&status) {
        None
    } else if HEALTHY_STATES.contains(&status) {
        Some(1.0)
    } else {
        Some(0.0)
    }
}

/// Parsed name and health of an installed, recognized component
fn installed(record: &Record) -> Option<(&str, HardwareName, f64)> {
    let name = record.name()?;
    let status = record.get("status").as_text().unwrap_or_default();
    let health = health_value(status)?;
    let parsed = parse_hardware_name(name);
    parsed.is_recognized().then_some((name, parsed, health))
}

/// `[chassis, controller]` label pair of a component
fn base_labels(name: &HardwareName) -> [String; 2] {
    match name.base {
        Some(HardwareBase::Controller) => [String::new(), name.controller_index.clone()],
        _ => [name.chassis_index.clone(), String::new()],
    }
}

/// FlashArray hardware families
///
/// Yields chassis health, controller health, component health, temperature
/// and power supply voltage, in that order. Sensor readings that are null
/// are omitted rather than reported as zero.
pub fn flasharray_hardware(components: &[Record]) -> Vec<MetricFamily> {
    let mut chassis = MetricFamily::gauge(
        "purefa_hardware_chassis_health",
        "FlashArray hardware chassis health status",
        &["chassis"],
    );
    let mut controller = MetricFamily::gauge(
        "purefa_hardware_controller_health",
        "FlashArray hardware controller health status",
        &["controller"],
    );
    let mut component = MetricFamily::gauge(
        "purefa_hardware_component_health",
        "FlashArray hardware component health status",
        &["chassis", "controller", "component", "index"],
    );
    let mut temperature = MetricFamily::gauge(
        "purefa_hardware_temperature_celsius",
        "FlashArray hardware temperature sensors",
        &["chassis", "controller", "sensor"],
    );
    let mut power = MetricFamily::gauge(
        "purefa_hardware_power_volts",
        "FlashArray hardware power supply voltage",
        &["chassis", "power_supply"],
    );

    for record in components {
        let Some((_, name, health)) = installed(record) else {
            continue;
        };

        match name.kind {
            HardwareKind::Chassis => chassis.push([name.chassis_index.as_str()], health),
            HardwareKind::Controller => controller.push([name.controller_index.as_str()], health),
            // fabric-module children would collide with their chassis siblings
            HardwareKind::Component if !name.module_index.is_empty() => {}
            HardwareKind::Component | HardwareKind::FabricModule => {
                let [ch, ct] = base_labels(&name);
                component.push(
                    [
                        ch.clone(),
                        ct.clone(),
                        name.component_type.clone(),
                        name.component_index.clone(),
                    ],
                    health,
                );

                match name.component_type.as_str() {
                    "TMP" => {
                        if let Some(celsius) = NullPolicy::Skip.resolve(record.get("temperature")) {
                            temperature.push([ch, ct, name.component_index.clone()], celsius);
                        }
                    }
                    "PWR" => {
                        if let Some(volts) = NullPolicy::Skip.resolve(record.get("voltage")) {
                            power.push(
                                [name.base_index().to_string(), name.component_index.clone()],
                                volts,
                            );
                        }
                    }
                    _ => {}
                }
            }
            // blades only exist on FlashBlade
            HardwareKind::Blade | HardwareKind::Unrecognized => {}
        }
    }

    vec![chassis, controller, component, temperature, power]
}

/// `purefb_hw_status{hw_id}`
pub fn flashblade_hardware(components: &[Record]) -> MetricFamily {
    let mut family = MetricFamily::gauge("purefb_hw_status", "Hardware components status", &["hw_id"]);
    for record in components {
        if let Some((name, _, health)) = installed(record) {
            family.push([name], health);
        }
    }
    family
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::FieldValue;

    fn component(name: &str, status: &str) -> Record {
        Record::new().with("name", name).with("status", status)
    }

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
        families.iter().find(|f| f.name() == name).unwrap()
    }

    #[test]
    fn test_health_encoding() {
        assert_eq!(health_value("ok"), Some(1.0));
        assert_eq!(health_value("healthy"), Some(1.0));
        assert_eq!(health_value("critical"), Some(0.0));
        assert_eq!(health_value("unknown"), Some(0.0));
        assert_eq!(health_value("not_installed"), None);
        assert_eq!(health_value("unused"), None);
    }

    #[test]
    fn test_flasharray_families() {
        let records = vec![
            component("CH0", "ok"),
            component("CT1", "critical"),
            component("CH0.BAY3", "ok"),
            component("CT0.FC1", "unused"),
            component("SH9.BAY1", "ok"),
        ];
        let families = flasharray_hardware(&records);

        assert_eq!(family(&families, "purefa_hardware_chassis_health").value(&["0"]), Some(1.0));
        assert_eq!(family(&families, "purefa_hardware_controller_health").value(&["1"]), Some(0.0));

        let components = family(&families, "purefa_hardware_component_health");
        assert_eq!(components.len(), 1);
        assert_eq!(components.value(&["0", "", "BAY", "3"]), Some(1.0));
    }

    #[test]
    fn test_module_components_skipped() {
        let records = vec![
            component("CH1.TMP3", "ok").with("temperature", 28.0),
            component("CH1.FM2.TMP3", "critical").with("temperature", 45.0),
        ];
        let families = flasharray_hardware(&records);

        let components = family(&families, "purefa_hardware_component_health");
        assert_eq!(components.len(), 1);
        assert_eq!(components.value(&["1", "", "TMP", "3"]), Some(1.0));

        let temperature = family(&families, "purefa_hardware_temperature_celsius");
        assert_eq!(temperature.len(), 1);
        assert_eq!(temperature.value(&["1", "", "3"]), Some(28.0));
    }

    #[test]
    fn test_controller_component_labels() {
        let families = flasharray_hardware(&[component("CT0.ETH4", "ok")]);
        let components = family(&families, "purefa_hardware_component_health");
        assert_eq!(components.value(&["", "0", "ETH", "4"]), Some(1.0));
    }

    #[test]
    fn test_sensor_readings() {
        let records = vec![
            component("CT0.TMP2", "ok").with("temperature", 31.0),
            component("CH0.PWR1", "ok").with("voltage", 12.1),
            component("CH0.PWR0", "ok").with("voltage", FieldValue::Null),
        ];
        let families = flasharray_hardware(&records);

        let temperature = family(&families, "purefa_hardware_temperature_celsius");
        assert_eq!(temperature.value(&["", "0", "2"]), Some(31.0));

        let power = family(&families, "purefa_hardware_power_volts");
        assert_eq!(power.len(), 1);
        assert_eq!(power.value(&["0", "1"]), Some(12.1));

        // both supplies still report health
        let components = family(&families, "purefa_hardware_component_health");
        assert_eq!(components.value(&["0", "", "PWR", "0"]), Some(1.0));
    }

    #[test]
    fn test_family_order() {
        let names: Vec<_> = flasharray_hardware(&[]).iter().map(|f| f.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "purefa_hardware_chassis_health",
                "purefa_hardware_controller_health",
                "purefa_hardware_component_health",
                "purefa_hardware_temperature_celsius",
                "purefa_hardware_power_volts",
            ]
        );
    }

    #[test]
    fn test_flashblade_status() {
        let records = vec![
            component("CH1", "healthy"),
            component("CH1.FB3", "critical"),
            component("CH1.FM2", "unused"),
            component("XFM", "healthy"),
        ];
        let family = flashblade_hardware(&records);

        assert_eq!(family.len(), 2);
        assert_eq!(family.value(&["CH1"]), Some(1.0));
        assert_eq!(family.value(&["CH1.FB3"]), Some(0.0));
        assert_eq!(family.value(&["CH1.FM2"]), None);
    }
}
