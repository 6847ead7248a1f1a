//! Identifier parsing
//!
//! Hardware slot paths (`CH0`, `CT1`, `CH0.BAY12`, `CH1.FM2.TMP3`), composite
//! volume names (`pod::vgroup/vol`) and client endpoints (`host:port`) carry
//! structure the exported labels need. Parsing never fails: anything that
//! does not match yields an `Unrecognized` name or empty-string parts.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Separator between a pod and the object it contains
pub const POD_SEPARATOR: &str = "::";

/// Scope of names that are not pod-qualified
pub const ROOT_SCOPE: &str = "/";

/// Shape of a hardware component name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareKind {
    Chassis,
    Controller,
    /// FlashBlade blade slot (`CH1.FB3`)
    Blade,
    /// FlashBlade fabric module (`CH1.FM2`, `CH1.XFM1`)
    FabricModule,
    /// Anything hanging from a chassis, controller or fabric module
    Component,
    Unrecognized,
}

/// Element a name is rooted at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareBase {
    Chassis,
    Controller,
}

/// Structured hardware name
///
/// Index fields keep the digits as written so labels match the upstream
/// names exactly; parts a grammar does not carry are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareName {
    pub kind: HardwareKind,
    pub base: Option<HardwareBase>,
    pub chassis_index: String,
    pub controller_index: String,
    /// Fabric module a nested component sits on
    pub module_index: String,
    pub component_type: String,
    pub component_index: String,
}

impl HardwareName {
    fn new(kind: HardwareKind) -> Self {
        Self {
            kind,
            base: None,
            chassis_index: String::new(),
            controller_index: String::new(),
            module_index: String::new(),
            component_type: String::new(),
            component_index: String::new(),
        }
    }

    fn unrecognized() -> Self {
        Self::new(HardwareKind::Unrecognized)
    }

    pub fn is_recognized(&self) -> bool {
        self.kind != HardwareKind::Unrecognized
    }

    /// Index of the chassis or controller the name is rooted at
    pub fn base_index(&self) -> &str {
        match self.base {
            Some(HardwareBase::Chassis) => &self.chassis_index,
            Some(HardwareBase::Controller) => &self.controller_index,
            None => "",
        }
    }
}

type Extractor = fn(&Captures<'_>) -> HardwareName;

fn group(caps: &Captures<'_>, i: usize) -> String {
    caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default()
}

fn chassis(caps: &Captures<'_>) -> HardwareName {
    HardwareName {
        base: Some(HardwareBase::Chassis),
        chassis_index: group(caps, 1),
        ..HardwareName::new(HardwareKind::Chassis)
    }
}

fn controller(caps: &Captures<'_>) -> HardwareName {
    HardwareName {
        base: Some(HardwareBase::Controller),
        controller_index: group(caps, 1),
        ..HardwareName::new(HardwareKind::Controller)
    }
}

fn chassis_module(caps: &Captures<'_>) -> HardwareName {
    let module = group(caps, 2);
    let kind = if module == "FB" {
        HardwareKind::Blade
    } else {
        HardwareKind::FabricModule
    };
    HardwareName {
        base: Some(HardwareBase::Chassis),
        chassis_index: group(caps, 1),
        component_type: module,
        component_index: group(caps, 3),
        ..HardwareName::new(kind)
    }
}

fn module_component(caps: &Captures<'_>) -> HardwareName {
    HardwareName {
        base: Some(HardwareBase::Chassis),
        chassis_index: group(caps, 1),
        module_index: group(caps, 2),
        component_type: group(caps, 3),
        component_index: group(caps, 4),
        ..HardwareName::new(HardwareKind::Component)
    }
}

fn component(caps: &Captures<'_>) -> HardwareName {
    let mut name = HardwareName {
        component_type: group(caps, 3),
        component_index: group(caps, 4),
        ..HardwareName::new(HardwareKind::Component)
    };
    if &caps[1] == "CH" {
        name.base = Some(HardwareBase::Chassis);
        name.chassis_index = group(caps, 2);
    } else {
        name.base = Some(HardwareBase::Controller);
        name.controller_index = group(caps, 2);
    }
    name
}

/// Grammars in evaluation order, first match wins. Chassis modules come
/// before the generic component grammar, which would otherwise claim
/// `CH1.FB1`.
static HARDWARE_GRAMMARS: Lazy<Vec<(Regex, Extractor)>> = Lazy::new(|| {
    let table: [(&str, Extractor); 5] = [
        (r"^CH(\d+)$", chassis),
        (r"^CT(\d+)$", controller),
        (r"^CH(\d+)\.(FB|FM|XFM)(\d+)$", chassis_module),
        (r"^CH(\d+)\.FM(\d+)\.([A-Z]+)(\d+)$", module_component),
        (r"^(CH|CT)(\d+)\.([A-Z]+)(\d+)$", component),
    ];
    table
        .into_iter()
        .map(|(pattern, extract)| {
            (
                Regex::new(pattern).expect("valid hardware name regex"),
                extract,
            )
        })
        .collect()
});

/// Parse a hardware component name
pub fn parse_hardware_name(name: &str) -> HardwareName {
    HARDWARE_GRAMMARS
        .iter()
        .find_map(|(regex, extract)| regex.captures(name).map(|caps| extract(&caps)))
        .unwrap_or_else(HardwareName::unrecognized)
}

/// A name optionally qualified by a containing scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeName {
    pub scope: String,
    pub leaf: String,
}

/// Split `scope::leaf`; unqualified names live in the root scope `/`
pub fn parse_composite_volume_name(name: &str) -> CompositeName {
    match name.split_once(POD_SEPARATOR) {
        Some((scope, leaf)) => CompositeName {
            scope: scope.to_string(),
            leaf: leaf.to_string(),
        },
        None => CompositeName {
            scope: ROOT_SCOPE.to_string(),
            leaf: name.to_string(),
        },
    }
}

/// Volume name broken into pod, volume group and base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeName {
    /// Empty for volumes outside any pod
    pub pod: String,
    /// Empty for volumes outside any volume group
    pub vgroup: String,
    pub base: String,
}

/// Parse `[pod::][vgroup/]volume`
pub fn parse_volume_name(name: &str) -> VolumeName {
    let composite = parse_composite_volume_name(name);
    let pod = if composite.scope == ROOT_SCOPE {
        String::new()
    } else {
        composite.scope
    };
    let (vgroup, base) = match composite.leaf.split_once('/') {
        Some((vgroup, base)) => (vgroup.to_string(), base.to_string()),
        None => (String::new(), composite.leaf),
    };
    VolumeName { pod, vgroup, base }
}

/// Split a client endpoint `address:port` at the last colon
///
/// Names without a colon come back with an empty port.
pub fn split_client_name(name: &str) -> (&str, &str) {
    name.rsplit_once(':').unwrap_or((name, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chassis_and_controller() {
        let ch = parse_hardware_name("CH2");
        assert_eq!(ch.kind, HardwareKind::Chassis);
        assert_eq!(ch.chassis_index, "2");
        assert_eq!(ch.base_index(), "2");

        let ct = parse_hardware_name("CT1");
        assert_eq!(ct.kind, HardwareKind::Controller);
        assert_eq!(ct.controller_index, "1");
        assert_eq!(ct.chassis_index, "");
    }

    #[test]
    fn test_chassis_component() {
        let name = parse_hardware_name("CH2.PWR3");
        assert_eq!(name.kind, HardwareKind::Component);
        assert_eq!(name.base, Some(HardwareBase::Chassis));
        assert_eq!(name.chassis_index.parse::<u32>().ok(), Some(2));
        assert_eq!(name.component_type, "PWR");
        assert_eq!(name.component_index.parse::<u32>().ok(), Some(3));
    }

    #[test]
    fn test_controller_component() {
        let name = parse_hardware_name("CT0.FC12");
        assert_eq!(name.base, Some(HardwareBase::Controller));
        assert_eq!(name.controller_index, "0");
        assert_eq!(name.chassis_index, "");
        assert_eq!(name.component_type, "FC");
        assert_eq!(name.component_index, "12");
    }

    #[test]
    fn test_blade_and_fabric_modules() {
        let blade = parse_hardware_name("CH1.FB3");
        assert_eq!(blade.kind, HardwareKind::Blade);
        assert_eq!(blade.chassis_index, "1");
        assert_eq!(blade.component_index, "3");

        let fm = parse_hardware_name("CH1.FM2");
        assert_eq!(fm.kind, HardwareKind::FabricModule);
        assert_eq!(fm.component_type, "FM");

        let xfm = parse_hardware_name("CH1.XFM1");
        assert_eq!(xfm.kind, HardwareKind::FabricModule);
        assert_eq!(xfm.component_type, "XFM");
    }

    #[test]
    fn test_fabric_module_component() {
        let name = parse_hardware_name("CH1.FM2.TMP3");
        assert_eq!(name.kind, HardwareKind::Component);
        assert_eq!(name.chassis_index, "1");
        assert_eq!(name.module_index, "2");
        assert_eq!(name.component_type, "TMP");
        assert_eq!(name.component_index, "3");
    }

    #[test]
    fn test_unrecognized_names() {
        for name in ["", "SH0", "CH", "CH1.", "ch1", "CH1.FB1.BAY1", "CT0.fc1", "CH1-PWR1"] {
            let parsed = parse_hardware_name(name);
            assert_eq!(parsed.kind, HardwareKind::Unrecognized, "{}", name);
            assert!(!parsed.is_recognized());
            assert_eq!(parsed.base_index(), "");
        }
    }

    #[test]
    fn test_composite_volume_name() {
        assert_eq!(
            parse_composite_volume_name("podA::vol1"),
            CompositeName {
                scope: "podA".into(),
                leaf: "vol1".into()
            }
        );
        assert_eq!(
            parse_composite_volume_name("vol1"),
            CompositeName {
                scope: "/".into(),
                leaf: "vol1".into()
            }
        );
        assert_eq!(
            parse_composite_volume_name(""),
            CompositeName {
                scope: "/".into(),
                leaf: "".into()
            }
        );
    }

    #[test]
    fn test_volume_name_parts() {
        let v = parse_volume_name("pod1::vg1/data");
        assert_eq!((v.pod.as_str(), v.vgroup.as_str(), v.base.as_str()), ("pod1", "vg1", "data"));

        let v = parse_volume_name("vg2/logs");
        assert_eq!((v.pod.as_str(), v.vgroup.as_str(), v.base.as_str()), ("", "vg2", "logs"));

        let v = parse_volume_name("plain");
        assert_eq!((v.pod.as_str(), v.vgroup.as_str(), v.base.as_str()), ("", "", "plain"));
    }

    #[test]
    fn test_split_client_name() {
        assert_eq!(split_client_name("10.0.0.5:2049"), ("10.0.0.5", "2049"));
        assert_eq!(split_client_name("nfs-client"), ("nfs-client", ""));
        assert_eq!(split_client_name("fe80::1:111"), ("fe80::1", "111"));
    }
}
