//! Per-device-family lookup tables: firmware identifier prefixes and range codes.

use crate::vartype::VarType;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const UNKNOWN_RANGE: &str = "UNKNOWN CURRENT RANGE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Unknown,
    EmStatPico,
    EmStat4Lr,
    EmStat4Hr,
    MultiEmStat4Lr,
    MultiEmStat4Hr,
    SensitSmart,
    SensitBt,
    SensitWearable,
    Nexus,
}

impl DeviceType {
    pub fn label(self) -> &'static str {
        match self {
            DeviceType::Unknown => "Unknown",
            DeviceType::EmStatPico => "EmStat Pico",
            DeviceType::EmStat4Lr => "EmStat4 LR",
            DeviceType::EmStat4Hr => "EmStat4 HR",
            DeviceType::MultiEmStat4Lr => "MultiEmStat4 LR",
            DeviceType::MultiEmStat4Hr => "MultiEmStat4 HR",
            DeviceType::SensitSmart => "Sensit Smart",
            DeviceType::SensitBt => "Sensit BT",
            DeviceType::SensitWearable => "Sensit Wearable",
            DeviceType::Nexus => "Nexus",
        }
    }

    fn family(self) -> Family {
        match self {
            DeviceType::EmStatPico
            | DeviceType::SensitSmart
            | DeviceType::SensitBt
            | DeviceType::SensitWearable => Family::Pico,
            DeviceType::EmStat4Lr | DeviceType::MultiEmStat4Lr => Family::EmStat4Lr,
            DeviceType::EmStat4Hr | DeviceType::MultiEmStat4Hr => Family::EmStat4Hr,
            DeviceType::Nexus => Family::Nexus,
            DeviceType::Unknown => Family::Unknown,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Firmware identifier prefixes, scanned top to bottom; first match wins.
/// Longer prefixes must precede the shorter ones they extend.
const FIRMWARE_PREFIXES: &[(&str, DeviceType)] = &[
    ("espico", DeviceType::EmStatPico),
    ("es4_lr", DeviceType::EmStat4Lr),
    ("es4_hr", DeviceType::EmStat4Hr),
    ("mes4_lr", DeviceType::MultiEmStat4Lr),
    ("mes4_hr", DeviceType::MultiEmStat4Hr),
    ("sens_wear", DeviceType::SensitWearable),
    ("sens_bt", DeviceType::SensitBt),
    ("sens", DeviceType::SensitSmart),
    ("nexus", DeviceType::Nexus),
];

/// Identify the device family from a firmware version string.
pub fn device_type_from_firmware(firmware: &str) -> DeviceType {
    FIRMWARE_PREFIXES
        .iter()
        .find(|(prefix, _)| firmware.starts_with(prefix))
        .map(|&(_, device_type)| device_type)
        .unwrap_or(DeviceType::Unknown)
}

#[derive(Clone, Copy)]
enum Family {
    Pico,
    EmStat4Lr,
    EmStat4Hr,
    Nexus,
    Unknown,
}

const PICO_CURRENT_RANGES: &[(u8, &str)] = &[
    (0, "100 nA"),
    (1, "2 uA"),
    (2, "4 uA"),
    (3, "8 uA"),
    (4, "16 uA"),
    (5, "32 uA"),
    (6, "63 uA"),
    (7, "125 uA"),
    (8, "250 uA"),
    (9, "500 uA"),
    (10, "1 mA"),
    (11, "5 mA"),
    (128, "100 nA (High speed)"),
    (129, "1 uA (High speed)"),
    (130, "6 uA (High speed)"),
    (131, "13 uA (High speed)"),
    (132, "25 uA (High speed)"),
    (133, "50 uA (High speed)"),
    (134, "100 uA (High speed)"),
    (135, "200 uA (High speed)"),
    (136, "1 mA (High speed)"),
    (137, "5 mA (High speed)"),
];

const ES4_LR_CURRENT_RANGES: &[(u8, &str)] = &[
    (3, "1 nA"),
    (6, "10 nA"),
    (9, "100 nA"),
    (12, "1 uA"),
    (15, "10 uA"),
    (18, "100 uA"),
    (21, "1 mA"),
    (24, "10 mA"),
];

const ES4_HR_CURRENT_RANGES: &[(u8, &str)] = &[
    (9, "100 nA"),
    (12, "1 uA"),
    (15, "10 uA"),
    (18, "100 uA"),
    (21, "1 mA"),
    (24, "10 mA"),
    (27, "100 mA"),
    (30, "1 A"),
];

const NEXUS_CURRENT_RANGES: &[(u8, &str)] = &[
    (0, "100 pA"),
    (3, "1 nA"),
    (6, "10 nA"),
    (9, "100 nA"),
    (12, "1 uA"),
    (15, "10 uA"),
    (18, "100 uA"),
    (21, "1 mA"),
    (24, "10 mA"),
    (27, "100 mA"),
    (30, "1 A"),
];

/// Potential ranges reported by galvanostatic EmStat4 and Nexus measurements.
const POTENTIAL_RANGES: &[(u8, &str)] = &[
    (2, "50 mV"),
    (3, "100 mV"),
    (4, "200 mV"),
    (5, "500 mV"),
    (6, "1 V"),
];

/// Variable ids whose range code denotes a potential range on families with
/// a potential-range table. The Pico family has none.
const POTENTIAL_RANGE_IDS: &[&str] = &["ab", "cb"];

fn find(table: &[(u8, &'static str)], code: u8) -> Option<&'static str> {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, text)| text)
}

/// Human-readable label for the range code carried in a `2XX` metadata token.
///
/// On the EmStat4 and Nexus families, the `ab` and `cb` variables report a
/// potential range; every other case reports a current range. Unknown codes and
/// unknown devices yield [`UNKNOWN_RANGE`].
pub fn current_range_to_text(device_type: DeviceType, var_type: &VarType, code: u8) -> &'static str {
    let potential = POTENTIAL_RANGE_IDS.contains(&var_type.id());
    let table = match (device_type.family(), potential) {
        (Family::Pico, _) => PICO_CURRENT_RANGES,
        (Family::EmStat4Lr | Family::EmStat4Hr | Family::Nexus, true) => POTENTIAL_RANGES,
        (Family::EmStat4Lr, false) => ES4_LR_CURRENT_RANGES,
        (Family::EmStat4Hr, false) => ES4_HR_CURRENT_RANGES,
        (Family::Nexus, false) => NEXUS_CURRENT_RANGES,
        (Family::Unknown, _) => return UNKNOWN_RANGE,
    };
    find(table, code).unwrap_or(UNKNOWN_RANGE)
}
