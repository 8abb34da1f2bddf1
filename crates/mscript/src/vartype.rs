use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Physical meaning of a two-character MethodSCRIPT variable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VarType {
    id: Cow<'static, str>,
    name: &'static str,
    unit: &'static str,
}

impl VarType {
    fn known(id: &'static str, name: &'static str, unit: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            name,
            unit,
        }
    }

    fn unknown(id: &str) -> Self {
        Self {
            id: Cow::Owned(id.to_string()),
            name: "unknown",
            unit: "",
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Unit symbol; empty for dimensionless values.
    pub fn unit(&self) -> &'static str {
        self.unit
    }

    pub fn is_known(&self) -> bool {
        matches!(self.id, Cow::Borrowed(_))
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} [{}]", self.name, self.unit)
        }
    }
}

const VAR_TYPES: &[(&str, &str, &str)] = &[
    ("aa", "unknown", ""),
    ("ab", "WE vs RE potential", "V"),
    ("ac", "CE vs GND potential", "V"),
    ("ad", "SE vs GND potential", "V"),
    ("ae", "RE vs GND potential", "V"),
    ("af", "WE vs GND potential", "V"),
    ("ag", "WE vs CE potential", "V"),
    ("as", "AIN0 potential", "V"),
    ("at", "AIN1 potential", "V"),
    ("au", "AIN2 potential", "V"),
    ("av", "AIN3 potential", "V"),
    ("aw", "AIN4 potential", "V"),
    ("ax", "AIN5 potential", "V"),
    ("ay", "AIN6 potential", "V"),
    ("az", "AIN7 potential", "V"),
    ("ba", "WE current", "A"),
    ("ca", "Phase", "degrees"),
    ("cb", "Impedance", "\u{2126}"),
    ("cc", "Z_real", "\u{2126}"),
    ("cd", "Z_imag", "\u{2126}"),
    ("ce", "EIS E TDD", "V"),
    ("cf", "EIS I TDD", "A"),
    ("cg", "EIS sampling frequency", "Hz"),
    ("ch", "EIS E AC", "Vrms"),
    ("ci", "EIS E DC", "V"),
    ("cj", "EIS I AC", "Arms"),
    ("ck", "EIS I DC", "A"),
    ("da", "Applied potential", "V"),
    ("db", "Applied current", "A"),
    ("dc", "Applied frequency", "Hz"),
    ("dd", "Applied AC amplitude", "Vrms"),
    ("ea", "Channel", ""),
    ("eb", "Time", "s"),
    ("ec", "Pin mask", ""),
    ("ed", "Temperature", "\u{00B0}C"),
    ("ee", "Count", ""),
    ("ha", "Generic current 1", "A"),
    ("hb", "Generic current 2", "A"),
    ("hc", "Generic current 3", "A"),
    ("hd", "Generic current 4", "A"),
    ("ia", "Generic potential 1", "V"),
    ("ib", "Generic potential 2", "V"),
    ("ic", "Generic potential 3", "V"),
    ("id", "Generic potential 4", "V"),
    ("ja", "Misc. generic 1", ""),
    ("jb", "Misc. generic 2", ""),
    ("jc", "Misc. generic 3", ""),
    ("jd", "Misc. generic 4", ""),
];

fn registry() -> &'static HashMap<&'static str, VarType> {
    static REGISTRY: OnceLock<HashMap<&'static str, VarType>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        VAR_TYPES
            .iter()
            .map(|&(id, name, unit)| (id, VarType::known(id, name, unit)))
            .collect()
    })
}

/// Resolve a variable id. Never fails: unrecognized ids yield an "unknown" entry
/// with an empty unit.
pub fn lookup(id: &str) -> VarType {
    match registry().get(id) {
        Some(vt) => vt.clone(),
        None => VarType::unknown(id),
    }
}
