//! Assemble decoded tokens into data packages, curves and script results.

use crate::codec::{decode_token, ScriptVariable};
use crate::error::{DecodeError, ParseError};
use serde::{Deserialize, Serialize};

/// Line terminator as it appears at the end of every wire line.
const TERMINATOR: char = '\n';

/// One sampling instant: one variable per measured channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPackage {
    pub variables: Vec<ScriptVariable>,
}

impl DataPackage {
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<&ScriptVariable> {
        self.variables.get(column)
    }
}

/// Packages between two terminator lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub packages: Vec<DataPackage>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Every curve produced by one script execution, in output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub curves: Vec<Curve>,
}

impl ScriptResult {
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn package_count(&self) -> usize {
        self.curves.iter().map(Curve::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminatorKind {
    /// `+`
    LoopEnd,
    /// `*`
    MeasurementLoopEnd,
    /// `-`
    ScanEnd,
}

impl TerminatorKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(TerminatorKind::LoopEnd),
            '*' => Some(TerminatorKind::MeasurementLoopEnd),
            '-' => Some(TerminatorKind::ScanEnd),
            _ => None,
        }
    }
}

/// What a single output line turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Terminator(TerminatorKind),
    Package(DataPackage),
    /// Neither package nor terminator, e.g. device debug text.
    Unrecognized,
}

/// Decode a `P...;...\n` line. Lines that are not package lines yield `None`;
/// a package line with any malformed token is rejected whole.
pub fn parse_data_package(line: &str) -> Result<Option<DataPackage>, DecodeError> {
    let body = match line
        .strip_prefix('P')
        .and_then(|rest| rest.strip_suffix(TERMINATOR))
    {
        Some(body) => body,
        None => return Ok(None),
    };
    let variables = body
        .split(';')
        .map(decode_token)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(DataPackage { variables }))
}

pub fn classify_line(line: &str) -> Result<LineKind, DecodeError> {
    if let Some(kind) = line.chars().next().and_then(TerminatorKind::from_char) {
        return Ok(LineKind::Terminator(kind));
    }
    Ok(match parse_data_package(line)? {
        Some(package) => LineKind::Package(package),
        None => LineKind::Unrecognized,
    })
}

/// Split script output into curves in a single pass.
///
/// Terminator lines seal the open curve (empty curves are dropped), package lines
/// extend it and anything else is skipped. Packages left open at the end of the
/// input form a final curve.
pub fn parse_result<I, S>(lines: I) -> Result<ScriptResult, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = ScriptResult::default();
    let mut current = Curve::default();
    for line in lines {
        let line = line.as_ref();
        let kind = classify_line(line).map_err(|source| ParseError::Decode {
            line: line.to_string(),
            source,
        })?;
        match kind {
            LineKind::Terminator(_) => {
                if !current.is_empty() {
                    result.curves.push(std::mem::take(&mut current));
                }
            }
            LineKind::Package(package) => current.packages.push(package),
            LineKind::Unrecognized => {}
        }
    }
    if !current.is_empty() {
        result.curves.push(current);
    }
    Ok(result)
}

/// Engineering values of one column, from one curve or from all curves in order.
pub fn select_column(
    result: &ScriptResult,
    column: usize,
    curve: Option<usize>,
) -> Result<Vec<f64>, ParseError> {
    let curves: &[Curve] = match curve {
        Some(index) => {
            let count = result.curves.len();
            let selected = result
                .curves
                .get(index)
                .ok_or(ParseError::CurveOutOfRange { curve: index, count })?;
            std::slice::from_ref(selected)
        }
        None => &result.curves,
    };
    let mut values = Vec::new();
    for package in curves.iter().flat_map(|c| c.packages.iter()) {
        let var = package.get(column).ok_or_else(|| ParseError::ColumnOutOfRange {
            column,
            width: narrowest(curves),
        })?;
        values.push(var.value());
    }
    Ok(values)
}

fn narrowest(curves: &[Curve]) -> usize {
    curves
        .iter()
        .flat_map(|c| c.packages.iter())
        .map(DataPackage::len)
        .min()
        .unwrap_or(0)
}
