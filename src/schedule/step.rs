//! Cycling steps and the plain-text schedule format
//!
//! A schedule line holds five whitespace-separated numbers:
//!
//! ```text
//! # step_type step_condition stop_type stop_condition max_dt
//! 0 -1.0 0 3.0 2.0     # CC discharge at 1 A down to 3.0 V
//! 1  4.2 3 0.1 10.0    # CV hold at 4.2 V until the current drops to 0.1 A
//! ```
//!
//! Step types are `0 = CC`, `1 = CV`; stop types are `0 = voltage`,
//! `1 = depth of discharge`, `2 = time`, `3 = current`, `4 = capacity`.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Operating mode of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// Constant current; `condition` is the applied current (A)
    Cc,
    /// Constant voltage; `condition` is the held terminal voltage (V)
    Cv,
}

impl StepType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StepType::Cc),
            1 => Some(StepType::Cv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Cc => "CC",
            StepType::Cv => "CV",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantity that ends a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopType {
    /// Terminal voltage crosses the threshold in the direction of the current
    Voltage,
    /// Capacity moved this cycle as a fraction of the last cycle's charge
    #[serde(rename = "dod")]
    DepthOfDischarge,
    /// Time spent in the step (s)
    Time,
    /// Applied current falls to the threshold (A)
    Current,
    /// Capacity moved this cycle (A·s)
    Capacity,
}

impl StopType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StopType::Voltage),
            1 => Some(StopType::DepthOfDischarge),
            2 => Some(StopType::Time),
            3 => Some(StopType::Current),
            4 => Some(StopType::Capacity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StopType::Voltage => "voltage",
            StopType::DepthOfDischarge => "dod",
            StopType::Time => "time",
            StopType::Current => "current",
            StopType::Capacity => "capacity",
        }
    }
}

impl fmt::Display for StopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a cycling schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Applied current (A, positive on charge) or held voltage (V)
    pub condition: f64,
    pub stop: StopType,
    pub stop_condition: f64,
    /// Largest time step allowed within this step (s)
    pub max_dt: f64,
}

impl Step {
    pub fn cc(current: f64, stop: StopType, stop_condition: f64, max_dt: f64) -> Self {
        Self {
            step_type: StepType::Cc,
            condition: current,
            stop,
            stop_condition,
            max_dt,
        }
    }

    pub fn cv(voltage: f64, stop: StopType, stop_condition: f64, max_dt: f64) -> Self {
        Self {
            step_type: StepType::Cv,
            condition: voltage,
            stop,
            stop_condition,
            max_dt,
        }
    }

    /// Zero-current step ended by a time limit
    pub fn is_rest(&self) -> bool {
        self.step_type == StepType::Cc && self.condition == 0.0 && self.stop == StopType::Time
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.condition.is_finite() || !self.stop_condition.is_finite() {
            return Err("condition and stop condition must be finite".into());
        }
        if !(self.max_dt > 0.0) || !self.max_dt.is_finite() {
            return Err(format!("max_dt must be positive, got {}", self.max_dt));
        }
        if self.step_type == StepType::Cv && !(self.condition > 0.0) {
            return Err(format!("CV voltage must be positive, got {}", self.condition));
        }
        match self.stop {
            StopType::Time | StopType::DepthOfDischarge | StopType::Capacity
                if !(self.stop_condition > 0.0) =>
            {
                Err(format!(
                    "{} stop condition must be positive, got {}",
                    self.stop, self.stop_condition
                ))
            }
            StopType::Voltage if !(self.stop_condition > 0.0) => Err(format!(
                "voltage stop condition must be positive, got {}",
                self.stop_condition
            )),
            _ => Ok(()),
        }
    }
}

fn parse_code(field: &str, what: &str, line: usize) -> SimResult<u8> {
    let value: f64 = field.parse().map_err(|_| SimError::Schedule {
        line,
        message: format!("{} '{}' is not a number", what, field),
    })?;
    if value.fract() != 0.0 || !(0.0..=255.0).contains(&value) {
        return Err(SimError::Schedule {
            line,
            message: format!("{} '{}' is not an integer code", what, field),
        });
    }
    Ok(value as u8)
}

fn parse_value(field: &str, what: &str, line: usize) -> SimResult<f64> {
    field.parse().map_err(|_| SimError::Schedule {
        line,
        message: format!("{} '{}' is not a number", what, field),
    })
}

/// Parse a plain-text schedule
///
/// Blank lines and `#` comments are skipped; every other line must hold
/// exactly five numbers. Line numbers in errors are 1-based.
pub fn parse_schedule(text: &str) -> SimResult<Vec<Step>> {
    let mut steps = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(SimError::Schedule {
                line,
                message: format!("expected 5 fields, found {}", fields.len()),
            });
        }

        let type_code = parse_code(fields[0], "step type", line)?;
        let step_type = StepType::from_code(type_code).ok_or_else(|| SimError::Schedule {
            line,
            message: format!("unknown step type {}", type_code),
        })?;
        let stop_code = parse_code(fields[2], "stop type", line)?;
        let stop = StopType::from_code(stop_code).ok_or_else(|| SimError::Schedule {
            line,
            message: format!("unknown stop type {}", stop_code),
        })?;

        let step = Step {
            step_type,
            condition: parse_value(fields[1], "step condition", line)?,
            stop,
            stop_condition: parse_value(fields[3], "stop condition", line)?,
            max_dt: parse_value(fields[4], "max dt", line)?,
        };
        step.validate()
            .map_err(|message| SimError::Schedule { line, message })?;
        steps.push(step);
    }

    Ok(steps)
}

/// Read and parse a plain-text schedule file
pub fn load_schedule<P: AsRef<Path>>(path: P) -> SimResult<Vec<Step>> {
    let text = fs::read_to_string(path)?;
    parse_schedule(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cccv_fixture() {
        let steps = parse_schedule(include_str!("../../fixtures/cccv.txt")).unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0], Step::cc(-1.0, StopType::Voltage, 3.0, 5.0));
        assert!(steps[1].is_rest());
        assert_eq!(steps[3], Step::cv(4.2, StopType::Current, 0.1, 10.0));
    }

    #[test]
    fn test_trailing_comment_and_float_codes() {
        let steps = parse_schedule("1.0 4.1 2.0 3600 30 # hold\n").unwrap();
        assert_eq!(steps[0].step_type, StepType::Cv);
        assert_eq!(steps[0].stop, StopType::Time);
    }

    #[test]
    fn test_wrong_field_count_reports_line() {
        let err = parse_schedule("# header\n0 -1.0 0 3.0 2.0\n0 1.0 0 4.2\n").unwrap_err();
        match err {
            SimError::Schedule { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_codes_are_rejected() {
        assert!(matches!(
            parse_schedule("2 1.0 0 4.2 2.0"),
            Err(SimError::Schedule { line: 1, .. })
        ));
        assert!(matches!(
            parse_schedule("0 1.0 7 4.2 2.0"),
            Err(SimError::Schedule { line: 1, .. })
        ));
        assert!(parse_schedule("0 1.0 0.5 4.2 2.0").is_err());
        assert!(parse_schedule("0 one 0 4.2 2.0").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_steps() {
        assert!(Step::cc(1.0, StopType::Voltage, 4.2, 0.0).validate().is_err());
        assert!(Step::cc(0.0, StopType::Time, -5.0, 1.0).validate().is_err());
        assert!(Step::cv(-4.2, StopType::Current, 0.1, 1.0).validate().is_err());
        assert!(Step::cc(1.0, StopType::Current, 0.0, 1.0).validate().is_ok());
        assert!(parse_schedule("0 1.0 0 4.2 -1").is_err());
    }

    #[test]
    fn test_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            schedule: Vec<Step>,
        }
        let w: Wrapper = toml::from_str(
            r#"
[[schedule]]
type = "cv"
condition = 4.2
stop = "dod"
stop_condition = 0.8
max_dt = 10.0
"#,
        )
        .unwrap();
        assert_eq!(w.schedule[0].step_type, StepType::Cv);
        assert_eq!(w.schedule[0].stop, StopType::DepthOfDischarge);
    }
}
