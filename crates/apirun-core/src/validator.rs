//! Validator Parser: normalizes the two accepted validator shapes into a
//! canonical `{check, comparator, expect}` form.

use serde_json::Value;

use crate::error::{Error, Result};

/// Outcome of evaluating a validator against a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Unchecked,
    Pass,
    Fail,
}

impl CheckResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchecked => "unchecked",
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

/// A canonicalized validator: what to check, how to compare, and the
/// expected value.
#[derive(Debug, Clone)]
pub struct Validator {
    pub check: Value,
    pub comparator: String,
    pub expect: Value,
    pub check_value: Option<Value>,
    pub check_result: CheckResult,
}

impl Validator {
    fn new(check: Value, comparator: String, expect: Value) -> Self {
        Self {
            check,
            comparator,
            expect,
            check_value: None,
            check_result: CheckResult::Unchecked,
        }
    }
}

/// Parse one validator document, in either accepted shape:
/// - `{check, comparator?, expect|expected}` — `comparator` defaults to `eq`.
/// - `{<comparator>: [check_item, expect_value]}` — exactly one key whose
///   value is a two-element array.
pub fn parse_validator(validator: &Value) -> Result<Validator> {
    let map = validator
        .as_object()
        .ok_or_else(|| Error::param(format!("invalid validator: {validator}")))?;

    if map.contains_key("check") && map.len() > 1 {
        let check = map.get("check").cloned().unwrap_or(Value::Null);
        let expect = if let Some(v) = map.get("expect") {
            v.clone()
        } else if let Some(v) = map.get("expected") {
            v.clone()
        } else {
            return Err(Error::param(format!("invalid validator: {validator}")));
        };
        let comparator = map
            .get("comparator")
            .and_then(Value::as_str)
            .unwrap_or("eq")
            .to_string();
        return Ok(Validator::new(check, comparator, expect));
    }

    if map.len() == 1 {
        let (comparator, compare_values) = map.iter().next().expect("len == 1");
        let values = compare_values
            .as_array()
            .ok_or_else(|| Error::param(format!("invalid validator: {validator}")))?;
        if values.len() != 2 {
            return Err(Error::param(format!("invalid validator: {validator}")));
        }
        return Ok(Validator::new(
            values[0].clone(),
            comparator.clone(),
            values[1].clone(),
        ));
    }

    Err(Error::param(format!("invalid validator: {validator}")))
}
