//! Parameter Expander: computes the cartesian product of a parameter
//! declaration list.

use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::registry::{FunctionMapping, VariableMapping};
use crate::substitute::parse_data;

/// One resolved row of parameter values, e.g. `{user_agent: "ios", username:
/// "u1", password: "p1"}`.
pub type ParameterRow = IndexMap<String, Value>;

fn expand_one(name: &str, content: &Value, vars: &VariableMapping, funcs: &FunctionMapping) -> Result<Vec<ParameterRow>> {
    let names: Vec<&str> = name.split('-').collect();

    if let Value::Array(items) = content {
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let parts: Vec<Value> = match item {
                Value::Array(inner) => inner.clone(),
                scalar => vec![scalar.clone()],
            };
            let mut row = ParameterRow::new();
            for (part_name, part_value) in names.iter().zip(parts.into_iter()) {
                row.insert((*part_name).to_string(), part_value);
            }
            rows.push(row);
        }
        return Ok(rows);
    }

    let resolved = parse_data(content, vars, funcs)?;
    let Value::Array(items) = resolved else {
        return Err(Error::param(format!("parameter '{name}' did not resolve to a list")));
    };

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let obj = item
            .as_object()
            .ok_or_else(|| Error::param(format!("parameter '{name}' element is not a mapping: {item}")))?;
        let mut row = ParameterRow::new();
        for part_name in &names {
            let value = obj
                .get(*part_name)
                .cloned()
                .ok_or_else(|| Error::param(format!("parameter '{name}' missing field '{part_name}'")))?;
            row.insert((*part_name).to_string(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn union_rows(rows: &[&ParameterRow]) -> ParameterRow {
    let mut out = ParameterRow::new();
    for row in rows {
        for (k, v) in row.iter() {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// Expand a list of single-key `{name: declaration}` parameter mappings into
/// the cartesian product of their resolved value rows. Name collisions
/// across parameters resolve last-wins. Empty input yields an empty list;
/// a single input is returned unchanged (no product needed).
pub fn expand_parameters(
    parameters: &[(String, Value)],
    vars: &VariableMapping,
    funcs: &FunctionMapping,
) -> Result<Vec<ParameterRow>> {
    if parameters.is_empty() {
        return Ok(Vec::new());
    }

    let mut per_parameter = Vec::with_capacity(parameters.len());
    for (name, content) in parameters {
        per_parameter.push(expand_one(name, content, vars, funcs)?);
    }

    if per_parameter.len() == 1 {
        return Ok(per_parameter.into_iter().next().expect("len == 1"));
    }

    Ok(per_parameter
        .iter()
        .multi_cartesian_product()
        .map(|combo| union_rows(&combo))
        .collect())
}
