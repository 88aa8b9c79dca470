//! Data Substituter: recursively walks arbitrary decoded data, applying the
//! Expression Parser in two passes — functions, then variables — against a
//! variable and function mapping.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::expr::{extract_functions, extract_variables, parse_function};
use crate::registry::{FunctionMapping, VariableMapping};

fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Resolve every `${name(args)}` literal in `content`, left to right. A
/// string that is exactly one call literal returns the call's raw return
/// value (type preserved); otherwise each result is spliced in, replacing
/// only the first occurrence of that literal per invocation (the
/// first-occurrence-replacement rule — never a single global replace).
fn substitute_functions(content: &str, vars: &VariableMapping, funcs: &FunctionMapping) -> Result<Value> {
    let mut current = Value::String(content.to_string());

    for func_content in extract_functions(content) {
        let call = parse_function(&func_content)?;

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(parse_data(arg, vars, funcs)?);
        }
        let mut kwargs = IndexMap::with_capacity(call.kwargs.len());
        for (k, v) in &call.kwargs {
            kwargs.insert(k.clone(), parse_data(v, vars, funcs)?);
        }

        let eval_value = funcs
            .call(&call.func_name, &args, &kwargs)
            .ok_or_else(|| Error::function_not_found(&call.func_name))??;

        let literal = format!("${{{func_content}}}");
        current = match current {
            Value::String(ref s) if s == &literal => eval_value,
            Value::String(s) => Value::String(s.replacen(&literal, &stringify_value(&eval_value), 1)),
            other => other,
        };
    }

    Ok(current)
}

/// Resolve every `$name` reference in `content`, left to right, against
/// `vars`. Same first-occurrence-replacement and exact-match-preserves-type
/// rules as [`substitute_functions`].
fn substitute_variables(content: Value, vars: &VariableMapping) -> Result<Value> {
    let mut s = match content {
        Value::String(s) => s,
        other => return Ok(other),
    };

    let names = extract_variables(&s);
    for name in names {
        let value = vars
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::variable_not_found(&name))?;
        let literal = format!("${name}");
        if s == literal {
            return Ok(value);
        }
        s = s.replacen(&literal, &stringify_value(&value), 1);
    }

    Ok(Value::String(s))
}

/// `parse_data(content, vars, funcs) -> content'` — the top-level recursive
/// dispatcher. `null`, numbers, and booleans pass through unchanged;
/// sequences are mapped element-wise; mappings are rebuilt with both keys
/// and values substituted; strings are trimmed, then run through function
/// substitution, then variable substitution.
pub fn parse_data(content: &Value, vars: &VariableMapping, funcs: &FunctionMapping) -> Result<Value> {
    match content {
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(content.clone()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(parse_data(item, vars, funcs)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let new_key = match parse_data(&Value::String(key.clone()), vars, funcs)? {
                    Value::String(s) => s,
                    other => stringify_value(&other),
                };
                out.insert(new_key, parse_data(value, vars, funcs)?);
            }
            Ok(Value::Object(out))
        }
        Value::String(s) => {
            let trimmed = s.trim();
            let after_funcs = substitute_functions(trimmed, vars, funcs)?;
            substitute_variables(after_funcs, vars)
        }
    }
}
