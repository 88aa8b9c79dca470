//! Built-in comparators and generators seeded into the Helper Registry
//! Comparators are ordinary registered functions that take
//! `[check_value, expect_value]` and return a `Value::Bool` pass/fail. A
//! type mismatch between the comparator and its operands (e.g. a length
//! comparator's expect value not being an integer) resolves to a plain
//! `Ok(Value::Bool(false))`, so the validator it backs is marked `fail`
//! rather than aborting the whole step; only operand shapes the helper
//! registry itself can't evaluate at all (see `check_null_policy`) are a
//! pipeline `Error`.

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use rand::Rng;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::registry::FunctionMapping;

/// Map a comparator alias to its uniform name. Unknown aliases pass through
/// unchanged.
pub fn uniform_comparator(alias: &str) -> &str {
    match alias {
        "eq" | "==" | "is" => "equals",
        "ne" | "!=" => "not_equals",
        "lt" => "less_than",
        "le" => "less_than_or_equals",
        "gt" => "greater_than",
        "ge" => "greater_than_or_equals",
        "str_eq" => "string_equals",
        "len_eq" | "count_eq" => "length_equals",
        "len_lt" | "count_lt" => "length_less_than",
        "len_le" | "count_le" => "length_less_than_or_equals",
        "len_gt" | "count_gt" => "length_greater_than",
        "len_ge" | "count_ge" => "length_greater_than_or_equals",
        other => other,
    }
}

/// Either operand being `null` restricts the comparator to `equals`
/// .
pub fn check_null_policy(comparator: &str, check: &Value, expect: &Value) -> Result<()> {
    if (check.is_null() || expect.is_null()) && comparator != "equals" {
        return Err(Error::param(format!(
            "null operand only permitted with 'equals', got comparator '{comparator}'"
        )));
    }
    Ok(())
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric_order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) => Some(x.cmp(y)),
            _ => None,
        },
    }
}

fn value_len(v: &Value) -> Option<i64> {
    match v {
        Value::String(s) => Some(s.chars().count() as i64),
        Value::Array(a) => Some(a.len() as i64),
        Value::Object(o) => Some(o.len() as i64),
        _ => None,
    }
}

fn expect_int(v: &Value) -> Option<i64> {
    v.as_i64()
}

fn contains_value(haystack: &Value, needle: &Value) -> Option<bool> {
    match haystack {
        Value::Array(items) => Some(items.contains(needle)),
        Value::String(s) => {
            let needle_str = stringify(needle);
            Some(s.contains(&needle_str))
        }
        _ => None,
    }
}

/// Register every built-in comparator, generator, and hook into `funcs`.
/// Call this before applying any user registrations so user entries may
/// shadow a built-in of the same name.
pub fn register_builtins(funcs: &mut FunctionMapping) {
    funcs.register("equals", |args, _| Ok(Value::Bool(args[0] == args[1])));
    funcs.register("not_equals", |args, _| Ok(Value::Bool(args[0] != args[1])));
    funcs.register("less_than", |args, _| {
        Ok(Value::Bool(numeric_order(&args[0], &args[1]) == Some(Ordering::Less)))
    });
    funcs.register("less_than_or_equals", |args, _| {
        Ok(Value::Bool(matches!(
            numeric_order(&args[0], &args[1]),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )))
    });
    funcs.register("greater_than", |args, _| {
        Ok(Value::Bool(numeric_order(&args[0], &args[1]) == Some(Ordering::Greater)))
    });
    funcs.register("greater_than_or_equals", |args, _| {
        Ok(Value::Bool(matches!(
            numeric_order(&args[0], &args[1]),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )))
    });
    funcs.register("string_equals", |args, _| {
        Ok(Value::Bool(stringify(&args[0]) == stringify(&args[1])))
    });

    funcs.register("length_equals", |args, _| {
        Ok(Value::Bool(match (value_len(&args[0]), expect_int(&args[1])) {
            (Some(len), Some(expect)) => len == expect,
            _ => false,
        }))
    });
    funcs.register("length_less_than", |args, _| {
        Ok(Value::Bool(match (value_len(&args[0]), expect_int(&args[1])) {
            (Some(len), Some(expect)) => len < expect,
            _ => false,
        }))
    });
    funcs.register("length_less_than_or_equals", |args, _| {
        Ok(Value::Bool(match (value_len(&args[0]), expect_int(&args[1])) {
            (Some(len), Some(expect)) => len <= expect,
            _ => false,
        }))
    });
    funcs.register("length_greater_than", |args, _| {
        Ok(Value::Bool(match (value_len(&args[0]), expect_int(&args[1])) {
            (Some(len), Some(expect)) => len > expect,
            _ => false,
        }))
    });
    funcs.register("length_greater_than_or_equals", |args, _| {
        Ok(Value::Bool(match (value_len(&args[0]), expect_int(&args[1])) {
            (Some(len), Some(expect)) => len >= expect,
            _ => false,
        }))
    });

    funcs.register("contains", |args, _| Ok(Value::Bool(contains_value(&args[0], &args[1]).unwrap_or(false))));
    funcs.register("contains_by", |args, _| Ok(Value::Bool(contains_value(&args[1], &args[0]).unwrap_or(false))));

    funcs.register("type_match", |args, _| {
        let type_name = match &args[1] {
            Value::String(s) => s.as_str(),
            _ => return Ok(Value::Bool(false)),
        };
        let actual = match &args[0] {
            Value::Null => "NoneType",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_i64() || n.is_u64() => "int",
            Value::Number(_) => "float",
            Value::String(_) => "str",
            Value::Array(_) => "list",
            Value::Object(_) => "dict",
        };
        Ok(Value::Bool(actual == type_name))
    });

    funcs.register("regex_match", |args, _| {
        let check = stringify(&args[0]);
        let pattern = stringify(&args[1]);
        let re = regex::Regex::new(&pattern)?;
        Ok(Value::Bool(re.find(&check).map(|m| m.start() == 0).unwrap_or(false)))
    });

    funcs.register("startswith", |args, _| {
        Ok(Value::Bool(stringify(&args[0]).starts_with(&stringify(&args[1]))))
    });
    funcs.register("endswith", |args, _| {
        Ok(Value::Bool(stringify(&args[0]).ends_with(&stringify(&args[1]))))
    });

    funcs.register("gen_random_string", |args, _| {
        let len = args.first().and_then(Value::as_u64).unwrap_or(8) as usize;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::rng();
        let s: String = (0..len)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect();
        Ok(Value::String(s))
    });

    funcs.register("get_timestamp", |args, _| {
        let len = args.first().and_then(Value::as_u64).unwrap_or(13) as usize;
        if len == 0 || len > 16 {
            return Err(Error::param(format!("get_timestamp length must be in (0, 17), got {len}")));
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let digits = format!("{}{:09}", now.as_secs(), now.subsec_nanos());
        Ok(Value::String(digits.chars().take(len).collect()))
    });

    funcs.register("sleep_N_secs", |args, _| {
        let secs = args.first().and_then(Value::as_u64).unwrap_or(0);
        std::thread::sleep(std::time::Duration::from_secs(secs));
        Ok(Value::Null)
    });
}

pub fn empty_kwargs() -> IndexMap<String, Value> {
    IndexMap::new()
}
