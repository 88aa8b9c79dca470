//! Expression Parser: tokenizes and interprets the `$name` / `${name(args)}`
//! mini-language embedded inside string scalars. Pure, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};

/// `$name` — one or more word characters, matched greedily so `$user` never
/// matches as a prefix of `$userid`.
pub(crate) static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("static regex"));

/// `${name(args)}` — the outer braces delimit a single call; nested `${...}`
/// inside the argument list is not supported.
pub(crate) static FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*\([$A-Za-z0-9_.\-/ =,]*\))\}").expect("static regex"));

static FUNCTION_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\(([$A-Za-z0-9_.\-/ =,]*)\)$").expect("static regex"));

/// A parsed function call: name plus positional and keyword arguments, each
/// already coerced via [`parse_string_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub func_name: String,
    pub args: Vec<Value>,
    pub kwargs: indexmap::IndexMap<String, Value>,
}

/// Coerce a bare literal (`"123"`, `"12.2"`, `"true"`, `"null"`) to its typed
/// value; anything else, including strings starting with `$`, passes through
/// unchanged.
pub fn parse_string_value(s: &str) -> Value {
    if s.starts_with('$') {
        return Value::String(s.to_string());
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match s {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "None" => return Value::Null,
        _ => {}
    }
    Value::String(s.to_string())
}

/// Extract every `$name` reference from `content`, in left-to-right order.
pub fn extract_variables(content: &str) -> Vec<String> {
    VARIABLE_RE
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect()
}

/// Extract every `name(args)` function literal (without the surrounding
/// `${...}`) from `content`, in left-to-right order.
pub fn extract_functions(content: &str) -> Vec<String> {
    FUNCTION_RE
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect()
}

/// Parse a single `name(args)` literal into its function-call meta.
pub fn parse_function(content: &str) -> Result<FunctionCall> {
    let caps = FUNCTION_CALL_RE
        .captures(content)
        .ok_or_else(|| Error::function_not_found(content))?;
    let func_name = caps[1].to_string();
    let args_str = caps[2].trim();

    let mut args = Vec::new();
    let mut kwargs = indexmap::IndexMap::new();
    if !args_str.is_empty() {
        for raw in args_str.split(',') {
            let arg = raw.trim();
            if let Some((key, value)) = arg.split_once('=') {
                kwargs.insert(key.trim().to_string(), parse_string_value(value.trim()));
            } else {
                args.push(parse_string_value(arg));
            }
        }
    }

    Ok(FunctionCall {
        func_name,
        args,
        kwargs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_variables_in_order() {
        assert_eq!(extract_variables("/$var1/$var2"), vec!["var1", "var2"]);
        assert_eq!(extract_variables("abc"), Vec::<String>::new());
    }

    #[test]
    fn variable_boundary_does_not_prefix_match() {
        assert_eq!(extract_variables("$userid"), vec!["userid"]);
        assert_eq!(extract_variables("$user vs $userid"), vec!["user", "userid"]);
    }

    #[test]
    fn extracts_functions() {
        assert_eq!(
            extract_functions("/api/${add(1, 2)}?_t=${get_timestamp()}"),
            vec!["add(1, 2)", "get_timestamp()"]
        );
    }

    #[test]
    fn parses_function_with_args_and_kwargs() {
        let meta = parse_function("func(1, 2, a=3, b=4)").unwrap();
        assert_eq!(meta.func_name, "func");
        assert_eq!(meta.args, vec![Value::from(1), Value::from(2)]);
        assert_eq!(meta.kwargs.get("a"), Some(&Value::from(3)));
        assert_eq!(meta.kwargs.get("b"), Some(&Value::from(4)));
    }

    #[test]
    fn parses_function_with_no_args() {
        let meta = parse_function("func()").unwrap();
        assert_eq!(meta.func_name, "func");
        assert!(meta.args.is_empty());
        assert!(meta.kwargs.is_empty());
    }

    #[test]
    fn rejects_unmatched_literal() {
        assert!(parse_function("not a call").is_err());
    }

    #[test]
    fn string_value_coercion() {
        assert_eq!(parse_string_value("123"), Value::from(123));
        assert_eq!(parse_string_value("12.2"), Value::from(12.2));
        assert_eq!(parse_string_value("abc"), Value::String("abc".into()));
        assert_eq!(parse_string_value("$var"), Value::String("$var".into()));
        assert_eq!(parse_string_value("true"), Value::Bool(true));
        assert_eq!(parse_string_value("null"), Value::Null);
    }
}
