//! Execution Context: two-tier variable scope plus the helper registry;
//! resolves each request on demand, evaluates validators against a
//! response, records per-validator outcomes.

use indexmap::IndexMap;
use serde_json::Value;

use crate::comparators::{check_null_policy, uniform_comparator};
use crate::error::{Error, Failure, Result};
use crate::merge::deep_merge;
use crate::registry::{FunctionMapping, VariableMapping};
use crate::response::ResponseObject;
use crate::substitute::parse_data;
use crate::validator::{parse_validator, CheckResult, Validator};

/// Which scope a variable update or request resolution targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Suite,
    Step,
}

/// Normalize a variable declaration list into ordered `(name, value)` pairs.
/// Accepts either an ordered mapping object, or a list of single-key
/// mappings (each converted preserving order).
pub fn normalize_variable_list(content: &Value) -> Result<Vec<(String, Value)>> {
    match content {
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let obj = item
                    .as_object()
                    .filter(|o| o.len() == 1)
                    .ok_or_else(|| Error::file_format(format!("expected a single-key mapping, got {item}")))?;
                let (k, v) = obj.iter().next().expect("len == 1");
                out.push((k.clone(), v.clone()));
            }
            Ok(out)
        }
        other => Err(Error::file_format(format!("expected a variable mapping or list, got {other}"))),
    }
}

/// Holds `suite_vars`/`step_vars`/`funcs`/`suite_request`/
/// `evaluated_validators` for one case's execution; discarded afterward.
pub struct ExecutionContext {
    suite_vars: VariableMapping,
    step_vars: VariableMapping,
    funcs: FunctionMapping,
    suite_request: Value,
    pub evaluated_validators: Vec<Validator>,
}

impl ExecutionContext {
    /// `(variables, functions) -> Context`. `step_vars` starts as a deep
    /// copy of `suite_vars`; `suite_request` starts empty.
    pub fn new(variables: VariableMapping, functions: FunctionMapping) -> Self {
        let step_vars = variables.clone();
        Self {
            suite_vars: variables,
            step_vars,
            funcs: functions,
            suite_request: Value::Object(Default::default()),
            evaluated_validators: Vec::new(),
        }
    }

    /// Reset `step_vars` from `suite_vars` at the start of a new step.
    pub fn reset_step_vars(&mut self) {
        self.step_vars = self.suite_vars.clone();
    }

    pub fn step_vars(&self) -> &VariableMapping {
        &self.step_vars
    }

    pub fn suite_vars(&self) -> &VariableMapping {
        &self.suite_vars
    }

    /// Resolve each entry against the *current* `step_vars` (so later
    /// bindings may reference earlier ones), then write into `step_vars`
    /// always, and into `suite_vars` iff `level == Scope::Suite`.
    pub fn update_context_variables(&mut self, entries: &[(String, Value)], level: Scope) -> Result<()> {
        for (name, raw_value) in entries {
            let resolved = parse_data(raw_value, &self.step_vars, &self.funcs)?;
            if level == Scope::Suite {
                self.suite_vars.insert(name.clone(), resolved.clone());
            }
            self.step_vars.insert(name.clone(), resolved);
        }
        Ok(())
    }

    /// Delegate to the Data Substituter against `step_vars`/`funcs`.
    pub fn eval_content(&self, content: &Value) -> Result<Value> {
        parse_data(content, &self.step_vars, &self.funcs)
    }

    /// At suite level, stash `request` as the suite request skeleton and
    /// return it unparsed. At step level, deep-merge `request` over a copy
    /// of the suite request skeleton and evaluate the result.
    pub fn get_parsed_request(&mut self, request: &Value, level: Scope) -> Result<Value> {
        match level {
            Scope::Suite => {
                self.suite_request = request.clone();
                Ok(request.clone())
            }
            Scope::Step => {
                let merged = deep_merge(&self.suite_request, request);
                self.eval_content(&merged)
            }
        }
    }

    /// Write extracted bindings into both `suite_vars` and `step_vars`.
    pub fn update_testcase_runtime_variables(&mut self, entries: &[(String, Value)]) {
        for (name, value) in entries {
            self.suite_vars.insert(name.clone(), value.clone());
            self.step_vars.insert(name.clone(), value.clone());
        }
    }

    fn resolve_check_item(&self, check: &Value, response: &dyn ResponseObject) -> Result<Value> {
        match check {
            Value::Object(_) | Value::Array(_) => self.eval_content(check),
            Value::String(s) if s.contains('$') => self.eval_content(check),
            Value::String(path) => response.extract_field(path),
            other => Ok(other.clone()),
        }
    }

    /// Evaluate every validator against `response`. Pipeline defects
    /// (malformed validator, unknown comparator/variable/function) abort
    /// immediately via the outer `Result`; per-validator mismatches are
    /// collected and reported once, via the inner `Result`, after every
    /// validator has been evaluated and appended to `evaluated_validators`.
    pub fn validate(&mut self, validators: &[Value], response: &dyn ResponseObject) -> Result<std::result::Result<(), Failure>> {
        let mut messages = Vec::new();
        let empty_kwargs = IndexMap::new();

        for raw in validators {
            let mut v = parse_validator(raw)?;
            let check_value = self.resolve_check_item(&v.check, response)?;
            let expect_value = self.eval_content(&v.expect)?;
            let comparator = uniform_comparator(&v.comparator).to_string();
            check_null_policy(&comparator, &check_value, &expect_value)?;

            let outcome = self
                .funcs
                .call(&comparator, &[check_value.clone(), expect_value.clone()], &empty_kwargs)
                .ok_or_else(|| Error::function_not_found(&comparator))??;

            let passed = matches!(outcome, Value::Bool(true));
            v.check_value = Some(check_value.clone());
            v.comparator = comparator;
            v.expect = expect_value.clone();
            v.check_result = if passed { CheckResult::Pass } else { CheckResult::Fail };

            if !passed {
                let type_name = match &expect_value {
                    Value::Null => "NoneType",
                    Value::Bool(_) => "bool",
                    Value::Number(n) if n.is_i64() || n.is_u64() => "int",
                    Value::Number(_) => "float",
                    Value::String(_) => "str",
                    Value::Array(_) => "list",
                    Value::Object(_) => "dict",
                };
                messages.push(format!(
                    "validator: {} {} {} ({}), got {}",
                    v.check, v.comparator, v.expect, type_name, check_value
                ));
            }

            self.evaluated_validators.push(v);
        }

        if messages.is_empty() {
            Ok(Ok(()))
        } else {
            Ok(Err(Failure::Validation(messages.join("; "))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::register_builtins;
    use serde_json::json;

    struct FakeResponse {
        status: u16,
        body: Value,
        headers: IndexMap<String, String>,
    }

    impl ResponseObject for FakeResponse {
        fn extract_field(&self, path: &str) -> Result<Value> {
            if path == "status_code" {
                return Ok(Value::from(self.status));
            }
            if let Some(rest) = path.strip_prefix("content.") {
                return self
                    .body
                    .get(rest)
                    .cloned()
                    .ok_or_else(|| Error::param(format!("field not found: {path}")));
            }
            Err(Error::param(format!("unsupported path: {path}")))
        }

        fn status_code(&self) -> u16 {
            self.status
        }

        fn headers(&self) -> &IndexMap<String, String> {
            &self.headers
        }

        fn body(&self) -> &Value {
            &self.body
        }
    }

    fn funcs() -> FunctionMapping {
        let mut f = FunctionMapping::new();
        register_builtins(&mut f);
        f
    }

    #[test]
    fn step_vars_reset_does_not_leak_back_to_suite_vars() {
        let mut ctx = ExecutionContext::new(
            VariableMapping::from([("a".to_string(), json!(1))]),
            funcs(),
        );
        ctx.update_context_variables(&[("b".to_string(), json!(2))], Scope::Step).unwrap();
        assert!(ctx.step_vars().contains_key("b"));
        assert!(!ctx.suite_vars().contains_key("b"));

        ctx.reset_step_vars();
        assert!(!ctx.step_vars().contains_key("b"));
        assert!(ctx.step_vars().contains_key("a"));
    }

    #[test]
    fn suite_level_update_writes_both_scopes() {
        let mut ctx = ExecutionContext::new(VariableMapping::new(), funcs());
        ctx.update_context_variables(&[("token".to_string(), json!("abc"))], Scope::Suite).unwrap();
        assert_eq!(ctx.suite_vars().get("token"), Some(&json!("abc")));
        assert_eq!(ctx.step_vars().get("token"), Some(&json!("abc")));
    }

    #[test]
    fn request_deep_merges_over_suite_skeleton() {
        let mut ctx = ExecutionContext::new(VariableMapping::new(), funcs());
        ctx.get_parsed_request(&json!({"headers": {"accept": "json"}, "url": "/base"}), Scope::Suite)
            .unwrap();
        let resolved = ctx
            .get_parsed_request(&json!({"headers": {"token": "abc"}, "url": "/login"}), Scope::Step)
            .unwrap();
        assert_eq!(
            resolved,
            json!({"headers": {"accept": "json", "token": "abc"}, "url": "/login"})
        );
    }

    #[test]
    fn validate_collects_all_failures_before_reporting() {
        let mut ctx = ExecutionContext::new(VariableMapping::new(), funcs());
        let response = FakeResponse {
            status: 201,
            body: json!({"token": "abcdefghijklmnop"}),
            headers: IndexMap::new(),
        };
        let validators = vec![
            json!({"check": "status_code", "expect": 200}),
            json!({"check": "content.token", "expected": 16, "comparator": "len_eq"}),
        ];
        let result = ctx.validate(&validators, &response).unwrap();
        assert!(result.is_err());
        assert_eq!(ctx.evaluated_validators.len(), 2);
        assert_eq!(ctx.evaluated_validators[0].check_result, CheckResult::Fail);
        assert_eq!(ctx.evaluated_validators[1].check_result, CheckResult::Pass);
    }

    #[test]
    fn validate_passes_when_all_validators_match() {
        let mut ctx = ExecutionContext::new(VariableMapping::new(), funcs());
        let response = FakeResponse {
            status: 200,
            body: json!({}),
            headers: IndexMap::new(),
        };
        let validators = vec![json!({"check": "status_code", "expect": 200})];
        let result = ctx.validate(&validators, &response).unwrap();
        assert!(result.is_ok());
    }
}
