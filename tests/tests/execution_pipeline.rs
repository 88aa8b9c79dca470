//! Drives the Execution Context through a full two-step run, including the
//! Parameter Expander and a CSV-backed `parameterize` built-in, the way the
//! CLI's runner layer would — but against a
//! canned `ResponseObject` instead of a live HTTP driver, so the pipeline
//! stages under test stay isolated from transport concerns.

use apirun_core::context::{normalize_variable_list, ExecutionContext, Scope};
use apirun_core::csv_source::{register_parameterize, CsvLoader};
use apirun_core::error::Result;
use apirun_core::parameters::expand_parameters;
use apirun_core::registry::VariableMapping;
use apirun_integration_tests::FakeResponse;
use indexmap::IndexMap;
use serde_json::{json, Value};

#[derive(Clone)]
struct InMemoryCsv {
    rows: Vec<IndexMap<String, Value>>,
}

impl CsvLoader for InMemoryCsv {
    fn load_csv(&self, _path: &str) -> Result<Vec<IndexMap<String, Value>>> {
        Ok(self.rows.clone())
    }
}

fn csv_row(username: &str, password: &str) -> IndexMap<String, Value> {
    let mut row = IndexMap::new();
    row.insert("username".to_string(), Value::String(username.to_string()));
    row.insert("password".to_string(), Value::String(password.to_string()));
    row
}

#[test]
fn suite_variables_carry_into_a_step_that_extracts_and_validates() {
    let mut funcs = apirun_core::builtin_functions();
    register_parameterize(&mut funcs, InMemoryCsv { rows: vec![csv_row("u1", "p1")] });

    let mut ctx = ExecutionContext::new(VariableMapping::new(), funcs);

    let suite_vars = normalize_variable_list(&json!({"base_url": "https://api.example.com"})).unwrap();
    ctx.update_context_variables(&suite_vars, Scope::Suite).unwrap();
    ctx.get_parsed_request(&json!({"url": "$base_url", "headers": {"accept": "json"}}), Scope::Suite)
        .unwrap();

    ctx.reset_step_vars();
    let step_vars = normalize_variable_list(&json!([{"path": "/login"}])).unwrap();
    ctx.update_context_variables(&step_vars, Scope::Step).unwrap();
    let resolved_request = ctx.get_parsed_request(&json!({"url": "$path"}), Scope::Step).unwrap();
    assert_eq!(resolved_request, json!({"url": "/login", "headers": {"accept": "json"}}));

    let response = FakeResponse::json(200, json!({"token": "abc123", "user": {"id": 7}}));
    let extractors = vec![json!({"token": "content.token"}), json!({"user_id": "content.user.id"})];
    let bindings: Vec<(String, Value)> = extractors
        .iter()
        .map(|e| {
            let (name, path) = e.as_object().unwrap().iter().next().unwrap();
            (name.clone(), response.extract_field(path.as_str().unwrap()).unwrap())
        })
        .collect();
    ctx.update_testcase_runtime_variables(&bindings);
    assert_eq!(ctx.suite_vars().get("token").unwrap(), "abc123");
    assert_eq!(ctx.step_vars().get("user_id").unwrap(), &json!(7));

    let validators = vec![
        json!({"check": "status_code", "expect": 200}),
        json!({"check": "content.token", "comparator": "len_gt", "expect": 0}),
        json!({"check": "$token", "expect": "abc123"}),
    ];
    let outcome = ctx.validate(&validators, &response).unwrap();
    assert!(outcome.is_ok(), "every validator should pass: {outcome:?}");
    assert_eq!(ctx.evaluated_validators.len(), 3);
}

#[test]
fn parameters_expand_into_one_row_per_csv_record_and_each_row_seeds_its_own_run() {
    let funcs_for_expansion = {
        let mut f = apirun_core::builtin_functions();
        register_parameterize(&mut f, InMemoryCsv { rows: vec![csv_row("u1", "p1"), csv_row("u2", "p2")] });
        f
    };
    let base_vars = VariableMapping::new();
    let declarations = vec![("username-password".to_string(), json!("${parameterize(accounts.csv)}"))];

    let rows = expand_parameters(&declarations, &base_vars, &funcs_for_expansion).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("username").unwrap(), "u1");
    assert_eq!(rows[1].get("password").unwrap(), "p2");

    for row in &rows {
        let mut run_vars = base_vars.clone();
        for (k, v) in row {
            run_vars.insert(k.clone(), v.clone());
        }
        let mut ctx = ExecutionContext::new(run_vars, apirun_core::builtin_functions());
        let request = ctx
            .get_parsed_request(&json!({"url": "/login", "json": {"username": "$username", "password": "$password"}}), Scope::Suite)
            .unwrap();
        assert_eq!(request["json"]["username"], *row.get("username").unwrap());
    }
}

#[test]
fn a_failing_validator_reports_without_aborting_the_remaining_checks() {
    let mut ctx = ExecutionContext::new(VariableMapping::new(), apirun_core::builtin_functions());
    let response = FakeResponse::json(404, json!({"error": "not found"}));
    let validators = vec![
        json!({"check": "status_code", "expect": 200}),
        json!({"check": "content.error", "comparator": "eq", "expect": "not found"}),
    ];
    let outcome = ctx.validate(&validators, &response).unwrap();
    assert!(outcome.is_err());
    assert_eq!(ctx.evaluated_validators.len(), 2, "both validators are evaluated even though the first fails");
    assert_eq!(ctx.evaluated_validators[1].check_result, apirun_core::validator::CheckResult::Pass);
}
