//! Orchestrates one assembled test case against a live HTTP endpoint: builds
//! an `ExecutionContext`, drives the Document Loader's output step by step,
//! and collects a `CaseReport`. This is the "runner/driver" collaborator
//! the core depends on only through `ResponseObject`/`CsvLoader`.

use apirun_core::context::{normalize_variable_list, ExecutionContext, Scope};
use apirun_core::definitions::Block;
use apirun_core::error::{Error, Failure, Result};
use apirun_core::parameters::expand_parameters;
use apirun_core::registry::{FunctionMapping, VariableMapping};
use apirun_core::response::ResponseObject;
use serde_json::Value;

use crate::http_driver::HttpDriver;
use crate::report::{CaseReport, StepReport};

fn resolve_extract_item(ctx: &ExecutionContext, expr: &Value, response: &dyn ResponseObject) -> Result<Value> {
    match expr {
        Value::Object(_) | Value::Array(_) => ctx.eval_content(expr),
        Value::String(s) if s.contains('$') => ctx.eval_content(expr),
        Value::String(path) => response.extract_field(path),
        other => Ok(other.clone()),
    }
}

fn run_extractors(ctx: &mut ExecutionContext, extractors: &[Value], response: &dyn ResponseObject) -> Result<()> {
    let mut bindings = Vec::with_capacity(extractors.len());
    for extractor in extractors {
        let obj = extractor
            .as_object()
            .filter(|o| o.len() == 1)
            .ok_or_else(|| Error::file_format(format!("extractor is not a single-key mapping: {extractor}")))?;
        let (name, expr) = obj.iter().next().expect("len == 1");
        let value = resolve_extract_item(ctx, expr, response)?;
        bindings.push((name.clone(), value));
    }
    ctx.update_testcase_runtime_variables(&bindings);
    Ok(())
}

fn field_list(block: &Block, key: &str) -> Vec<Value> {
    block.get(key).and_then(Value::as_array).cloned().unwrap_or_default()
}

/// Run one assembled case's `config` + `teststeps` against `driver`, seeded
/// with `base_vars` and `funcs`. If `config.parameters` is present, the case
/// is run once per expanded parameter row and every run is returned.
pub async fn run_case(
    name: &str,
    config: &Block,
    teststeps: &[Block],
    base_vars: &VariableMapping,
    funcs: &FunctionMapping,
    driver: &HttpDriver,
) -> Result<Vec<CaseReport>> {
    let parameter_rows = match config.get("parameters") {
        Some(Value::Array(decls)) => {
            let pairs: Vec<(String, Value)> = decls
                .iter()
                .filter_map(|d| d.as_object().and_then(|o| o.iter().next()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            expand_parameters(&pairs, base_vars, funcs)?
        }
        _ => Vec::new(),
    };

    if parameter_rows.is_empty() {
        let report = run_case_once(name, config, teststeps, base_vars.clone(), funcs, driver).await?;
        return Ok(vec![report]);
    }

    let mut reports = Vec::with_capacity(parameter_rows.len());
    for (i, row) in parameter_rows.iter().enumerate() {
        let mut vars = base_vars.clone();
        for (k, v) in row {
            vars.insert(k.clone(), v.clone());
        }
        reports.push(run_case_once(&format!("{name} [{i}]"), config, teststeps, vars, funcs, driver).await?);
    }
    Ok(reports)
}

async fn run_case_once(
    name: &str,
    config: &Block,
    teststeps: &[Block],
    base_vars: VariableMapping,
    funcs: &FunctionMapping,
    driver: &HttpDriver,
) -> Result<CaseReport> {
    let mut ctx = ExecutionContext::new(base_vars, funcs.clone());

    if let Some(raw_vars) = config.get("variables") {
        let entries = normalize_variable_list(raw_vars)?;
        ctx.update_context_variables(&entries, Scope::Suite)?;
    }
    if let Some(request) = config.get("request") {
        ctx.get_parsed_request(request, Scope::Suite)?;
    }

    let mut steps = Vec::with_capacity(teststeps.len());
    for step in teststeps {
        steps.push(run_step(&mut ctx, step, driver).await);
    }

    Ok(CaseReport { name: name.to_string(), steps })
}

async fn run_step(ctx: &mut ExecutionContext, step: &Block, driver: &HttpDriver) -> StepReport {
    let step_name = step
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed step>")
        .to_string();

    match run_step_inner(ctx, step, driver).await {
        Ok((validators, failure)) => StepReport { name: step_name, validators, error: failure },
        Err(err) => StepReport { name: step_name, validators: Vec::new(), error: Some(err.to_string()) },
    }
}

type StepOutcome = (Vec<apirun_core::validator::Validator>, Option<String>);

/// Evaluate each hook expression (e.g. `${sleep_N_secs(1)}`) against `ctx`.
/// A hook is a plain expression-language string run for its side effect;
/// its return value is discarded. A pipeline defect while evaluating one
/// (unknown function/variable) is a test-level hook failure, not a pipeline
/// abort — `SetupHooksFailure`/`TeardownHooksFailure`.
fn run_hooks(ctx: &ExecutionContext, hooks: &[Value], wrap: impl Fn(String) -> Failure) -> Option<String> {
    for hook in hooks {
        if let Err(err) = ctx.eval_content(hook) {
            return Some(wrap(err.to_string()).to_string());
        }
    }
    None
}

async fn run_step_inner(ctx: &mut ExecutionContext, step: &Block, driver: &HttpDriver) -> anyhow::Result<StepOutcome> {
    ctx.reset_step_vars();

    if let Some(raw_vars) = step.get("variables") {
        let entries = normalize_variable_list(raw_vars)?;
        ctx.update_context_variables(&entries, Scope::Step)?;
    }

    let setup_hooks = field_list(step, "setup_hooks");
    if let Some(failure) = run_hooks(ctx, &setup_hooks, Failure::SetupHooks) {
        return Ok((Vec::new(), Some(failure)));
    }

    let request = step.get("request").cloned().unwrap_or(Value::Object(Default::default()));
    let resolved_request = ctx.get_parsed_request(&request, Scope::Step)?;
    let response = driver.send(&resolved_request).await?;

    let extractors = field_list(step, "extract");
    if let Err(err) = run_extractors(ctx, &extractors, &response) {
        let failure = Failure::Extract(err.to_string());
        return Ok((Vec::new(), Some(failure.to_string())));
    }

    let validators = field_list(step, "validate");
    let before = ctx.evaluated_validators.len();
    let outcome = ctx.validate(&validators, &response)?;
    let this_step_validators = ctx.evaluated_validators[before..].to_vec();
    let mut failure = outcome.err().map(|f| f.to_string());

    let teardown_hooks = field_list(step, "teardown_hooks");
    if let Some(teardown_failure) = run_hooks(ctx, &teardown_hooks, Failure::TeardownHooks) {
        failure = Some(match failure {
            Some(existing) => format!("{existing}; {teardown_failure}"),
            None => teardown_failure,
        });
    }

    Ok((this_step_validators, failure))
}
