//! Test File Assembler: expands a test document into a canonical
//! `{config, teststeps:[…]}` form, resolving each step's `api:`/`suite:`
//! reference against the Definition Store, substituting call-site
//! arguments, and merging validators/extractors.

use std::collections::HashSet;

use serde_json::Value;

use crate::definitions::{Block, DefinitionStore};
use crate::error::{Error, Result};
use crate::expr::parse_function;
use crate::merge::{merge_extractors, merge_validators};

/// One raw item of a loaded test/suite document: tagged `config` or `test`,
/// carrying its single block.
pub enum DocItem {
    Config(Block),
    Test(Block),
}

/// An assembled test document, ready for execution.
pub struct AssembledTestcase {
    pub config: Block,
    pub teststeps: Vec<Block>,
}

fn validators_of(block: &Block) -> Vec<Value> {
    block
        .get("validate")
        .or_else(|| block.get("validators"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn extractors_of(block: &Block) -> Vec<Value> {
    block
        .get("extract")
        .or_else(|| block.get("extractors"))
        .or_else(|| block.get("extract_binds"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Extend `ref_block` with `def_block`: the definition's fields overwrite
/// the step's non-list fields, then `validate`/`extract` are set to the
/// merged (additive) lists.
pub fn extend_block(ref_block: &mut Block, def_block: &Block) -> Result<()> {
    let def_validators = validators_of(def_block);
    let ref_validators = validators_of(ref_block);
    let def_extractors = extractors_of(def_block);
    let ref_extractors = extractors_of(ref_block);

    for (key, value) in def_block {
        ref_block.insert(key.clone(), value.clone());
    }

    ref_block.insert(
        "validate".to_string(),
        Value::Array(merge_validators(&def_validators, &ref_validators)?),
    );
    ref_block.insert(
        "extract".to_string(),
        Value::Array(merge_extractors(&def_extractors, &ref_extractors)),
    );
    ref_block.remove("validators");
    ref_block.remove("extract_binds");
    ref_block.remove("extractors");

    Ok(())
}

/// Literal substitution of call-site argument values into a definition
/// body, keyed by declared argument name — the mechanism used to bind
/// `api_login($user)`'s call args into `api_login`'s declared `(user)`
/// signature before the definition is used. Distinct from the
/// expression-language substitution in `substitute.rs`, but the same
/// token-based discipline: only a `$name` occurrence (the declared arg
/// referenced as a variable, the way a suite's own steps pass its args
/// down into a nested `api:`/`suite:` call) or a string equal to the bare
/// declared name in full is substituted. A bare declared-arg name
/// appearing elsewhere in a string is left untouched — it is not a
/// reference to the argument, just text that happens to match.
///
/// A `$name` occurrence is replaced as one unit — `$` and the name
/// together — rather than leaving the `$` in place and splicing the
/// mapped value after it; a naive substring replace would otherwise turn
/// `$username` into `$$user` when the mapped value is itself `$user`,
/// compounding with every additional level of suite nesting.
pub fn substitute_call_args(content: &Value, mapping: &indexmap::IndexMap<String, Value>) -> Value {
    match content {
        Value::Array(items) => Value::Array(items.iter().map(|i| substitute_call_args(i, mapping)).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let new_key = match substitute_call_args(&Value::String(k.clone()), mapping) {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                out.insert(new_key, substitute_call_args(v, mapping));
            }
            Value::Object(out)
        }
        Value::String(s) => {
            let mut current = s.clone();
            let mut exact_match: Option<Value> = None;
            for (var, value) in mapping {
                if &current == var {
                    exact_match = Some(value.clone());
                    break;
                }
                let replacement = match value {
                    Value::String(v) => v.clone(),
                    other => other.to_string(),
                };
                current = current.replace(&format!("${var}"), &replacement);
            }
            exact_match.unwrap_or(Value::String(current))
        }
        other => other.clone(),
    }
}

fn args_mapping(declared: &[Value], call: &[Value], func_name: &str) -> Result<indexmap::IndexMap<String, Value>> {
    if declared.len() != call.len() {
        return Err(Error::param(format!(
            "{func_name}: call args number is not equal to defined args number! defined args: {declared:?}, reference args: {call:?}"
        )));
    }
    let mut mapping = indexmap::IndexMap::new();
    for (declared_item, call_item) in declared.iter().zip(call.iter()) {
        if declared_item == call_item {
            continue;
        }
        let key = match declared_item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        mapping.insert(key, call_item.clone());
    }
    Ok(mapping)
}

fn resolve_api_reference(ref_call: &str, store: &DefinitionStore) -> Result<Block> {
    let call = parse_function(ref_call)?;
    let def = store.get_api(&call.func_name)?;
    let mapping = args_mapping(&def.declared_args, &call.args, &call.func_name)?;
    if mapping.is_empty() {
        return Ok(def.block.clone());
    }
    match substitute_call_args(&Value::Object(def.block.clone()), &mapping) {
        Value::Object(map) => Ok(map),
        _ => Ok(def.block.clone()),
    }
}

/// Expand one `test` block into one or more concrete steps: resolves `api:`
/// and `suite:` references (the latter fully, not just one level — see
/// fully rather than one level deep),
/// guarded against suite self-reference cycles.
pub fn expand_test_block(block: &Block, store: &DefinitionStore, visited: &mut HashSet<String>) -> Result<Vec<Block>> {
    if let Some(Value::String(ref_call)) = block.get("api") {
        let def_block = resolve_api_reference(ref_call, store)?;
        let mut step = block.clone();
        step.remove("api");
        extend_block(&mut step, &def_block)?;
        return Ok(vec![step]);
    }

    if let Some(Value::String(ref_call)) = block.get("suite") {
        let call = parse_function(ref_call)?;
        if !visited.insert(call.func_name.clone()) {
            return Err(Error::param(format!("suite reference cycle detected at '{}'", call.func_name)));
        }

        let testcase_def = store.get_testcase(&call.func_name)?;
        let mapping = args_mapping(&testcase_def.declared_args, &call.args, &call.func_name)?;

        let mut expanded = Vec::new();
        for step in &testcase_def.teststeps {
            let substituted = if mapping.is_empty() {
                step.clone()
            } else {
                match substitute_call_args(&Value::Object(step.clone()), &mapping) {
                    Value::Object(map) => map,
                    _ => step.clone(),
                }
            };
            expanded.extend(expand_test_block(&substituted, store, visited)?);
        }

        visited.remove(&call.func_name);
        return Ok(expanded);
    }

    Ok(vec![block.clone()])
}

/// Assemble a loaded document's tagged items into a canonical testcase.
/// Ill-formed items should be rejected by the caller before reaching this
/// function (not single-key mapping → `FileFormatError`).
pub fn assemble(items: Vec<DocItem>, store: &DefinitionStore) -> Result<AssembledTestcase> {
    let mut config = Block::new();
    let mut teststeps = Vec::new();

    for item in items {
        match item {
            DocItem::Config(block) => {
                for (key, value) in block {
                    config.insert(key, value);
                }
            }
            DocItem::Test(block) => {
                let mut visited = HashSet::new();
                teststeps.extend(expand_test_block(&block, store, &mut visited)?);
            }
        }
    }

    Ok(AssembledTestcase { config, teststeps })
}
