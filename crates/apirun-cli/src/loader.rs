//! Document Loader: walks `api/`/`suite`/testcase folders, decodes
//! `.yml`/`.yaml`/`.json` documents into the core's `Block` value type,
//! decodes `.csv` into header-keyed rows, and reads the project's `.env`
//! file.

use std::path::{Path, PathBuf};

use apirun_core::assembler::{self, AssembledTestcase, DocItem};
use apirun_core::definitions::{Block, DefinitionStore};
use apirun_core::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;

/// Reads a `.csv` file into header-keyed rows, for the core's
/// `apirun_core::csv_source::CsvLoader` trait.
#[derive(Debug, Clone, Default)]
pub struct FsCsvLoader;

impl apirun_core::csv_source::CsvLoader for FsCsvLoader {
    fn load_csv(&self, path: &str) -> Result<Vec<IndexMap<String, Value>>> {
        load_csv_file(Path::new(path))
    }
}

fn io_err(path: &Path, source: std::io::Error) -> Error {
    if source.kind() == std::io::ErrorKind::NotFound {
        Error::file_not_found(path.display().to_string())
    } else {
        Error::file_format(format!("could not read {}: {source}", path.display()))
    }
}

/// Load and parse one `.yml`/`.yaml` document. An empty file, or content that
/// does not decode to a list or mapping, is a `FileFormatError`.
pub fn load_yaml_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if raw.trim().is_empty() {
        return Err(Error::file_format(format!("empty YAML file: {}", path.display())));
    }
    let value: Value = serde_yaml::from_str(&raw)
        .map_err(|e| Error::file_format(format!("YAML parse error in {}: {e}", path.display())))?;
    if !(value.is_array() || value.is_object()) {
        return Err(Error::file_format(format!("YAML file format error: {}", path.display())));
    }
    Ok(value)
}

/// Load and parse one `.json` document. Same empty/shape checks as
/// [`load_yaml_file`].
pub fn load_json_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if raw.trim().is_empty() {
        return Err(Error::file_format(format!("empty JSON file: {}", path.display())));
    }
    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::file_format(format!("JSON parse error in {}: {e}", path.display())))?;
    if !(value.is_array() || value.is_object()) || (value.is_object() && value.as_object().is_some_and(|m| m.is_empty())) {
        return Err(Error::file_format(format!("JSON file format error: {}", path.display())));
    }
    Ok(value)
}

/// Load a `.csv` file; first row is the header, every subsequent row becomes
/// a header-keyed mapping.
pub fn load_csv_file(path: &Path) -> Result<Vec<IndexMap<String, Value>>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| io_err(path, std::io::Error::other(e)))?;
    let headers = reader
        .headers()
        .map_err(|e| Error::file_format(format!("CSV header error in {}: {e}", path.display())))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::file_format(format!("CSV row error in {}: {e}", path.display())))?;
        let mut row = IndexMap::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Load a single file by extension. Unsupported extensions return an empty
/// array rather than erroring.
pub fn load_file(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("yml" | "yaml") => load_yaml_file(path),
        Some("json") => load_json_file(path),
        _ => Ok(Value::Array(Vec::new())),
    }
}

/// Recursively list every `.yml`/`.yaml`/`.json` file under `folder`. A
/// missing folder yields an empty list rather than erroring.
pub fn load_folder_files(folder: &Path) -> Vec<PathBuf> {
    if !folder.exists() {
        return Vec::new();
    }
    globwalk::GlobWalkerBuilder::from_patterns(folder, &["**/*.{yml,yaml,json}"])
        .build()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path().to_path_buf())
        .collect()
}

/// Locate `file_name` starting from `start_path` (a file or a directory),
/// searching upward through ancestor directories until it is found, the
/// current working directory is reached, or the filesystem root is reached
/// — for resolving a bare filename reference (e.g. a
/// CLI argument) against a project whose root is not the caller's cwd.
pub fn locate_file(start_path: &Path, file_name: &str) -> Result<PathBuf> {
    let start_dir = if start_path.is_file() {
        start_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    } else if start_path.is_dir() {
        start_path.to_path_buf()
    } else {
        return Err(Error::file_not_found(format!("invalid path: {}", start_path.display())));
    };

    let candidate = start_dir.join(file_name);
    if candidate.is_file() {
        return Ok(candidate);
    }

    let absolute = start_dir.canonicalize().unwrap_or(start_dir.clone());
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if absolute == cwd || absolute.parent().is_none() {
        return Err(Error::file_not_found(format!("{file_name} not found in {}", start_path.display())));
    }

    match start_dir.parent() {
        Some(parent) => locate_file(parent, file_name),
        None => Err(Error::file_not_found(format!("{file_name} not found in {}", start_path.display()))),
    }
}

/// Parse a decoded document's top-level sequence of single-key mappings into
/// `(tag, block)` pairs. A value that is not an array of single-key object
/// mappings is a `FileFormatError`.
fn tagged_items(value: &Value, path: &Path) -> Result<Vec<(String, Block)>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::file_format(format!("expected a top-level list in {}", path.display())))?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let obj = item
            .as_object()
            .ok_or_else(|| Error::file_format(format!("item is not a mapping in {}", path.display())))?;
        if obj.len() != 1 {
            return Err(Error::file_format(format!(
                "expected a single-key mapping in {}, got {item}",
                path.display()
            )));
        }
        let (tag, body) = obj.iter().next().expect("len == 1");
        let block = body
            .as_object()
            .ok_or_else(|| Error::file_format(format!("'{tag}' value is not a mapping in {}", path.display())))?
            .clone();
        out.push((tag.clone(), block));
    }
    Ok(out)
}

/// Load one API definition document into `store`. Each item must be tagged
/// `api`, with its body's `def` field supplying the `name(args)` signature;
/// any other tag produces a warning and is skipped.
pub fn load_api_file(path: &Path, store: &mut DefinitionStore) -> Result<()> {
    let value = load_file(path)?;
    for (tag, block) in tagged_items(&value, path)? {
        if tag != "api" {
            tracing::warn!(tag, path = %path.display(), "unknown top-level key in API definition file, skipping");
            continue;
        }
        let def_signature = block
            .get("def")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::file_format(format!("API definition missing 'def' in {}", path.display())))?
            .to_string();
        store.insert_api(&def_signature, block)?;
    }
    Ok(())
}

/// Load every API definition document under `folder` into `store`.
pub fn load_api_folder(folder: &Path, store: &mut DefinitionStore) -> Result<()> {
    for path in load_folder_files(folder) {
        load_api_file(&path, store)?;
    }
    Ok(())
}

fn split_config_test(value: &Value, path: &Path) -> Result<(Block, Vec<Block>)> {
    let mut config = Block::new();
    let mut teststeps = Vec::new();
    for (tag, block) in tagged_items(value, path)? {
        match tag.as_str() {
            "config" => config.extend(block),
            "test" => teststeps.push(block),
            other => tracing::warn!(tag = other, path = %path.display(), "unknown top-level key, skipping"),
        }
    }
    Ok((config, teststeps))
}

/// Load one suite/testcase definition document. If `config.def` names a
/// signature, the suite is registered under that name (so `suite:
/// name(args)` references can resolve it); an anonymous suite file produces
/// a warning, since it can never be referenced.
pub fn load_suite_file(path: &Path, store: &mut DefinitionStore) -> Result<()> {
    let value = load_file(path)?;
    let (mut config, teststeps) = split_config_test(&value, path)?;

    let Some(def_signature) = config.get("def").and_then(Value::as_str).map(str::to_string) else {
        tracing::warn!(path = %path.display(), "suite file has no config.def, cannot be referenced");
        return Ok(());
    };
    config.remove("def");
    store.insert_named_testcase(&def_signature, config, teststeps)
}

/// Load every suite definition document under `folder` into `store`.
pub fn load_suite_folder(folder: &Path, store: &mut DefinitionStore) -> Result<()> {
    for path in load_folder_files(folder) {
        load_suite_file(&path, store)?;
    }
    Ok(())
}

/// Load and fully assemble a standalone test-case document: resolves every
/// `api:`/`suite:` reference in it against `store` and merges validators and
/// extractors. The document is also cached in `store` under
/// its path, in raw (unexpanded) form.
pub fn load_testcase_file(path: &Path, store: &mut DefinitionStore) -> Result<AssembledTestcase> {
    let value = load_file(path)?;
    let (config, teststeps) = split_config_test(&value, path)?;
    store.insert_anonymous_testcase(&path.display().to_string(), config.clone(), teststeps.clone());

    let items = teststeps.into_iter().map(DocItem::Test).chain(std::iter::once(DocItem::Config(config))).collect();
    assembler::assemble(items, store)
}

/// Load and assemble every test-case document under `folder`.
pub fn load_testcase_folder(folder: &Path, store: &mut DefinitionStore) -> Result<Vec<(PathBuf, AssembledTestcase)>> {
    let mut out = Vec::new();
    for path in load_folder_files(folder) {
        out.push((path.clone(), load_testcase_file(&path, store)?));
    }
    Ok(out)
}

/// Parse a `.env` file: one `KEY=VALUE` or `KEY:VALUE` per line, whitespace
/// trimmed. Malformed lines are a `FileFormatError`. Returns an empty
/// mapping if the file does not exist — a project need not have one
/// .
pub fn load_env_file(path: &Path) -> Result<IndexMap<String, String>> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no .env file present");
        return Ok(IndexMap::new());
    }

    tracing::info!(path = %path.display(), "loading environment variables");
    let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let mut mapping = IndexMap::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = if let Some(idx) = line.find('=') {
            line.split_at(idx)
        } else if let Some(idx) = line.find(':') {
            line.split_at(idx)
        } else {
            return Err(Error::file_format(format!(".env format error on line: {line}")));
        };
        let value = &value[1..];
        mapping.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(mapping)
}

/// Mirror a loaded `.env` mapping into the process environment. Not
/// re-entrant; must be called once, before any case executes.
pub fn apply_env_to_process(mapping: &IndexMap<String, String>) {
    for (key, value) in mapping {
        std::env::set_var(key, value);
    }
}
