//! External-collaborator interface for the `parameterize`/`P` built-in
//! the core depends only on this trait, never on file
//! I/O directly. A concrete CSV-backed implementation lives one layer up.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::registry::FunctionMapping;

/// Loads a CSV file into a sequence of header-keyed rows.
pub trait CsvLoader: Send + Sync {
    fn load_csv(&self, path: &str) -> Result<Vec<IndexMap<String, Value>>>;
}

/// Register `parameterize` (and its alias `P`) against `funcs`, backed by
/// `loader`. Built-in composition means this should be
/// registered alongside the other built-ins, before any user registration,
/// so a user-supplied `parameterize` can still shadow it.
pub fn register_parameterize<L>(funcs: &mut FunctionMapping, loader: L)
where
    L: CsvLoader + Clone + 'static,
{
    let loader_for_p = loader.clone();
    funcs.register("parameterize", move |args, _kwargs| {
        let path = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| crate::error::Error::param("parameterize requires a CSV path argument"))?;
        let rows = loader.load_csv(path)?;
        Ok(Value::Array(
            rows.into_iter()
                .map(|row| Value::Object(row.into_iter().collect()))
                .collect(),
        ))
    });
    funcs.register("P", move |args, _kwargs| {
        let path = args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| crate::error::Error::param("P requires a CSV path argument"))?;
        let rows = loader_for_p.load_csv(path)?;
        Ok(Value::Array(
            rows.into_iter()
                .map(|row| Value::Object(row.into_iter().collect()))
                .collect(),
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FakeCsv;

    impl CsvLoader for FakeCsv {
        fn load_csv(&self, _path: &str) -> Result<Vec<IndexMap<String, Value>>> {
            let mut row = IndexMap::new();
            row.insert("username".to_string(), Value::String("u1".to_string()));
            Ok(vec![row])
        }
    }

    #[test]
    fn parameterize_and_alias_both_resolve() {
        let mut funcs = FunctionMapping::new();
        register_parameterize(&mut funcs, FakeCsv);
        let kwargs = IndexMap::new();
        let via_full = funcs.call("parameterize", &[Value::String("x.csv".into())], &kwargs).unwrap().unwrap();
        let via_alias = funcs.call("P", &[Value::String("x.csv".into())], &kwargs).unwrap().unwrap();
        assert_eq!(via_full, via_alias);
    }
}
