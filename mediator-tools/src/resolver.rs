//! Maps inbound argument objects onto declared parameter lists.

use mediator_schema::ParamSpec;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::convert::{ConvertError, ConverterRegistry};

/// Result alias for argument resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors produced while resolving arguments against parameter metadata.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A supplied value could not be converted to the declared type.
    #[error("cannot resolve argument '{name}': {source}")]
    Convert {
        /// Resolved name of the offending parameter.
        name: String,
        /// Underlying conversion failure.
        #[source]
        source: ConvertError,
    },
}

/// Resolves an argument object into positional values in declared order.
///
/// Each parameter is looked up by its resolved name. A missing key yields
/// the declared default when one is set, `Value::Null` otherwise; it is
/// never a failure. Present values are converted through the registry.
///
/// # Errors
///
/// Returns [`ResolveError::Convert`] when a supplied value cannot be
/// converted to its declared parameter type.
pub fn resolve_arguments(
    params: &[ParamSpec],
    arguments: &Map<String, Value>,
    converters: &ConverterRegistry,
) -> ResolveResult<Vec<Value>> {
    let mut resolved = Vec::with_capacity(params.len());
    for param in params {
        let name = param.resolved_name();
        let value = match arguments.get(name) {
            Some(value) => {
                converters
                    .convert(value, param.param_type())
                    .map_err(|source| ResolveError::Convert {
                        name: name.to_owned(),
                        source,
                    })?
            }
            None => param
                .constraints()
                .default_value()
                .cloned()
                .unwrap_or(Value::Null),
        };
        resolved.push(value);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use mediator_schema::{Constraints, ParamType};
    use serde_json::json;

    use super::*;

    fn arguments(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test arguments must be an object"),
        }
    }

    #[test]
    fn resolves_in_declared_order() {
        let params = vec![
            ParamSpec::new("limit", ParamType::integer()),
            ParamSpec::new("query", ParamType::string()),
        ];
        let args = arguments(json!({ "query": "cats", "limit": "5" }));

        let resolved =
            resolve_arguments(&params, &args, &ConverterRegistry::with_defaults()).unwrap();
        assert_eq!(resolved, vec![json!(5), json!("cats")]);
    }

    #[test]
    fn missing_key_yields_null() {
        let params = vec![ParamSpec::new("query", ParamType::string())];
        let args = arguments(json!({}));

        let resolved =
            resolve_arguments(&params, &args, &ConverterRegistry::with_defaults()).unwrap();
        assert_eq!(resolved, vec![Value::Null]);
    }

    #[test]
    fn missing_key_with_default_yields_default() {
        let params = vec![
            ParamSpec::new("limit", ParamType::integer())
                .with_constraints(Constraints::new().with_default(json!(10))),
        ];
        let args = arguments(json!({}));

        let resolved =
            resolve_arguments(&params, &args, &ConverterRegistry::with_defaults()).unwrap();
        assert_eq!(resolved, vec![json!(10)]);
    }

    #[test]
    fn unconvertible_value_names_the_parameter() {
        let params = vec![ParamSpec::new("limit", ParamType::integer())];
        let args = arguments(json!({ "limit": [1, 2] }));

        let err = resolve_arguments(&params, &args, &ConverterRegistry::with_defaults())
            .expect_err("array is not an integer");
        assert!(matches!(err, ResolveError::Convert { name, .. } if name == "limit"));
    }

    #[test]
    fn rename_changes_the_lookup_key() {
        let params = vec![ParamSpec::new("containerId", ParamType::string()).with_rename("id")];
        let args = arguments(json!({ "id": "abc", "containerId": "ignored" }));

        let resolved =
            resolve_arguments(&params, &args, &ConverterRegistry::with_defaults()).unwrap();
        assert_eq!(resolved, vec![json!("abc")]);
    }
}
