// src/exec/contract.rs

//! The provides contract: what a task returns must be exactly what it
//! declared, and none of it may exist in the context yet.

use serde_json::Value;

use crate::dag::{Context, Task, Values};
use crate::errors::NodeError;

/// Check a task's result against its declared `provides` and the current
/// context, returning the mapping to merge.
///
/// A task that returns nothing gets `{key: true}` synthesised when it
/// declares exactly one key, or `{}` when it declares none.
pub fn validate_result(
    task: &Task,
    result: Option<Values>,
    context: &Context,
) -> Result<Values, NodeError> {
    let declared = task.provided_keys();

    let result = match result {
        Some(values) => values,
        None => match declared {
            [] => Values::new(),
            [key] => Values::from([(key.clone(), Value::Bool(true))]),
            keys => {
                return Err(NodeError::NoResult {
                    task: task.title().to_string(),
                    keys: keys.to_vec(),
                });
            }
        },
    };

    for key in result.keys() {
        if context.contains(key) {
            return Err(NodeError::AlreadyProvided {
                task: task.title().to_string(),
                key: key.clone(),
            });
        }
        if !declared.contains(key) {
            return Err(NodeError::UnexpectedProvide {
                task: task.title().to_string(),
                key: key.clone(),
            });
        }
    }

    if let Some(missing) = declared.iter().find(|k| !result.contains_key(*k)) {
        return Err(NodeError::MissingProvide {
            task: task.title().to_string(),
            key: missing.clone(),
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(provides: &[&str]) -> Task {
        Task::new("T", |_r, _u| async { Ok(None) }).provides(provides.iter().copied())
    }

    fn values(pairs: &[(&str, Value)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn nothing_returned_with_one_key_provides_true() {
        let out = validate_result(&task(&["done"]), None, &Context::new()).unwrap();
        assert_eq!(out, values(&[("done", json!(true))]));
    }

    #[test]
    fn nothing_returned_with_no_keys_provides_nothing() {
        let out = validate_result(&task(&[]), None, &Context::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn nothing_returned_with_several_keys_is_a_violation() {
        let err = validate_result(&task(&["a", "b"]), None, &Context::new()).unwrap_err();
        assert!(matches!(err, NodeError::NoResult { ref keys, .. } if keys.len() == 2));
        assert!(err.is_contract_violation());
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let err = validate_result(
            &task(&["a", "b"]),
            Some(values(&[("a", json!(1))])),
            &Context::new(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "task 'T' did not provide expected b");
    }

    #[test]
    fn undeclared_key_is_rejected() {
        let err = validate_result(
            &task(&["a"]),
            Some(values(&[("a", json!(1)), ("extra", json!(2))])),
            &Context::new(),
        )
        .unwrap_err();
        assert!(matches!(err, NodeError::UnexpectedProvide { key, .. } if key == "extra"));
    }

    #[test]
    fn key_already_in_context_is_rejected() {
        let ctx: Context = values(&[("a", json!("seed"))]).into();
        let err = validate_result(&task(&["a"]), Some(values(&[("a", json!(1))])), &ctx)
            .unwrap_err();
        assert!(matches!(err, NodeError::AlreadyProvided { key, .. } if key == "a"));
    }
}
