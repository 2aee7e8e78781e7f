//! sea-query values → `may_postgres` parameters.
//!
//! `ToSql` references must outlive the call they are passed to, so values are
//! first copied into typed vectors and only then borrowed, in placeholder order,
//! inside the closure.

use crate::executor::StoreError;
use may_postgres::types::ToSql;
use sea_query::{Value, Values};

/// Convert `values` into positional parameters and run `f` with them.
///
/// Only the value kinds the catalog filters produce are accepted; anything else
/// is a [`StoreError::QueryError`].
pub fn with_bound_params<F, R>(values: &Values, f: F) -> Result<R, StoreError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, StoreError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut nulls: Vec<Option<i32>> = Vec::new();

    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::SmallInt(Some(i)) => ints.push(i32::from(*i)),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::String(Some(s)) => strings.push(s.to_string()),
            Value::Bool(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::String(None) => nulls.push(None),
            other => {
                return Err(StoreError::QueryError(format!(
                    "Unsupported value type in catalog query: {other:?}"
                )));
            }
        }
    }

    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut null_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(values.0.len());

    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx]);
                bool_idx += 1;
            }
            Value::SmallInt(Some(_)) | Value::Int(Some(_)) => {
                params.push(&ints[int_idx]);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) => {
                params.push(&big_ints[big_int_idx]);
                big_int_idx += 1;
            }
            Value::String(Some(_)) => {
                params.push(&strings[string_idx]);
                string_idx += 1;
            }
            _ => {
                params.push(&nulls[null_idx]);
                null_idx += 1;
            }
        }
    }

    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binds_in_placeholder_order() {
        let values = Values(vec![
            Value::String(Some("men".to_string())),
            Value::Int(Some(4)),
            Value::String(Some("%red%".to_string())),
        ]);

        let count = with_bound_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_empty_values() {
        let count = with_bound_params(&Values(vec![]), |params| Ok(params.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unsupported_value_is_rejected() {
        let values = Values(vec![Value::Double(Some(1.5))]);
        let err = with_bound_params(&values, |_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("Unsupported value type"));
    }
}
