//! Conversion callbacks and handlers
//!
//! A [`Converter`] turns one raw token into a [`Value`]; a [`Handler`]
//! receives an entity's converted arguments plus its per-parse state and
//! produces the value recorded in the namespace. Parameters without a
//! converter pass raw strings through unchanged.

use crate::error::ConversionError;
use crate::value::{Namespace, Value};
use std::sync::Arc;

/// Raw token → value conversion
pub type Converter = Arc<dyn Fn(&str) -> Result<Value, ConversionError> + Send + Sync>;

/// Entity callback: `(state, converted args) → value`
pub type Handler =
    Arc<dyn Fn(&mut Namespace, Vec<Value>) -> Result<Value, ConversionError> + Send + Sync>;

/// Wrap a closure as a [`Converter`]
pub fn from_fn<F>(f: F) -> Converter
where
    F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Pass the token through as a string
pub fn string() -> Converter {
    Arc::new(|raw| Ok(Value::from(raw)))
}

/// Parse a signed integer
pub fn int() -> Converter {
    Arc::new(|raw| {
        raw.trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConversionError::new(format!("invalid literal for int: '{}'", raw)))
    })
}

/// Parse a float
pub fn float() -> Converter {
    Arc::new(|raw| {
        raw.trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ConversionError::new(format!("could not convert string to float: '{}'", raw)))
    })
}

/// Parse a yes/no style boolean
pub fn boolean() -> Converter {
    Arc::new(|raw| match raw.to_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" => Ok(Value::Bool(true)),
        "no" | "n" | "false" | "f" | "0" => Ok(Value::Bool(false)),
        _ => Err(ConversionError::new(format!(
            "Could not convert '{}' to boolean",
            raw
        ))),
    })
}

/// Best-effort literal: integer, float, `True`/`False`, `None`, else string
pub fn auto() -> Converter {
    Arc::new(|raw| Ok(literal(raw)))
}

fn literal(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(x) = raw.parse::<f64>() {
        return Value::Float(x);
    }
    match raw {
        "True" | "true" => Value::Bool(true),
        "False" | "false" => Value::Bool(false),
        "None" => Value::None,
        _ => Value::from(raw),
    }
}

/// Look up a built-in converter by its definition-file name
pub fn by_name(name: &str) -> Option<Converter> {
    match name {
        "str" | "string" => Some(string()),
        "int" | "integer" => Some(int()),
        "float" => Some(float()),
        "bool" | "boolean" => Some(boolean()),
        "auto" => Some(auto()),
        _ => None,
    }
}

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Namespace, Vec<Value>) -> Result<Value, ConversionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Count invocations within one parse; pair with state `count = 0`
pub fn counter(state: &mut Namespace, _args: Vec<Value>) -> Result<Value, ConversionError> {
    let count = state.get("count").and_then(Value::as_int).unwrap_or(0) + 1;
    state.insert("count", count);
    Ok(Value::Int(count))
}

/// Collect every invocation's value into a list; pair with state `items = []`
pub fn accumulate(state: &mut Namespace, args: Vec<Value>) -> Result<Value, ConversionError> {
    let mut items = match state.remove("items") {
        Some(Value::List(items)) => items,
        _ => Vec::new(),
    };
    items.push(identity(args));
    state.insert("items", items.clone());
    Ok(Value::List(items))
}

/// Handler used when none is given: no args → `true`, one → itself, more → list
pub(crate) fn identity(mut args: Vec<Value>) -> Value {
    match args.len() {
        0 => Value::Bool(true),
        1 => args.remove(0),
        _ => Value::List(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int() {
        let conv = int();
        assert_eq!(conv("42").unwrap(), Value::Int(42));
        let err = conv("what").unwrap_err();
        assert_eq!(err.message(), "invalid literal for int: 'what'");
    }

    #[test]
    fn test_boolean() {
        let conv = boolean();
        assert_eq!(conv("Y").unwrap(), Value::Bool(true));
        assert_eq!(conv("off").unwrap_err().message(), "Could not convert 'off' to boolean");
    }

    #[test]
    fn test_auto() {
        let conv = auto();
        assert_eq!(conv("3").unwrap(), Value::Int(3));
        assert_eq!(conv("2.5").unwrap(), Value::Float(2.5));
        assert_eq!(conv("None").unwrap(), Value::None);
        assert_eq!(conv("abc").unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_by_name() {
        assert!(by_name("int").is_some());
        assert!(by_name("complex").is_none());
    }

    #[test]
    fn test_counter_and_accumulate() {
        let mut state = Namespace::new();
        counter(&mut state, vec![]).unwrap();
        assert_eq!(counter(&mut state, vec![]).unwrap(), Value::Int(2));

        let mut state = Namespace::new();
        accumulate(&mut state, vec![Value::from("2")]).unwrap();
        let items = accumulate(&mut state, vec![Value::from("3")]).unwrap();
        assert_eq!(items, Value::List(vec![Value::from("2"), Value::from("3")]));
    }

    #[test]
    fn test_identity() {
        assert_eq!(identity(vec![]), Value::Bool(true));
        assert_eq!(identity(vec![Value::from("x")]), Value::from("x"));
        assert_eq!(
            identity(vec![Value::from(1), Value::from(2)]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }
}
