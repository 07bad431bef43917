//! Unification of values.

use crate::value::Value;

/// Combine two values into the most general value that satisfies both.
///
/// Never fails outright: incompatible inputs produce a `Bottom` at the
/// point of conflict, so sibling fields keep their values.
pub fn unify(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Bottom(_), _) => a.clone(),
        (_, Value::Bottom(_)) => b.clone(),
        (Value::Top, other) | (other, Value::Top) => other.clone(),

        (Value::Kind(x), Value::Kind(y)) => match x.meet(*y) {
            Some(kind) => Value::Kind(kind),
            None => conflict(a, b),
        },
        (Value::Kind(kind), concrete) | (concrete, Value::Kind(kind)) => {
            if kind.admits(concrete) {
                concrete.clone()
            } else {
                conflict(a, b)
            }
        }

        (Value::Struct(x), Value::Struct(y)) => unify_structs(x, y),
        (Value::List(x), Value::List(y)) => {
            if x.len() != y.len() {
                return Value::bottom(format!(
                    "incompatible list lengths ({} and {})",
                    x.len(),
                    y.len()
                ));
            }
            Value::List(x.iter().zip(y).map(|(l, r)| unify(l, r)).collect())
        }

        (x, y) if x == y => x.clone(),
        _ => conflict(a, b),
    }
}

fn unify_structs(x: &[(String, Value)], y: &[(String, Value)]) -> Value {
    let mut fields: Vec<(String, Value)> = x.to_vec();
    for (label, value) in y {
        match fields.iter_mut().find(|(l, _)| l == label) {
            Some((_, existing)) => *existing = unify(existing, value),
            None => fields.push((label.clone(), value.clone())),
        }
    }
    Value::Struct(fields)
}

fn conflict(a: &Value, b: &Value) -> Value {
    if a.type_name() == b.type_name() {
        Value::bottom(format!(
            "conflicting values {} and {}",
            a.describe(),
            b.describe()
        ))
    } else {
        Value::bottom(format!(
            "conflicting values {} and {} (mismatched types {} and {})",
            a.describe(),
            b.describe(),
            a.type_name(),
            b.type_name()
        ))
    }
}
