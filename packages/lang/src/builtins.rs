//! Builtin functions and importable packages.

use crate::value::Value;

/// Import paths that resolve to a builtin package.
pub const PACKAGES: &[&str] = &["strings", "list"];

/// Functions callable without an import.
pub const FUNCTIONS: &[&str] = &["len"];

pub fn is_package(path: &str) -> bool {
    PACKAGES.contains(&path)
}

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

/// Call a universe-scope builtin such as `len`.
pub fn call_function(name: &str, args: &[Value]) -> Value {
    if let Some(bad) = check_args(args) {
        return bad;
    }
    match (name, args) {
        ("len", [Value::String(s)]) => Value::Int(s.len() as i64),
        ("len", [Value::List(items)]) => Value::Int(items.len() as i64),
        ("len", [Value::Struct(fields)]) => Value::Int(fields.len() as i64),
        ("len", [other]) => Value::bottom(format!("invalid argument {} to len", other.describe())),
        _ => arity_error(name, args),
    }
}

/// Call `name` from the builtin package imported as `package`.
pub fn call_package(package: &str, name: &str, args: &[Value]) -> Value {
    if let Some(bad) = check_args(args) {
        return bad;
    }
    match (package, name, args) {
        ("strings", "ToUpper", [Value::String(s)]) => Value::String(s.to_uppercase()),
        ("strings", "ToLower", [Value::String(s)]) => Value::String(s.to_lowercase()),
        ("strings", "TrimSpace", [Value::String(s)]) => Value::String(s.trim().to_string()),
        ("strings", "Contains", [Value::String(s), Value::String(sub)]) => {
            Value::Bool(s.contains(sub.as_str()))
        }
        ("strings", "HasPrefix", [Value::String(s), Value::String(p)]) => {
            Value::Bool(s.starts_with(p.as_str()))
        }
        ("strings", "HasSuffix", [Value::String(s), Value::String(p)]) => {
            Value::Bool(s.ends_with(p.as_str()))
        }
        ("strings", "Split", [Value::String(s), Value::String(sep)]) => Value::List(
            s.split(sep.as_str())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ),
        ("strings", "Join", [Value::List(items), Value::String(sep)]) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.as_str()),
                    other => {
                        return Value::bottom(format!(
                            "strings.Join: element {} is not a string",
                            other.describe()
                        ))
                    }
                }
            }
            Value::String(parts.join(sep.as_str()))
        }
        ("list", "Concat", [Value::List(lists)]) => {
            let mut out = Vec::new();
            for list in lists {
                match list {
                    Value::List(items) => out.extend(items.iter().cloned()),
                    other => {
                        return Value::bottom(format!(
                            "list.Concat: element {} is not a list",
                            other.describe()
                        ))
                    }
                }
            }
            Value::List(out)
        }
        ("list", "Contains", [Value::List(items), needle]) => {
            Value::Bool(items.iter().any(|item| item == needle))
        }
        (pkg, func, _) if is_known(pkg, func) => arity_error(&format!("{}.{}", pkg, func), args),
        (pkg, func, _) => Value::bottom(format!("undefined builtin {}.{}", pkg, func)),
    }
}

fn is_known(package: &str, name: &str) -> bool {
    matches!(
        (package, name),
        (
            "strings",
            "ToUpper" | "ToLower" | "TrimSpace" | "Contains" | "HasPrefix" | "HasSuffix" | "Split"
                | "Join"
        ) | ("list", "Concat" | "Contains")
    )
}

/// Errors and non-concrete arguments short-circuit every builtin.
fn check_args(args: &[Value]) -> Option<Value> {
    if let Some(bad) = args.iter().find(|a| a.is_bottom()) {
        return Some(bad.clone());
    }
    args.iter()
        .find(|a| !a.is_concrete())
        .map(|a| Value::bottom(format!("incomplete argument {}", a.describe())))
}

fn arity_error(name: &str, args: &[Value]) -> Value {
    let types: Vec<&str> = args.iter().map(Value::type_name).collect();
    Value::bottom(format!(
        "cannot call {} with arguments ({})",
        name,
        types.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn len_of_values() {
        assert_eq!(call_function("len", &[s("abc")]), Value::Int(3));
        assert_eq!(
            call_function("len", &[Value::List(vec![Value::Null, Value::Null])]),
            Value::Int(2)
        );
        assert!(call_function("len", &[Value::Int(1)]).is_bottom());
        assert!(call_function("len", &[]).is_bottom());
    }

    #[test]
    fn strings_package() {
        assert_eq!(call_package("strings", "ToUpper", &[s("ab")]), s("AB"));
        assert_eq!(
            call_package("strings", "Contains", &[s("abc"), s("b")]),
            Value::Bool(true)
        );
        assert_eq!(
            call_package("strings", "Join", &[Value::List(vec![s("a"), s("b")]), s("-")]),
            s("a-b")
        );
    }

    #[test]
    fn list_package() {
        let lists = Value::List(vec![
            Value::List(vec![Value::Int(1)]),
            Value::List(vec![Value::Int(2)]),
        ]);
        assert_eq!(
            call_package("list", "Concat", &[lists]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn unknown_and_misused_builtins() {
        let v = call_package("strings", "Reverse", &[s("a")]);
        assert_eq!(v.err(), Some("undefined builtin strings.Reverse"));

        let v = call_package("strings", "ToUpper", &[Value::Int(1)]);
        assert!(v.err().unwrap().contains("cannot call strings.ToUpper"));
    }

    #[test]
    fn incomplete_arguments() {
        let v = call_function("len", &[Value::Kind(Kind::String)]);
        assert_eq!(v.err(), Some("incomplete argument string"));
    }
}
