//! Evaluated values.
//!
//! A [`Value`] is the result of building a program: a tree of labeled struct
//! fields and scalars. Any node may be an error (`Bottom`) or not yet
//! concrete (`Top`, a [`Kind`]).

use std::fmt;

use crate::path::Path;

/// A basic type constraint such as `int` or `string`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Float,
    Number,
    String,
}

impl Kind {
    pub fn from_keyword(word: &str) -> Option<Kind> {
        let kind = match word {
            "bool" => Kind::Bool,
            "int" => Kind::Int,
            "float" => Kind::Float,
            "number" => Kind::Number,
            "string" => Kind::String,
            _ => return None,
        };
        Some(kind)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Number => "number",
            Kind::String => "string",
        }
    }

    /// The most general kind both `self` and `other` admit.
    pub fn meet(self, other: Kind) -> Option<Kind> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Kind::Number, k @ (Kind::Int | Kind::Float))
            | (k @ (Kind::Int | Kind::Float), Kind::Number) => Some(k),
            _ => None,
        }
    }

    /// Whether a concrete value is an instance of this kind.
    pub fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Kind::Bool, Value::Bool(_))
                | (Kind::Int, Value::Int(_))
                | (Kind::Float, Value::Float(_))
                | (Kind::Number, Value::Int(_) | Value::Float(_))
                | (Kind::String, Value::String(_))
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Any value; the identity of unification.
    Top,
    /// An error value carrying its message.
    Bottom(String),
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Kind(Kind),
    List(Vec<Value>),
    /// Fields in first-declaration order.
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn bottom(message: impl Into<String>) -> Self {
        Value::Bottom(message.into())
    }

    pub fn empty_struct() -> Self {
        Value::Struct(Vec::new())
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Value::Bottom(_))
    }

    /// True if no node in the tree is `_`, a kind, or an error.
    pub fn is_concrete(&self) -> bool {
        match self {
            Value::Top | Value::Bottom(_) | Value::Kind(_) => false,
            Value::List(items) => items.iter().all(Value::is_concrete),
            Value::Struct(fields) => fields.iter().all(|(_, v)| v.is_concrete()),
            _ => true,
        }
    }

    /// The first error in the tree, depth first.
    pub fn err(&self) -> Option<&str> {
        match self {
            Value::Bottom(message) => Some(message),
            Value::List(items) => items.iter().find_map(Value::err),
            Value::Struct(fields) => fields.iter().find_map(|(_, v)| v.err()),
            _ => None,
        }
    }

    pub fn field(&self, label: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(l, _)| l == label).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Navigate struct fields along `path`. Returns `None` when a label is
    /// missing or a non-struct is reached before the end of the path.
    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        let mut current = self;
        for label in path.iter() {
            current = current.field(label)?;
        }
        Some(current)
    }

    /// Top-level field labels, or `None` if this is not a struct.
    pub fn labels(&self) -> Option<Vec<&str>> {
        match self {
            Value::Struct(fields) => Some(fields.iter().map(|(l, _)| l.as_str()).collect()),
            _ => None,
        }
    }

    /// Unify this value with `value` placed at `path`, creating the
    /// intermediate structs.
    pub fn fill(&self, value: Value, path: &Path) -> Value {
        let nested = path
            .iter()
            .rev()
            .fold(value, |inner, label| Value::Struct(vec![(label.clone(), inner)]));
        crate::unify::unify(self, &nested)
    }

    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Top => "_",
            Value::Bottom(_) => "_|_",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Kind(kind) => kind.keyword(),
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
        }
    }

    /// A compact single-line rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Top => "_".to_string(),
            Value::Bottom(_) => "_|_".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::String(s) => format!("{:?}", s),
            Value::Kind(kind) => kind.to_string(),
            Value::List(_) => "[...]".to_string(),
            Value::Struct(_) => "{...}".to_string(),
        }
    }
}

/// Render a float so that it reads back as a float (`2` becomes `2.0`).
pub fn format_float(n: f64) -> String {
    let text = n.to_string();
    if n.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{}.0", text)
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::Struct(vec![
            ("a".to_string(), Value::Int(1)),
            (
                "b".to_string(),
                Value::Struct(vec![("c".to_string(), Value::String("x".to_string()))]),
            ),
        ])
    }

    #[test]
    fn kind_meet() {
        assert_eq!(Kind::Int.meet(Kind::Number), Some(Kind::Int));
        assert_eq!(Kind::Number.meet(Kind::Float), Some(Kind::Float));
        assert_eq!(Kind::String.meet(Kind::String), Some(Kind::String));
        assert_eq!(Kind::Int.meet(Kind::Float), None);
        assert_eq!(Kind::Bool.meet(Kind::String), None);
    }

    #[test]
    fn kind_admits() {
        assert!(Kind::Number.admits(&Value::Int(1)));
        assert!(Kind::Number.admits(&Value::Float(1.5)));
        assert!(!Kind::Int.admits(&Value::Float(1.0)));
        assert!(!Kind::String.admits(&Value::Null));
    }

    #[test]
    fn lookup_navigates_structs() {
        let v = sample();
        assert_eq!(v.lookup(&Path::parse("a")), Some(&Value::Int(1)));
        assert_eq!(
            v.lookup(&Path::parse("b.c")),
            Some(&Value::String("x".to_string()))
        );
        assert_eq!(v.lookup(&Path::parse("b.d")), None);
        assert_eq!(v.lookup(&Path::parse("a.b")), None);
        assert_eq!(v.lookup(&Path::root()), Some(&v));
    }

    #[test]
    fn labels_only_for_structs() {
        assert_eq!(sample().labels(), Some(vec!["a", "b"]));
        assert_eq!(Value::Int(1).labels(), None);
    }

    #[test]
    fn err_finds_nested_bottom() {
        let v = Value::Struct(vec![
            ("a".to_string(), Value::Int(1)),
            (
                "b".to_string(),
                Value::List(vec![Value::bottom("conflict")]),
            ),
        ]);
        assert_eq!(v.err(), Some("conflict"));
        assert_eq!(sample().err(), None);
    }

    #[test]
    fn concreteness() {
        assert!(sample().is_concrete());
        assert!(!Value::Kind(Kind::Int).is_concrete());
        assert!(!Value::Struct(vec![("a".to_string(), Value::Top)]).is_concrete());
    }

    #[test]
    fn fill_nests_at_path() {
        let filled = Value::empty_struct().fill(Value::Int(1), &Path::parse("x.y"));
        assert_eq!(
            filled,
            Value::Struct(vec![(
                "x".to_string(),
                Value::Struct(vec![("y".to_string(), Value::Int(1))])
            )])
        );
    }

    #[test]
    fn fill_conflict_produces_error() {
        let base = Value::Struct(vec![("x".to_string(), Value::Int(1))]);
        let filled = base.fill(Value::Int(2), &Path::parse("x"));
        assert!(filled.err().is_some());
    }

    #[test]
    fn float_formatting_keeps_decimal_point() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(3.5), "3.5");
    }
}
