//! Building programs into values.
//!
//! All files of a program form one root struct. A field's value is the
//! unification of every declaration that reaches its path, whether it was
//! written as a struct literal or arrived through a reference. References
//! resolve lexically through the enclosing struct literals and always see
//! the complete value of the field they name.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::ast::{BinaryOp, Decl, Expr, File, ImportSpec, LetClause, UnaryOp};
use crate::builtins;
use crate::error::EvalError;
use crate::parser::expr_unresolved;
use crate::path::Path;
use crate::unify::unify;
use crate::value::Value;

/// Longest string, in bytes, that repetition may produce.
const MAX_STRING_LEN: usize = 1 << 20;

/// A built program.
///
/// Holds the evaluated root value together with the declarations it came
/// from, so further expressions can be evaluated in the program's scope.
#[derive(Debug, Clone)]
pub struct Instance {
    decls: Vec<Decl>,
    imports: Vec<ImportSpec>,
    value: Value,
}

/// Build `files` into a single value.
///
/// Fails if an import names an unknown package, if an identifier left
/// unresolved by the parser is not declared at package level, or if the
/// root itself is an error. Conflicts inside fields are kept in the value.
pub fn build(files: &[File]) -> Result<Instance, EvalError> {
    let decls: Vec<Decl> = files.iter().flat_map(|f| f.decls.iter().cloned()).collect();
    let imports: Vec<ImportSpec> = files
        .iter()
        .flat_map(|f| f.imports.iter().cloned())
        .collect();

    if let Some(import) = imports.iter().find(|i| !builtins::is_package(&i.path)) {
        return Err(EvalError::UnknownPackage {
            path: import.path.clone(),
        });
    }
    for ident in files.iter().flat_map(|f| &f.unresolved) {
        if !resolvable_at_root(&ident.name, &decls, &imports) {
            return Err(EvalError::UnresolvedReference {
                name: ident.name.clone(),
            });
        }
    }

    let value = Evaluator::new(&decls, &imports).value_at(&Path::root());
    debug!(
        "built {} declaration(s) from {} file(s)",
        decls.len(),
        files.len()
    );
    if let Value::Bottom(message) = &value {
        return Err(EvalError::Bottom(message.clone()));
    }
    Ok(Instance {
        decls,
        imports,
        value,
    })
}

impl Instance {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Evaluate `expr` in the scope of the program's root struct.
    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        for ident in expr_unresolved(expr) {
            if !resolvable_at_root(&ident.name, &self.decls, &self.imports) {
                return Err(EvalError::UnresolvedReference { name: ident.name });
            }
        }

        let mut evaluator = Evaluator::new(&self.decls, &self.imports);
        let env = vec![Frame {
            path: Path::root(),
            decls: &self.decls,
        }];
        match evaluator.eval(expr, &env) {
            Value::Bottom(message) => Err(EvalError::Bottom(message)),
            value => Ok(value),
        }
    }
}

fn resolvable_at_root(name: &str, decls: &[Decl], imports: &[ImportSpec]) -> bool {
    declares(decls, name)
        || imports.iter().any(|i| i.name() == name)
        || builtins::is_function(name)
}

fn declares(decls: &[Decl], name: &str) -> bool {
    decls.iter().any(|decl| match decl {
        Decl::Field(field) => field.label == name,
        Decl::Let(clause) => clause.name == name,
    })
}

/// One struct literal on the lexical scope chain, and the path it defines.
#[derive(Debug, Clone)]
struct Frame<'a> {
    path: Path,
    decls: &'a [Decl],
}

type Env<'a> = Vec<Frame<'a>>;

/// Something that constrains the value at a path.
#[derive(Debug, Clone)]
enum Contribution<'a> {
    /// A struct literal; the env is the scope outside the literal.
    Decls(&'a [Decl], Env<'a>),
    Expr(&'a Expr, Env<'a>),
    Value(Value),
}

/// Split top-level unifications so struct literals inside `a & {...}` still
/// contribute fields by path.
fn push_expr<'a>(out: &mut Vec<Contribution<'a>>, expr: &'a Expr, env: &Env<'a>) {
    match expr {
        Expr::Struct(decls) => out.push(Contribution::Decls(decls, env.clone())),
        Expr::Binary {
            op: BinaryOp::Unify,
            lhs,
            rhs,
        } => {
            push_expr(out, lhs, env);
            push_expr(out, rhs, env);
        }
        other => out.push(Contribution::Expr(other, env.clone())),
    }
}

enum Part<'a> {
    Literal(Vec<&'a str>),
    Value(Value),
}

struct Evaluator<'a> {
    imports: &'a [ImportSpec],
    /// Paths whose contributions are known up front: the root and every
    /// anonymous struct literal evaluated as an expression.
    seeds: HashMap<Path, Vec<Contribution<'a>>>,
    cache: HashMap<Path, Value>,
    in_progress: HashSet<Path>,
    collecting: HashSet<Path>,
    lets_in_progress: Vec<*const LetClause>,
    anonymous: usize,
}

impl<'a> Evaluator<'a> {
    fn new(root: &'a [Decl], imports: &'a [ImportSpec]) -> Self {
        let mut seeds = HashMap::new();
        seeds.insert(Path::root(), vec![Contribution::Decls(root, Vec::new())]);
        Self {
            imports,
            seeds,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
            collecting: HashSet::new(),
            lets_in_progress: Vec::new(),
            anonymous: 0,
        }
    }

    fn value_at(&mut self, path: &Path) -> Value {
        if let Some(value) = self.cache.get(path) {
            return value.clone();
        }
        if !self.in_progress.insert(path.clone()) {
            return Value::bottom(match path.last() {
                Some(label) => format!("cycle detected in field {}", label),
                None => "cycle detected".to_string(),
            });
        }

        let contributions = self.contributions(path);
        let value = if contributions.is_empty() {
            Value::bottom(format!(
                "undefined field: {}",
                path.last().unwrap_or_default()
            ))
        } else {
            self.combine(path, contributions)
        };

        self.in_progress.remove(path);
        self.cache.insert(path.clone(), value.clone());
        value
    }

    /// Everything that declares the value at `path`. References in parent
    /// values are followed by path rather than evaluated, so a field can be
    /// reached through a reference while its target is still being built.
    fn contributions(&mut self, path: &Path) -> Vec<Contribution<'a>> {
        if let Some(seed) = self.seeds.get(path) {
            return seed.clone();
        }
        if !self.collecting.insert(path.clone()) {
            return Vec::new();
        }
        let out = self.collect(path);
        self.collecting.remove(path);
        out
    }

    fn collect(&mut self, path: &Path) -> Vec<Contribution<'a>> {
        let (Some(parent), Some(label)) = (path.parent(), path.last()) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for contribution in self.contributions(&parent) {
            match contribution {
                Contribution::Decls(decls, env) => {
                    let mut inner = env;
                    inner.push(Frame {
                        path: parent.clone(),
                        decls,
                    });
                    for decl in decls {
                        if let Decl::Field(field) = decl {
                            if field.label == label {
                                push_expr(&mut out, &field.value, &inner);
                            }
                        }
                    }
                }
                Contribution::Expr(expr, env) => match self.reference_path(expr, &env) {
                    Some(target) => out.extend(self.contributions(&target.child(label))),
                    None => {
                        if let Some(value) = self.eval(expr, &env).field(label) {
                            out.push(Contribution::Value(value.clone()));
                        }
                    }
                },
                Contribution::Value(value) => {
                    if let Some(value) = value.field(label) {
                        out.push(Contribution::Value(value.clone()));
                    }
                }
            }
        }
        out
    }

    /// Unify all contributions in declaration order.
    fn combine(&mut self, path: &Path, contributions: Vec<Contribution<'a>>) -> Value {
        let mut parts = Vec::with_capacity(contributions.len());
        let mut labels: Vec<&'a str> = Vec::new();
        for contribution in contributions {
            match contribution {
                Contribution::Decls(decls, _) => {
                    let mut literal = Vec::new();
                    for decl in decls {
                        if let Decl::Field(field) = decl {
                            if !literal.contains(&field.label.as_str()) {
                                literal.push(field.label.as_str());
                            }
                            if !labels.contains(&field.label.as_str()) {
                                labels.push(field.label.as_str());
                            }
                        }
                    }
                    parts.push(Part::Literal(literal));
                }
                Contribution::Expr(expr, env) => parts.push(Part::Value(self.eval(expr, &env))),
                Contribution::Value(value) => parts.push(Part::Value(value)),
            }
        }

        let mut fields: HashMap<&'a str, Value> = HashMap::new();
        for label in labels {
            let value = self.value_at(&path.child(label));
            fields.insert(label, value);
        }

        let mut result = Value::Top;
        for part in parts {
            let value = match part {
                Part::Literal(literal) => Value::Struct(
                    literal
                        .into_iter()
                        .map(|label| {
                            let value = fields.get(label).cloned().unwrap_or(Value::Top);
                            (label.to_string(), value)
                        })
                        .collect(),
                ),
                Part::Value(value) => value,
            };
            result = unify(&result, &value);
        }
        result
    }

    fn eval(&mut self, expr: &'a Expr, env: &Env<'a>) -> Value {
        match expr {
            Expr::Top => Value::Top,
            Expr::Bottom(message) => {
                Value::bottom(message.as_deref().unwrap_or("explicit error (_|_ literal) in source"))
            }
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(n) => Value::Int(*n),
            Expr::Float(n) => Value::Float(*n),
            Expr::Str(s) => Value::String(s.clone()),
            Expr::Kind(kind) => Value::Kind(*kind),
            Expr::Ident(ident) => self.resolve(&ident.name, env),
            Expr::Struct(decls) => self.eval_struct(decls, env),
            Expr::List(items) => Value::List(items.iter().map(|item| self.eval(item, env)).collect()),
            Expr::Unary { op, expr } => {
                let value = self.eval(expr, env);
                unary(*op, &value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs, env);
                let r = self.eval(rhs, env);
                binary(*op, &l, &r)
            }
            Expr::Selector { expr: base, label } => match self.reference_path(expr, env) {
                Some(path) => self.value_at(&path),
                None => {
                    let value = self.eval(base, env);
                    select(&value, label)
                }
            },
            Expr::Index { expr: base, index } => {
                let value = self.eval(base, env);
                let index = self.eval(index, env);
                index_value(&value, &index)
            }
            Expr::Call { func, args } => self.call(func, args, env),
        }
    }

    fn resolve(&mut self, name: &str, env: &Env<'a>) -> Value {
        for (depth, frame) in env.iter().enumerate().rev() {
            for decl in frame.decls {
                match decl {
                    Decl::Let(clause) if clause.name == name => {
                        return self.eval_let(clause, &env[..=depth]);
                    }
                    Decl::Field(field) if field.label == name => {
                        return self.value_at(&frame.path.child(name));
                    }
                    _ => {}
                }
            }
        }
        if self.imports.iter().any(|i| i.name() == name) {
            return Value::bottom(format!("cannot use package {} as a value", name));
        }
        if builtins::is_function(name) {
            return Value::bottom(format!("builtin {} must be called", name));
        }
        Value::bottom(format!("reference \"{}\" not found", name))
    }

    fn eval_let(&mut self, clause: &'a LetClause, env: &[Frame<'a>]) -> Value {
        let key = clause as *const LetClause;
        if self.lets_in_progress.contains(&key) {
            return Value::bottom(format!("cycle detected in let {}", clause.name));
        }
        self.lets_in_progress.push(key);
        let value = self.eval(&clause.value, &env.to_vec());
        self.lets_in_progress.pop();
        value
    }

    /// The field path a reference expression names, if it names one.
    fn reference_path(&self, expr: &Expr, env: &Env<'a>) -> Option<Path> {
        match expr {
            Expr::Ident(ident) => {
                for frame in env.iter().rev() {
                    for decl in frame.decls {
                        match decl {
                            Decl::Let(clause) if clause.name == ident.name => return None,
                            Decl::Field(field) if field.label == ident.name => {
                                return Some(frame.path.child(ident.name.clone()));
                            }
                            _ => {}
                        }
                    }
                }
                None
            }
            Expr::Selector { expr, label } => self
                .reference_path(expr, env)
                .map(|path| path.child(label.clone())),
            _ => None,
        }
    }

    fn is_bound(&self, name: &str, env: &Env<'a>) -> bool {
        env.iter().any(|frame| declares(frame.decls, name))
    }

    fn eval_struct(&mut self, decls: &'a [Decl], env: &Env<'a>) -> Value {
        self.anonymous += 1;
        let path = Path::from_labels([format!("\u{0}{}", self.anonymous)]);
        self.seeds
            .insert(path.clone(), vec![Contribution::Decls(decls, env.clone())]);
        self.value_at(&path)
    }

    fn call(&mut self, func: &'a Expr, args: &'a [Expr], env: &Env<'a>) -> Value {
        let values: Vec<Value> = args.iter().map(|arg| self.eval(arg, env)).collect();

        if let Expr::Ident(ident) = func {
            if !self.is_bound(&ident.name, env) && builtins::is_function(&ident.name) {
                return builtins::call_function(&ident.name, &values);
            }
        }
        if let Expr::Selector { expr: base, label } = func {
            if let Expr::Ident(package) = base.as_ref() {
                if !self.is_bound(&package.name, env) {
                    if let Some(import) = self.imports.iter().find(|i| i.name() == package.name) {
                        return builtins::call_package(&import.path, label, &values);
                    }
                }
            }
        }

        match self.eval(func, env) {
            bottom @ Value::Bottom(_) => bottom,
            other => Value::bottom(format!("cannot call non-function {}", other.describe())),
        }
    }
}

fn incomplete(value: &Value) -> Value {
    Value::bottom(format!("incomplete value {}", value.describe()))
}

fn select(value: &Value, label: &str) -> Value {
    match value {
        Value::Bottom(_) => value.clone(),
        Value::Struct(_) => value
            .field(label)
            .cloned()
            .unwrap_or_else(|| Value::bottom(format!("undefined field: {}", label))),
        Value::Top | Value::Kind(_) => incomplete(value),
        other => Value::bottom(format!(
            "invalid selector {} on {}",
            label,
            other.type_name()
        )),
    }
}

fn index_value(base: &Value, index: &Value) -> Value {
    match (base, index) {
        (Value::Bottom(_), _) => base.clone(),
        (_, Value::Bottom(_)) => index.clone(),
        (Value::List(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or_else(|| Value::bottom(format!("index {} out of range", i))),
        (Value::Struct(_), Value::String(label)) => select(base, label),
        (Value::Top | Value::Kind(_), _) => incomplete(base),
        (_, Value::Top | Value::Kind(_)) => incomplete(index),
        _ => Value::bottom(format!(
            "invalid index {} on {}",
            index.describe(),
            base.type_name()
        )),
    }
}

fn unary(op: UnaryOp, value: &Value) -> Value {
    match (op, value) {
        (_, Value::Bottom(_)) => value.clone(),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .unwrap_or_else(|| Value::bottom("integer overflow")),
        (UnaryOp::Neg, Value::Float(n)) => Value::Float(-n),
        (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
        (_, v) if !v.is_concrete() => incomplete(v),
        (op, v) => {
            let symbol = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            };
            Value::bottom(format!("invalid operand {} to '{}'", v.describe(), symbol))
        }
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    if op == BinaryOp::Unify {
        return unify(l, r);
    }
    if l.is_bottom() {
        return l.clone();
    }
    if r.is_bottom() {
        return r.clone();
    }
    if !l.is_concrete() {
        return incomplete(l);
    }
    if !r.is_concrete() {
        return incomplete(r);
    }

    match op {
        BinaryOp::Eq => Value::Bool(values_equal(l, r)),
        BinaryOp::NotEq => Value::Bool(!values_equal(l, r)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, l, r),
        BinaryOp::And | BinaryOp::Or => match (l, r) {
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(if op == BinaryOp::And {
                *a && *b
            } else {
                *a || *b
            }),
            _ => invalid_operands(op, l, r),
        },
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => arithmetic(op, l, r),
        BinaryOp::Unify => unify(l, r),
    }
}

fn invalid_operands(op: BinaryOp, l: &Value, r: &Value) -> Value {
    Value::bottom(format!(
        "invalid operands {} and {} to '{}' (type {} and {})",
        l.describe(),
        r.describe(),
        op.symbol(),
        l.type_name(),
        r.type_name()
    ))
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Struct(a), Value::Struct(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(label, x)| r.field(label).is_some_and(|y| values_equal(x, y)))
        }
        _ => l == r,
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> Value {
    let ordering = match (l, r) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        _ => match (as_f64(l), as_f64(r)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return invalid_operands(op, l, r),
        },
    };
    let Some(ordering) = ordering else {
        return invalid_operands(op, l, r);
    };
    Value::Bool(match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    })
}

fn arithmetic(op: BinaryOp, l: &Value, r: &Value) -> Value {
    match (op, l, r) {
        (BinaryOp::Div, _, _) => match (as_f64(l), as_f64(r)) {
            (Some(_), Some(d)) if d == 0.0 => Value::bottom("division by zero"),
            (Some(n), Some(d)) => Value::Float(n / d),
            _ => invalid_operands(op, l, r),
        },
        (_, Value::Int(a), Value::Int(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                _ => a.checked_mul(*b),
            };
            result
                .map(Value::Int)
                .unwrap_or_else(|| Value::bottom("integer overflow"))
        }
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Value::String(format!("{}{}", a, b)),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Value::List(a.iter().chain(b).cloned().collect())
        }
        (BinaryOp::Mul, Value::String(s), Value::Int(n))
        | (BinaryOp::Mul, Value::Int(n), Value::String(s))
            if *n >= 0 =>
        {
            let count = usize::try_from(*n).unwrap_or(usize::MAX);
            match s.len().checked_mul(count) {
                Some(0) => Value::String(String::new()),
                Some(len) if len <= MAX_STRING_LEN => Value::String(s.repeat(count)),
                _ => Value::bottom(format!(
                    "string repetition {} * {} exceeds {} bytes",
                    s.len(),
                    n,
                    MAX_STRING_LEN
                )),
            }
        }
        _ => match (as_f64(l), as_f64(r)) {
            (Some(a), Some(b)) => Value::Float(match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => a + b,
            }),
            _ => invalid_operands(op, l, r),
        },
    }
}
