//! Syntax tree for Lattice source.

use crate::token::Span;
use crate::value::Kind;

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    pub name: String,
    /// Declarations in source order. Order matters to the evaluator.
    pub decls: Vec<Decl>,
    pub imports: Vec<ImportSpec>,
    /// Identifiers not bound anywhere inside this file.
    pub unresolved: Vec<Ident>,
}

impl File {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty() && self.imports.is_empty()
    }

    /// Splice a parsed fragment onto the end of this file.
    ///
    /// Declarations, imports and unresolved markers keep their relative
    /// order and are appended after everything already present. This is
    /// the only way a file grows after it was first parsed.
    pub fn merge_fragment(&mut self, fragment: File) {
        self.decls.extend(fragment.decls);
        self.imports.extend(fragment.imports);
        self.unresolved.extend(fragment.unresolved);
    }

    /// Labels of the top-level fields, in first-declaration order.
    pub fn field_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for decl in &self.decls {
            if let Decl::Field(field) = decl {
                if !labels.contains(&field.label.as_str()) {
                    labels.push(&field.label);
                }
            }
        }
        labels
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub alias: Option<String>,
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// The name the import is referenced by: the alias, or the last path
    /// segment.
    pub fn name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Field(Field),
    Let(LetClause),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetClause {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Unify,
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Unify => "&",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Unify => 1,
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Top,
    /// `_|_`, optionally carrying the message it was written with.
    Bottom(Option<String>),
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Kind(Kind),
    Ident(Ident),
    Struct(Vec<Decl>),
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Selector {
        expr: Box<Expr>,
        label: String,
    },
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(label: &str, value: i64) -> Decl {
        Decl::Field(Field {
            label: label.to_string(),
            value: Expr::Int(value),
            span: Span::default(),
        })
    }

    #[test]
    fn merge_fragment_appends_in_order() {
        let mut file = File::new("repl");
        file.decls.push(field("a", 1));

        let mut fragment = File::new("repl");
        fragment.decls.push(field("b", 2));
        fragment.decls.push(field("a", 3));
        fragment.imports.push(ImportSpec {
            alias: None,
            path: "strings".to_string(),
            span: Span::default(),
        });
        fragment.unresolved.push(Ident {
            name: "strings".to_string(),
            span: Span::default(),
        });

        file.merge_fragment(fragment);

        assert_eq!(file.decls, vec![field("a", 1), field("b", 2), field("a", 3)]);
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.unresolved.len(), 1);
        assert_eq!(file.field_labels(), vec!["a", "b"]);
    }

    #[test]
    fn import_name_uses_alias_or_last_segment() {
        let spec = ImportSpec {
            alias: None,
            path: "encoding/json".to_string(),
            span: Span::default(),
        };
        assert_eq!(spec.name(), "json");

        let spec = ImportSpec {
            alias: Some("str".to_string()),
            path: "strings".to_string(),
            span: Span::default(),
        };
        assert_eq!(spec.name(), "str");
    }
}
