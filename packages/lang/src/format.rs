//! Rendering values and syntax back to Lattice source.
//!
//! Output of [`value`] parses back with [`crate::parse_file`] (for structs)
//! or [`crate::parse_expr`] (for anything else) to an equal value, except
//! that error messages inside lists are dropped.

use crate::ast::{BinaryOp, Decl, Expr, File, ImportSpec, UnaryOp};
use crate::error::FormatError;
use crate::lexer::is_identifier;
use crate::value::{format_float, Value};

const POSTFIX: u8 = 8;
const UNARY: u8 = 7;

/// Format an evaluated value. A struct at the top level renders as a list of
/// declarations without surrounding braces.
pub fn value(value: &Value) -> Result<String, FormatError> {
    let mut out = String::new();
    match value {
        Value::Struct(fields) => write_fields(&mut out, fields, 0)?,
        other => write_value(&mut out, other, 0, true)?,
    }
    Ok(out)
}

/// Format a parsed file: imports first, then declarations in source order.
pub fn file(file: &File) -> Result<String, FormatError> {
    let mut lines = Vec::with_capacity(file.imports.len() + file.decls.len());
    for import in &file.imports {
        lines.push(format_import(import));
    }
    for decl in &file.decls {
        let mut out = String::new();
        write_decl(&mut out, decl, 0)?;
        lines.push(out);
    }
    Ok(lines.join("\n"))
}

/// Quote `label` unless it can be written as a bare identifier.
pub fn label(label: &str) -> String {
    if is_identifier(label) {
        label.to_string()
    } else {
        quote(label)
    }
}

pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn float(n: f64) -> Result<String, FormatError> {
    if n.is_finite() {
        Ok(format_float(n))
    } else {
        Err(FormatError::Unrepresentable {
            what: format!("non-finite float {}", n),
        })
    }
}

fn write_fields(out: &mut String, fields: &[(String, Value)], depth: usize) -> Result<(), FormatError> {
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        indent(out, depth);
        out.push_str(&label(name));
        out.push_str(": ");
        write_value(out, value, depth, true)?;
    }
    Ok(())
}

/// `line_end` is set when nothing follows the value on its line, so an
/// error message can be kept as a trailing comment.
fn write_value(out: &mut String, value: &Value, depth: usize, line_end: bool) -> Result<(), FormatError> {
    match value {
        Value::Top => out.push('_'),
        Value::Bottom(message) if line_end && !message.trim().is_empty() => {
            out.push_str("_|_ // ");
            out.push_str(&message.replace('\n', " "));
        }
        Value::Bottom(_) => out.push_str("_|_"),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => out.push_str(&int(*n)),
        Value::Float(n) => out.push_str(&float(*n)?),
        Value::String(s) => out.push_str(&quote(s)),
        Value::Kind(kind) => out.push_str(kind.keyword()),
        Value::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, depth, false)?;
            }
            out.push(']');
        }
        Value::Struct(fields) if fields.is_empty() => out.push_str("{}"),
        Value::Struct(fields) => {
            out.push_str("{\n");
            write_fields(out, fields, depth + 1)?;
            out.push('\n');
            indent(out, depth);
            out.push('}');
        }
    }
    Ok(())
}

fn format_import(import: &ImportSpec) -> String {
    match &import.alias {
        Some(alias) => format!("import {} {}", alias, quote(&import.path)),
        None => format!("import {}", quote(&import.path)),
    }
}

fn write_decl(out: &mut String, decl: &Decl, depth: usize) -> Result<(), FormatError> {
    indent(out, depth);
    match decl {
        Decl::Field(field) => {
            out.push_str(&label(&field.label));
            out.push_str(": ");
            if let Expr::Bottom(Some(message)) = &field.value {
                out.push_str("_|_ // ");
                out.push_str(message);
                return Ok(());
            }
            write_expr(out, &field.value, depth, 0)
        }
        Decl::Let(clause) => {
            out.push_str("let ");
            out.push_str(&clause.name);
            out.push_str(" = ");
            write_expr(out, &clause.value, depth, 0)
        }
    }
}

/// Write `expr`, parenthesized if it binds looser than `parent`.
fn write_expr(out: &mut String, expr: &Expr, depth: usize, parent: u8) -> Result<(), FormatError> {
    match expr {
        Expr::Top => out.push('_'),
        Expr::Bottom(_) => out.push_str("_|_"),
        Expr::Null => out.push_str("null"),
        Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Int(n) => out.push_str(&int(*n)),
        Expr::Float(n) => out.push_str(&float(*n)?),
        Expr::Str(s) => out.push_str(&quote(s)),
        Expr::Kind(kind) => out.push_str(kind.keyword()),
        Expr::Ident(ident) => out.push_str(&ident.name),
        Expr::Struct(decls) if decls.is_empty() => out.push_str("{}"),
        Expr::Struct(decls) => {
            out.push_str("{\n");
            for decl in decls {
                write_decl(out, decl, depth + 1)?;
                out.push('\n');
            }
            indent(out, depth);
            out.push('}');
        }
        Expr::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, item, depth, 0)?;
            }
            out.push(']');
        }
        Expr::Unary { op, expr } => {
            out.push_str(match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            });
            write_expr(out, expr, depth, UNARY)?;
        }
        Expr::Binary { op, lhs, rhs } => {
            let precedence = op.precedence();
            let parens = precedence < parent;
            if parens {
                out.push('(');
            }
            write_expr(out, lhs, depth, precedence)?;
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(out, rhs, depth, right_precedence(*op))?;
            if parens {
                out.push(')');
            }
        }
        Expr::Selector { expr, label: name } => {
            write_expr(out, expr, depth, POSTFIX)?;
            out.push('.');
            out.push_str(&label(name));
        }
        Expr::Index { expr, index } => {
            write_expr(out, expr, depth, POSTFIX)?;
            out.push('[');
            write_expr(out, index, depth, 0)?;
            out.push(']');
        }
        Expr::Call { func, args } => {
            write_expr(out, func, depth, POSTFIX)?;
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, depth, 0)?;
            }
            out.push(')');
        }
    }
    Ok(())
}

/// The magnitude of `i64::MIN` is not a valid literal, so it is written as
/// an expression.
fn int(n: i64) -> String {
    if n == i64::MIN {
        format!("(-{} - 1)", i64::MAX)
    } else {
        n.to_string()
    }
}

/// Operators are left associative, so an equal-precedence right operand
/// needs parentheses.
fn right_precedence(op: BinaryOp) -> u8 {
    op.precedence() + 1
}
