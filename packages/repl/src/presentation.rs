//! Turning values into display text, and deciding what to complete.

use lattice_lang::lexer::is_ident_continue;
use lattice_lang::{format, File, FormatError, Value};

use crate::commands::{command_names, PREFIX};

/// Format a value for display.
pub fn render(value: &Value) -> Result<String, FormatError> {
    Ok(format::value(value)?.trim_end().to_string())
}

/// Format a parsed file for display.
pub fn render_file(file: &File) -> Result<String, FormatError> {
    Ok(format::file(file)?.trim_end().to_string())
}

/// The trailing part of `partial` that a completion replaces: the whole
/// command word after `:`, or the identifier being typed.
pub fn completion_fragment(partial: &str) -> &str {
    if is_command_word(partial) {
        return partial.trim_start();
    }
    let start = partial
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_continue(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(partial.len());
    &partial[start..]
}

/// Completion candidates for the text before the cursor.
///
/// Empty input or a partial command word completes to command names.
/// Anything else completes to the current value's top-level labels, which
/// `fields` supplies. `fields` is best effort: when the program does not
/// build it returns nothing, and so does this.
pub fn completion_candidates(partial: &str, fields: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if partial.trim().is_empty() || is_command_word(partial) {
        // Short aliases only once the prefix has been typed.
        let short_ok = is_command_word(partial);
        let typed = partial.trim_start().trim_start_matches(PREFIX);
        return command_names()
            .filter(|name| short_ok || name.len() > 1)
            .filter(|name| name.starts_with(typed))
            .map(|name| format!("{}{}", PREFIX, name))
            .collect();
    }

    let fragment = completion_fragment(partial);
    fields()
        .into_iter()
        .filter(|label| label.starts_with(fragment))
        .collect()
}

/// Whether `partial` is `:` followed by at most a partial command word.
fn is_command_word(partial: &str) -> bool {
    match partial.trim_start().strip_prefix(PREFIX) {
        Some(rest) => !rest.contains(char::is_whitespace),
        None => false,
    }
}
