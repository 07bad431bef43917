use std::sync::{Arc, Mutex};

use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use lattice_lang::lexer::Lexer;
use lattice_lang::token::{Token, TokenKind};

use crate::commands::{find_command, PREFIX};
use crate::input::{STATEMENT_PREFIX, TOGGLE};

/// The line as last drawn. Reedline clears its buffer before reporting
/// Ctrl+C, so this is the only record of what was being edited.
pub type LineBuffer = Arc<Mutex<String>>;

/// Syntax highlighter for the REPL.
///
/// Command lines get the command word colored by whether it is known.
/// Everything else is run through the Lattice lexer; a line that does not
/// lex yet (an open string, say) is shown unstyled.
#[derive(Debug, Default)]
pub struct ReplHighlighter {
    drawn: LineBuffer,
}

impl ReplHighlighter {
    /// A highlighter that copies every line it draws into `drawn`.
    pub fn new(drawn: LineBuffer) -> Self {
        Self { drawn }
    }
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        if let Ok(mut drawn) = self.drawn.lock() {
            drawn.clear();
            drawn.push_str(line);
        }

        let mut styled = StyledText::new();

        if line.is_empty() {
            return styled;
        }

        let body = line.trim_start();
        let indent = &line[..line.len() - body.len()];
        if !indent.is_empty() {
            styled.push((Style::new(), indent.to_string()));
        }

        if body.trim_end() == TOGGLE {
            styled.push((Style::new().bold().fg(Color::Magenta), body.to_string()));
        } else if let Some(rest) = body.strip_prefix(PREFIX) {
            highlight_command(&mut styled, rest);
        } else if let Some(rest) = body.strip_prefix(STATEMENT_PREFIX) {
            styled.push((
                Style::new().bold().fg(Color::Magenta),
                STATEMENT_PREFIX.to_string(),
            ));
            highlight_source(&mut styled, rest);
        } else {
            highlight_source(&mut styled, body);
        }

        styled
    }
}

fn highlight_command(styled: &mut StyledText, rest: &str) {
    let (command, args) = match rest.find(char::is_whitespace) {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };

    let known = find_command(command).is_some();
    let cmd_style = if known || command.is_empty() {
        Style::new().bold().fg(Color::Cyan)
    } else {
        Style::new().fg(Color::Red)
    };
    styled.push((cmd_style, format!("{}{}", PREFIX, command)));

    if !args.is_empty() {
        styled.push((Style::new().fg(Color::Yellow), args.to_string()));
    }
}

fn highlight_source(styled: &mut StyledText, text: &str) {
    let tokens = match Lexer::new("", text).tokenize() {
        Ok(tokens) => tokens,
        Err(_) => {
            styled.push((Style::new(), text.to_string()));
            return;
        }
    };

    if let Some(first) = tokens.first() {
        push_trivia(styled, &text[..first.span.offset]);
    }
    for pair in tokens.windows(2) {
        let (token, next) = (&pair[0], &pair[1]);
        let segment = &text[token.span.offset..next.span.offset];
        let end = lexeme_len(token, segment);
        styled.push((token_style(&token.kind), segment[..end].to_string()));
        push_trivia(styled, &segment[end..]);
    }
}

/// Whitespace and comments between tokens.
fn push_trivia(styled: &mut StyledText, trivia: &str) {
    if trivia.is_empty() {
        return;
    }
    match trivia.find("//") {
        Some(pos) => {
            if pos > 0 {
                styled.push((Style::new(), trivia[..pos].to_string()));
            }
            styled.push((Style::new().fg(Color::DarkGray), trivia[pos..].to_string()));
        }
        None => styled.push((Style::new(), trivia.to_string())),
    }
}

/// Length of the token's own text at the start of `segment`.
fn lexeme_len(token: &Token, segment: &str) -> usize {
    if let TokenKind::Str(_) = token.kind {
        let mut escaped = false;
        for (i, ch) in segment.char_indices().skip(1) {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => return i + 1,
                _ => {}
            }
        }
        return segment.len();
    }
    if token.kind == TokenKind::Slash {
        return 1;
    }
    segment
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(segment.len())
}

fn token_style(kind: &TokenKind) -> Style {
    match kind {
        TokenKind::Str(_) => Style::new().fg(Color::Green),
        TokenKind::Int(_) | TokenKind::Float(_) => Style::new().fg(Color::Yellow),
        TokenKind::KindName(_) => Style::new().fg(Color::Blue),
        TokenKind::True
        | TokenKind::False
        | TokenKind::Null
        | TokenKind::Top
        | TokenKind::Bottom(_) => Style::new().fg(Color::Purple),
        TokenKind::Import | TokenKind::Let => Style::new().bold().fg(Color::Magenta),
        _ => Style::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(line: &str) -> Vec<(Option<Color>, String)> {
        ReplHighlighter::default()
            .highlight(line, 0)
            .buffer
            .into_iter()
            .map(|(style, text)| (style.foreground, text))
            .collect()
    }

    #[test]
    fn highlight_empty_returns_empty() {
        let styled = ReplHighlighter::default().highlight("", 0);
        assert!(styled.buffer.is_empty());
    }

    #[test]
    fn highlight_records_drawn_line() {
        let drawn = LineBuffer::default();
        let highlighter = ReplHighlighter::new(Arc::clone(&drawn));

        highlighter.highlight("a: 1", 4);
        assert_eq!(drawn.lock().unwrap().as_str(), "a: 1");

        highlighter.highlight("", 0);
        assert!(drawn.lock().unwrap().is_empty());
    }

    #[test]
    fn highlight_preserves_text() {
        for line in [
            "a: 1 // one",
            "  b: \"x // y\" + \"z\"",
            ":lookup a.b",
            "= #T: {n: int}",
            "x: 10 / 2",
            "s: \"unterminated",
        ] {
            let joined: String = pieces(line).into_iter().map(|(_, text)| text).collect();
            assert_eq!(joined, line);
        }
    }

    #[test]
    fn highlight_known_command() {
        let styled = pieces(":lookup a.b");
        assert_eq!(styled[0], (Some(Color::Cyan), ":lookup".to_string()));
        assert_eq!(styled[1], (Some(Color::Yellow), " a.b".to_string()));
    }

    #[test]
    fn highlight_unknown_command() {
        let styled = pieces(":frob");
        assert_eq!(styled, vec![(Some(Color::Red), ":frob".to_string())]);
    }

    #[test]
    fn highlight_command_case_insensitive() {
        assert_eq!(pieces(":PRINT")[0].0, Some(Color::Cyan));
    }

    #[test]
    fn highlight_literals() {
        let styled = pieces("a: 1");
        assert!(styled.contains(&(Some(Color::Yellow), "1".to_string())));

        let styled = pieces("b: \"x // y\" // note");
        assert!(styled.contains(&(Some(Color::Green), "\"x // y\"".to_string())));
        assert!(styled.contains(&(Some(Color::DarkGray), "// note".to_string())));

        let styled = pieces("c: int");
        assert!(styled.contains(&(Some(Color::Blue), "int".to_string())));
    }

    #[test]
    fn highlight_division_is_not_a_comment() {
        let styled = pieces("x: 10 / 2");
        assert!(styled.iter().all(|(color, _)| *color != Some(Color::DarkGray)));
        assert!(styled.contains(&(Some(Color::Yellow), "2".to_string())));
    }

    #[test]
    fn highlight_unlexable_line_is_plain() {
        let styled = pieces("s: \"open");
        assert_eq!(styled, vec![(None, "s: \"open".to_string())]);
    }

    #[test]
    fn highlight_toggle() {
        assert_eq!(pieces("\"\"\"")[0].0, Some(Color::Magenta));
    }
}
