use logos::Logos;

use crate::error::{Error, Result};

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,
    // `#` starts a comment that runs to the end of the line
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[regex(r"-?[0-9]+", priority = 3)]
    Int,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", priority = 3)]
    Ident,
    // Anything else that is not whitespace: kept so the executor can report it
    #[regex(r"[^ \t\r\n\f\[\]#]+")]
    Other,

    #[error]
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub col: usize,
}

pub fn lex(input: &str) -> Result<Vec<Token>> {
    let mut lex = TokenKind::lexer(input);
    // Precompute line starts for line/col mapping
    let mut line_starts: Vec<usize> = vec![0];
    for (i, ch) in input.char_indices() {
        if ch == '\n' {
            line_starts.push(i + 1);
        }
    }
    let find_line_col = |start: usize| -> (usize, usize) {
        // greatest line start <= start
        let idx = match line_starts.binary_search(&start) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (idx + 1, start - line_starts[idx] + 1)
    };
    let mut tokens = Vec::new();
    while let Some(kind) = lex.next() {
        let text = lex.slice().to_string();
        let (line, col) = find_line_col(lex.span().start);
        if matches!(kind, TokenKind::Error) {
            return Err(Error::Syntax {
                line,
                message: format!("unexpected character at col {} near '{}'", col, text),
            });
        }
        tokens.push(Token {
            kind,
            text,
            line,
            col,
        });
    }
    Ok(tokens)
}
