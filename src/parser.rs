use std::fmt;

use crate::error::{Error, Result};
use crate::lexer::{self, Token, TokenKind};

/// A command argument, resolved against the environment only when the
/// command executes.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Name(String),
    Other(String),
}

impl Operand {
    fn from_token(tok: &Token) -> Operand {
        match tok.kind {
            TokenKind::Int => match tok.text.parse::<i64>() {
                Ok(v) => Operand::Int(v),
                Err(_) => Operand::Other(tok.text.clone()),
            },
            TokenKind::Ident => Operand::Name(tok.text.clone()),
            _ => Operand::Other(tok.text.clone()),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "{}", v),
            Operand::Name(s) | Operand::Other(s) => f.write_str(s),
        }
    }
}

/// Why a recognized command could not be built. Reported when the command
/// executes, not when the program loads.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    Arity { expected: usize, found: usize },
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetVar(String, i64),
    Forward(Operand),
    Left(Operand),
    Right(Operand),
    Up(Operand),
    Down(Operand),
    RollCw(Operand),
    RollCcw(Operand),
    PenUp,
    PenDown,
    Add(String, Operand),
    Reset,
    Repeat(Operand, Vec<Command>),
    Malformed { tag: String, fault: Fault },
    Unknown(Vec<String>),
}

impl Command {
    pub fn kind_name(&self) -> &str {
        match self {
            Command::SetVar(..) => "set",
            Command::Forward(_) => "forward",
            Command::Left(_) => "left",
            Command::Right(_) => "right",
            Command::Up(_) => "up",
            Command::Down(_) => "down",
            Command::RollCw(_) => "roll_cw",
            Command::RollCcw(_) => "roll_ccw",
            Command::PenUp => "penup",
            Command::PenDown => "pendown",
            Command::Add(..) => "add",
            Command::Reset => "reset",
            Command::Repeat(..) => "repeat",
            Command::Malformed { tag, .. } => tag.as_str(),
            Command::Unknown(raw) => raw.first().map(String::as_str).unwrap_or(""),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetVar(name, v) => write!(f, "set {} {}", name, v),
            Command::Add(name, delta) => write!(f, "add {} {}", name, delta),
            Command::Forward(x)
            | Command::Left(x)
            | Command::Right(x)
            | Command::Up(x)
            | Command::Down(x)
            | Command::RollCw(x)
            | Command::RollCcw(x) => write!(f, "{} {}", self.kind_name(), x),
            Command::Repeat(count, body) => {
                write!(f, "repeat {} [ {} command(s) ]", count, body.len())
            }
            Command::Unknown(raw) => f.write_str(&raw.join(" ")),
            _ => f.write_str(self.kind_name()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub commands: Vec<Command>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Lex and parse program source in one go.
pub fn load_str(src: &str) -> Result<Program> {
    parse(lexer::lex(src)?)
}

pub fn parse(tokens: Vec<Token>) -> Result<Program> {
    // One command per source line
    let mut lines: Vec<Vec<Token>> = Vec::new();
    for tok in tokens {
        match lines.last_mut() {
            Some(line) if line[0].line == tok.line => line.push(tok),
            _ => lines.push(vec![tok]),
        }
    }
    let mut p = Parser { lines, pos: 0 };
    let commands = p.parse_block(None)?;
    Ok(Program { commands })
}

struct Parser {
    lines: Vec<Vec<Token>>,
    pos: usize,
}

impl Parser {
    fn bump(&mut self) -> Option<Vec<Token>> {
        let line = self.lines.get(self.pos).cloned();
        self.pos += 1;
        line
    }

    // Collect commands until the `]` closing the repeat opened at `opened_at`,
    // or until end of input at top level.
    fn parse_block(&mut self, opened_at: Option<usize>) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        while let Some(line) = self.bump() {
            let head = &line[0];
            match head.kind {
                // only a lone `]` closes; anything else on the line is a command
                TokenKind::RBracket if line.len() == 1 && opened_at.is_some() => {
                    return Ok(commands);
                }
                TokenKind::Ident if head.text.eq_ignore_ascii_case("repeat") => {
                    let count = repeat_header(&line)?;
                    let body = self.parse_block(Some(head.line))?;
                    commands.push(Command::Repeat(count, body));
                }
                _ => commands.push(command_line(&line)),
            }
        }
        match opened_at {
            Some(line) => Err(Error::Syntax {
                line,
                message: "no closing ']' found for repeat block".to_string(),
            }),
            None => Ok(commands),
        }
    }
}

fn repeat_header(line: &[Token]) -> Result<Operand> {
    let at = line[0].line;
    let count = match line.get(1) {
        Some(tok) if matches!(tok.kind, TokenKind::Int | TokenKind::Ident) => {
            match Operand::from_token(tok) {
                Operand::Other(text) => {
                    return Err(Error::Syntax {
                        line: at,
                        message: format!("repeat count '{}' is out of range", text),
                    })
                }
                op => op,
            }
        }
        Some(tok) => {
            return Err(Error::Syntax {
                line: at,
                message: format!(
                    "repeat count must be an integer or variable name, got '{}'",
                    tok.text
                ),
            })
        }
        None => {
            return Err(Error::Syntax {
                line: at,
                message: "repeat needs a count".to_string(),
            })
        }
    };
    if !matches!(line.get(2).map(|t| &t.kind), Some(TokenKind::LBracket)) {
        return Err(Error::Syntax {
            line: at,
            message: "repeat block must start with '['".to_string(),
        });
    }
    if let Some(extra) = line.get(3) {
        return Err(Error::Syntax {
            line: at,
            message: format!("unexpected '{}' after '['", extra.text),
        });
    }
    Ok(count)
}

// Brackets off a repeat line are plain operands; bad arguments surface when
// the command runs.
fn command_line(line: &[Token]) -> Command {
    let tag = line[0].text.to_ascii_lowercase();
    let args: Vec<Operand> = line[1..].iter().map(Operand::from_token).collect();

    let arity = |expected: usize| -> Option<Command> {
        if args.len() == expected {
            None
        } else {
            Some(Command::Malformed {
                tag: tag.clone(),
                fault: Fault::Arity {
                    expected,
                    found: args.len(),
                },
            })
        }
    };
    let invalid = |op: &Operand| Command::Malformed {
        tag: tag.clone(),
        fault: Fault::Invalid(op.to_string()),
    };

    match tag.as_str() {
        "penup" | "pendown" | "reset" => arity(0).unwrap_or(match tag.as_str() {
            "penup" => Command::PenUp,
            "pendown" => Command::PenDown,
            _ => Command::Reset,
        }),
        "forward" | "left" | "right" | "up" | "down" | "roll_cw" | "roll_ccw" => {
            if let Some(bad) = arity(1) {
                return bad;
            }
            let x = args[0].clone();
            match tag.as_str() {
                "forward" => Command::Forward(x),
                "left" => Command::Left(x),
                "right" => Command::Right(x),
                "up" => Command::Up(x),
                "down" => Command::Down(x),
                "roll_cw" => Command::RollCw(x),
                _ => Command::RollCcw(x),
            }
        }
        "set" => {
            if let Some(bad) = arity(2) {
                return bad;
            }
            match (&args[0], &args[1]) {
                (Operand::Name(name), Operand::Int(v)) => Command::SetVar(name.clone(), *v),
                (Operand::Name(_), other) => invalid(other),
                (other, _) => invalid(other),
            }
        }
        "add" => {
            if let Some(bad) = arity(2) {
                return bad;
            }
            match &args[0] {
                Operand::Name(name) => Command::Add(name.clone(), args[1].clone()),
                other => invalid(other),
            }
        }
        _ => Command::Unknown(line.iter().map(|t| t.text.clone()).collect()),
    }
}
