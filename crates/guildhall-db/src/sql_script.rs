use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Placeholder for the table prefix inside script files.
pub const PREFIX_PLACEHOLDER: &str = "%PREFIX%";

#[derive(Error, Debug)]
pub enum ScriptParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unterminated string literal starting on line {line}")]
    UnterminatedLiteral { line: usize },

    #[error("unterminated block comment starting on line {line}")]
    UnterminatedComment { line: usize },
}

/// Ordered statements read from a `.sql` file.
///
/// Statements are kept in file order; later ones may depend on earlier ones
/// (tables before their indexes).
#[derive(Debug, Clone)]
pub struct SqlScript {
    name: String,
    statements: Vec<String>,
}

impl SqlScript {
    pub fn from_file(path: &Path, table_prefix: &str) -> Result<Self, ScriptParseError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ScriptParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(name, &contents, table_prefix)
    }

    /// Split `contents` into statements. Comments are dropped, `;` inside
    /// quotes does not end a statement, and `%PREFIX%` becomes `table_prefix`.
    pub fn parse(
        name: impl Into<String>,
        contents: &str,
        table_prefix: &str,
    ) -> Result<Self, ScriptParseError> {
        let name = name.into();
        let statements = split_statements(contents)?
            .into_iter()
            .map(|s| s.replace(PREFIX_PLACEHOLDER, table_prefix))
            .collect::<Vec<_>>();
        debug!("parsed {} statements from {name}", statements.len());
        Ok(Self { name, statements })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

enum State {
    Code,
    Quoted { quote: char, line: usize },
    LineComment,
    BlockComment { line: usize },
}

fn split_statements(contents: &str) -> Result<Vec<String>, ScriptParseError> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Code;
    let mut line = 1;
    let mut at_line_start = true;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '\'' | '"' | '`' => {
                    current.push(c);
                    state = State::Quoted { quote: c, line };
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = State::LineComment;
                }
                '#' if at_line_start => state = State::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment { line };
                }
                ';' => push_statement(&mut statements, &mut current),
                _ => current.push(c),
            },
            State::Quoted { quote, .. } => {
                current.push(c);
                if c == quote {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    current.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment { .. } => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    current.push(' ');
                    state = State::Code;
                }
            }
        }

        if c == '\n' {
            line += 1;
            at_line_start = true;
        } else if !c.is_whitespace() {
            at_line_start = false;
        }
    }

    match state {
        State::Quoted { line, .. } => return Err(ScriptParseError::UnterminatedLiteral { line }),
        State::BlockComment { line } => return Err(ScriptParseError::UnterminatedComment { line }),
        State::Code | State::LineComment => {}
    }

    push_statement(&mut statements, &mut current);
    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}
