//! Structured diagnostics for every stage of the pipeline.
//!
//! Errors come in four cases: lexer, parser, runtime, and unknown. Each
//! exposes `message` (short, user-facing), `hint` (a longer contextual
//! explanation where one exists), and `suggestion` (a fuzzy match against
//! the names that would have been valid). Import failures wrap the inner
//! error together with the file that raised it so hosts can walk the chain
//! back to the offending source.

use std::{
    error::Error,
    fmt,
    path::{Path, PathBuf},
};

use crate::lexer::{InfixOp, SourceRange, Token, TokenKind};

/// What went wrong during scanning.
#[derive(Debug, Clone, PartialEq)]
pub enum LexerErrorKind {
    InvalidNumber(String),
    InvalidColor(String),
    UnterminatedString,
    InvalidEscape(String),
    UnexpectedToken(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub range: SourceRange,
}

impl LexerError {
    #[must_use]
    pub fn new(kind: LexerErrorKind, range: SourceRange) -> Self {
        Self { kind, range }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            LexerErrorKind::InvalidNumber(text) => format!("Invalid numeric literal '{text}'"),
            LexerErrorKind::InvalidColor(text) => format!("Invalid color literal '{text}'"),
            LexerErrorKind::UnterminatedString => "Unterminated string literal".to_owned(),
            LexerErrorKind::InvalidEscape(text) => format!("Invalid escape sequence '{text}'"),
            LexerErrorKind::UnexpectedToken(text) => format!("Unexpected token '{text}'"),
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match &self.kind {
            LexerErrorKind::InvalidColor(_) => {
                Some("Color literals are a '#' followed by 3, 4, 6, or 8 hex digits.".to_owned())
            }
            LexerErrorKind::UnterminatedString => {
                Some("Strings must be closed with a '\"' before the end of the line.".to_owned())
            }
            LexerErrorKind::InvalidEscape(_) => {
                Some("Supported escape sequences are \\\", \\\\, and \\n.".to_owned())
            }
            _ => None,
        }
    }
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl Error for LexerError {}

/// A token the parser could not place, with what it wanted instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub token: Token,
    pub expected: Option<String>,
}

impl ParserError {
    #[must_use]
    pub fn unexpected_token(token: Token, expected: Option<&str>) -> Self {
        Self {
            token,
            expected: expected.map(str::to_owned),
        }
    }

    #[must_use]
    pub fn range(&self) -> SourceRange {
        self.token.range.clone()
    }

    #[must_use]
    pub fn message(&self) -> String {
        match &self.expected {
            Some(expected) => format!("Unexpected {}, expected {expected}", self.token.kind.description()),
            None => format!("Unexpected {}", self.token.kind.description()),
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match &self.token.kind {
            TokenKind::Eof => Some("The file ended before the statement was complete.".to_owned()),
            TokenKind::RBrace => Some("There may be a missing opening brace earlier in the file.".to_owned()),
            _ => None,
        }
    }

    /// When an identifier turned up where an operator was wanted, suggest
    /// the closest operator spelling.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        if self.expected.as_deref() != Some("operator") {
            return None;
        }
        let TokenKind::Identifier(name) = &self.token.kind else {
            return None;
        };
        let spellings: Vec<String> = InfixOp::ALL.iter().map(ToString::to_string).collect();
        best_match(name, spellings.iter().map(String::as_str))
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl Error for ParserError {}

/// What went wrong during evaluation.
#[derive(Debug, Clone)]
pub enum RuntimeErrorKind {
    UnknownSymbol {
        name: String,
        options: Vec<String>,
    },
    UnknownMember {
        name: String,
        of_type: String,
        options: Vec<String>,
    },
    UnknownFont {
        name: String,
        options: Vec<String>,
    },
    TypeMismatch {
        for_name: String,
        index: usize,
        expected: String,
        got: String,
    },
    UnexpectedArgument {
        for_name: String,
        max: usize,
    },
    MissingArgument {
        for_name: String,
        index: usize,
        expected: String,
    },
    UnusedValue {
        of_type: String,
    },
    AssertionFailure {
        message: String,
    },
    FileNotFound {
        for_name: String,
        at: Option<PathBuf>,
    },
    FileAccessRestricted {
        for_name: String,
        at: PathBuf,
    },
    FileTypeMismatch {
        for_name: String,
        at: PathBuf,
        expected: String,
    },
    FileParsingError {
        for_name: String,
        at: PathBuf,
        message: String,
    },
    CircularImport {
        at: PathBuf,
    },
    ImportError {
        inner: Box<ProgramError>,
        url: PathBuf,
        source: String,
    },
}

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub range: SourceRange,
}

impl RuntimeError {
    #[must_use]
    pub fn new(kind: RuntimeErrorKind, range: SourceRange) -> Self {
        Self { kind, range }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            RuntimeErrorKind::UnknownSymbol { name, .. } => format!("Unknown symbol '{name}'"),
            RuntimeErrorKind::UnknownMember { name, of_type, .. } => {
                format!("Unknown {of_type} member property '{name}'")
            }
            RuntimeErrorKind::UnknownFont { name, .. } => {
                if name.is_empty() {
                    "Font name cannot be blank".to_owned()
                } else {
                    format!("Unknown font '{name}'")
                }
            }
            RuntimeErrorKind::TypeMismatch {
                for_name,
                index,
                expected,
                got,
            } => {
                if *index == 0 {
                    format!("The argument for {for_name} should be a {expected}, not a {got}.")
                } else {
                    format!(
                        "The {} argument for {for_name} should be a {expected}, not a {got}.",
                        ordinal(*index)
                    )
                }
            }
            RuntimeErrorKind::UnexpectedArgument { for_name, max } => {
                if *max == 0 {
                    format!("Unexpected argument for {for_name}")
                } else {
                    format!("Unexpected argument for {for_name}, expected a maximum of {max}")
                }
            }
            RuntimeErrorKind::MissingArgument {
                for_name,
                index,
                expected,
            } => {
                if *index == 0 {
                    format!("Missing argument for {for_name}, expected a {expected}")
                } else {
                    format!(
                        "Missing {} argument for {for_name}, expected a {expected}",
                        ordinal(*index)
                    )
                }
            }
            RuntimeErrorKind::UnusedValue { of_type } => format!("Unused {of_type} value"),
            RuntimeErrorKind::AssertionFailure { message } => format!("Assertion failure: {message}"),
            RuntimeErrorKind::FileNotFound { for_name, .. } => {
                format!("File '{for_name}' not found")
            }
            RuntimeErrorKind::FileAccessRestricted { for_name, .. } => {
                format!("Unable to access file '{for_name}'")
            }
            RuntimeErrorKind::FileTypeMismatch { for_name, .. } => {
                format!("Unsupported file type '{for_name}'")
            }
            RuntimeErrorKind::FileParsingError { for_name, .. } => {
                format!("Unable to parse file '{for_name}'")
            }
            RuntimeErrorKind::CircularImport { .. } => "Circular import".to_owned(),
            RuntimeErrorKind::ImportError { inner, url, .. } => {
                if is_shape_file(url) {
                    format!(
                        "Error in imported file '{}': {}",
                        file_name(url),
                        inner.message()
                    )
                } else {
                    inner.message()
                }
            }
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match &self.kind {
            RuntimeErrorKind::UnknownSymbol { name, .. } => Some(format!(
                "The symbol '{name}' is not defined in this scope. It may be misspelled, or not available here."
            )),
            RuntimeErrorKind::UnknownMember { name, of_type, .. } => {
                Some(format!("A {of_type} value has no member named '{name}'."))
            }
            RuntimeErrorKind::UnknownFont { name, .. } if name.is_empty() => None,
            RuntimeErrorKind::UnknownFont { .. } => {
                Some("The font may be misspelled, or not installed on this system.".to_owned())
            }
            RuntimeErrorKind::UnusedValue { .. } => {
                Some("A value was produced here that the enclosing block cannot use.".to_owned())
            }
            RuntimeErrorKind::FileAccessRestricted { at, .. } => Some(format!(
                "The file at '{}' exists but cannot be read. Its permissions may be too restrictive.",
                at.display()
            )),
            RuntimeErrorKind::FileNotFound { at: Some(at), .. } => {
                Some(format!("No file was found at '{}'.", at.display()))
            }
            RuntimeErrorKind::FileParsingError { message, .. } => Some(message.clone()),
            RuntimeErrorKind::CircularImport { at } => Some(format!(
                "The file '{}' is already being imported; importing it again would never terminate.",
                file_name(at)
            )),
            RuntimeErrorKind::ImportError { inner, .. } => inner.hint(),
            _ => None,
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match &self.kind {
            RuntimeErrorKind::UnknownSymbol { name, options }
            | RuntimeErrorKind::UnknownMember { name, options, .. }
            | RuntimeErrorKind::UnknownFont { name, options } => {
                best_match(name, options.iter().map(String::as_str))
            }
            RuntimeErrorKind::ImportError { inner, .. } => inner.suggestion(),
            _ => None,
        }
    }

    /// For an import wrapper, the innermost wrapped error; `None` for any
    /// other kind.
    #[must_use]
    pub fn underlying_error(&self) -> Option<&ProgramError> {
        let RuntimeErrorKind::ImportError { inner, .. } = &self.kind else {
            return None;
        };
        Some(inner.underlying_error())
    }

    /// The innermost imported source file that contained the error, if the
    /// error crossed an import boundary.
    #[must_use]
    pub fn shape_file_url(&self) -> Option<&Path> {
        match &self.kind {
            RuntimeErrorKind::ImportError { inner, url, .. } => {
                let deeper = match inner.as_ref() {
                    ProgramError::Runtime(inner) => inner.shape_file_url(),
                    _ => None,
                };
                deeper.or_else(|| is_shape_file(url).then_some(url.as_path()))
            }
            _ => None,
        }
    }

    /// The file URL to offer in a permission-grant UI, for access errors.
    #[must_use]
    pub fn access_error_url(&self) -> Option<&Path> {
        match &self.kind {
            RuntimeErrorKind::FileAccessRestricted { at, .. } => Some(at),
            RuntimeErrorKind::ImportError { inner, .. } => match inner.as_ref() {
                ProgramError::Runtime(inner) => inner.access_error_url(),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl Error for RuntimeError {}

fn is_shape_file(url: &Path) -> bool {
    url.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("shape"))
}

fn file_name(url: &Path) -> String {
    url.file_name().map_or_else(
        || url.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn ordinal(index: usize) -> &'static str {
    match index {
        0 => "first",
        1 => "second",
        2 => "third",
        3 => "fourth",
        4 => "fifth",
        5 => "sixth",
        6 => "seventh",
        7 => "eighth",
        8 => "ninth",
        _ => "last",
    }
}

/// Any error the public API can produce.
#[derive(Debug, Clone)]
pub enum ProgramError {
    Lexer(LexerError),
    Parser(ParserError),
    Runtime(RuntimeError),
    Unknown,
}

impl ProgramError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Lexer(e) => e.message(),
            Self::Parser(e) => e.message(),
            Self::Runtime(e) => e.message(),
            Self::Unknown => "Unknown error".to_owned(),
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Lexer(e) => e.hint(),
            Self::Parser(e) => e.hint(),
            Self::Runtime(e) => e.hint(),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Lexer(_) | Self::Unknown => None,
            Self::Parser(e) => e.suggestion(),
            Self::Runtime(e) => e.suggestion(),
        }
    }

    #[must_use]
    pub fn range(&self) -> SourceRange {
        match self {
            Self::Lexer(e) => e.range.clone(),
            Self::Parser(e) => e.range(),
            Self::Runtime(e) => e.range.clone(),
            Self::Unknown => 0..0,
        }
    }

    /// Unwraps import wrappers to the innermost cause.
    #[must_use]
    pub fn underlying_error(&self) -> &Self {
        let mut current = self;
        while let Self::Runtime(RuntimeError {
            kind: RuntimeErrorKind::ImportError { inner, .. },
            ..
        }) = current
        {
            current = inner;
        }
        current
    }

    /// Renders the error against the line of source its range points into.
    #[must_use]
    pub fn annotate(&self, source: &str) -> String {
        let range = self.range();
        let mut output = self.message();
        if let Some(hint) = self.hint() {
            output.push('\n');
            output.push_str(&hint);
        }
        if let Some(suggestion) = self.suggestion() {
            output.push_str(&format!("\nDid you mean '{suggestion}'?"));
        }
        if let Some(line) = source_line(source, range.start) {
            output.push('\n');
            output.push_str(line);
        }
        output
    }
}

fn source_line(source: &str, offset: usize) -> Option<&str> {
    if offset > source.len() {
        return None;
    }
    let start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
    Some(&source[start..end])
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl Error for ProgramError {}

impl From<LexerError> for ProgramError {
    fn from(error: LexerError) -> Self {
        Self::Lexer(error)
    }
}

impl From<ParserError> for ProgramError {
    fn from(error: ParserError) -> Self {
        Self::Parser(error)
    }
}

impl From<RuntimeError> for ProgramError {
    fn from(error: RuntimeError) -> Self {
        Self::Runtime(error)
    }
}

/// Evaluation control flow: either a real error or the private
/// cancellation sentinel that only the outermost evaluate swallows.
#[derive(Debug)]
pub(crate) enum EvalInterrupt {
    Cancelled,
    Error(Box<RuntimeError>),
}

pub(crate) type EvalResult<T> = Result<T, EvalInterrupt>;

impl From<RuntimeError> for EvalInterrupt {
    fn from(error: RuntimeError) -> Self {
        Self::Error(Box::new(error))
    }
}

/// Known synonyms that beat edit distance: a user writing `box` wants
/// `cube` even though `cube` is three edits away.
const ALTERNATIVES: &[(&str, &str)] = &[
    ("box", "cube"),
    ("rect", "square"),
    ("rectangle", "square"),
    ("ellipse", "circle"),
    ("oval", "circle"),
    ("subtract", "difference"),
    ("subtraction", "difference"),
    ("merge", "union"),
    ("add", "union"),
    ("intersect", "intersection"),
    ("colour", "color"),
    ("color", "colour"),
    ("move", "translate"),
    ("offset", "translate"),
    ("spin", "rotate"),
    ("grow", "scale"),
    ("random", "rnd"),
    ("rand", "rnd"),
    ("==", "="),
    ("!=", "<>"),
];

/// Picks the closest candidate to `name`, preferring the fixed synonym
/// table when its target is actually available.
pub(crate) fn best_match<'a>(name: &str, options: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let options: Vec<&str> = options.into_iter().collect();
    if let Some((_, replacement)) = ALTERNATIVES.iter().find(|(from, _)| *from == name)
        && options.contains(replacement)
    {
        return Some((*replacement).to_owned());
    }
    let lowercase = name.to_ascii_lowercase();
    let threshold = (name.len() / 2).max(1);
    options
        .iter()
        .map(|option| (edit_distance(&lowercase, &option.to_ascii_lowercase()), *option))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, option)| option.to_owned())
}

/// Levenshtein distance over unicode scalars.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut previous = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous + usize::from(ca != cb);
            previous = row[j + 1];
            row[j + 1] = substitution.min(previous + 1).min(row[j] + 1);
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("cube", "cube"), 0);
        assert_eq!(edit_distance("cuube", "cube"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn best_match_prefers_close_names() {
        let options = ["cube", "sphere", "cylinder"];
        assert_eq!(best_match("cuube", options).as_deref(), Some("cube"));
        assert_eq!(best_match("spere", options).as_deref(), Some("sphere"));
        assert_eq!(best_match("zzzzz", options), None);
    }

    #[test]
    fn best_match_uses_alternatives_table() {
        let options = ["cube", "sphere"];
        assert_eq!(best_match("box", options).as_deref(), Some("cube"));
        // The table only applies when the target is actually available.
        assert_eq!(best_match("box", ["circle"]), None);
    }

    #[test]
    fn unknown_symbol_suggestion() {
        let error = RuntimeError::new(
            RuntimeErrorKind::UnknownSymbol {
                name: "cuube".to_owned(),
                options: vec!["cube".to_owned(), "sphere".to_owned()],
            },
            0..5,
        );
        assert_eq!(error.suggestion().as_deref(), Some("cube"));
    }
}
