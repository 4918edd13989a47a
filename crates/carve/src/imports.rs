//! The host delegate and the module import system.
//!
//! Imports resolve through the delegate, are cycle-checked against the
//! stack of files currently being imported, and cache per evaluation:
//! parsed programs for `.shape`, strings for `.txt`, values for `.json`,
//! and geometry for everything the host loader understands. Every error
//! raised inside an imported file is wrapped with the file's URL and
//! source so hosts can walk back to the offending file.

use std::{
    cell::RefCell,
    io,
    path::{Path, PathBuf},
    rc::Rc,
};

use carve_geom::Geometry;

use crate::{
    ast::Program,
    context::EvaluationContext,
    errors::{EvalInterrupt, EvalResult, ProgramError, RuntimeError, RuntimeErrorKind},
    eval,
    lexer::SourceRange,
    parser,
    value::Value,
};

/// Host services the evaluator depends on.
///
/// Every method has a sensible default, so `struct MyDelegate;` with an
/// empty impl is a working file-system-backed host.
pub trait ImportDelegate {
    /// Maps a logical path to a concrete URL, relative to the importing
    /// file when one is known.
    fn resolve_url(&self, name: &str, relative_to: Option<&Path>) -> PathBuf {
        match relative_to.and_then(Path::parent) {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Reads a source or text file.
    fn load_text(&self, url: &Path) -> io::Result<String> {
        std::fs::read_to_string(url)
    }

    /// Loads a model file. `Ok(None)` means the format is not recognised,
    /// which the evaluator reports as a file-type mismatch.
    fn import_geometry(&self, url: &Path) -> io::Result<Option<Geometry>> {
        let _ = url;
        Ok(None)
    }

    /// Receives the values passed to `print`.
    fn debug_log(&self, values: &[Value]) {
        let _ = values;
    }

    /// The fonts available to `font`/`text`. An empty list disables
    /// validation.
    fn font_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// The do-nothing delegate: file-system reads, no geometry loader, print
/// output dropped.
#[derive(Debug, Default)]
pub struct FileSystemDelegate;

impl ImportDelegate for FileSystemDelegate {}

/// A delegate that collects `print` output, for tests and tooling.
#[derive(Debug, Default)]
pub struct CollectLog {
    entries: RefCell<Vec<Vec<Value>>>,
}

impl CollectLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `print` call's values, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<Vec<Value>> {
        self.entries.borrow().clone()
    }

    /// Each `print` call formatted as one line.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|values| {
                values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl ImportDelegate for CollectLog {
    fn debug_log(&self, values: &[Value]) {
        self.entries.borrow_mut().push(values.to_vec());
    }
}

/// One cached import.
#[derive(Debug, Clone)]
pub(crate) enum ImportEntry {
    Program(Rc<Program>),
    Text(String),
    Value(Value),
    Geometry(Box<Geometry>),
}

/// Runs an `import` statement: resolves, cycle-checks, dispatches by
/// extension. Returns the imported value; `.shape` files evaluate into
/// the current context and return void.
pub(crate) fn import(
    ctx: &mut EvaluationContext<'_>,
    path: &str,
    range: &SourceRange,
) -> EvalResult<Value> {
    let url = ctx.delegate.resolve_url(path, ctx.base_url.as_deref());
    if ctx.import_stack.borrow().contains(&url) {
        return Err(RuntimeError::new(
            RuntimeErrorKind::CircularImport { at: url },
            range.clone(),
        )
        .into());
    }
    let extension = url
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "shape" => import_shape(ctx, path, &url, range).map(|()| Value::void()),
        "txt" => {
            if let Some(ImportEntry::Text(text)) = cached(ctx, &url) {
                return Ok(Value::String(text));
            }
            let text = read_text(ctx, path, &url, range)?;
            cache(ctx, &url, ImportEntry::Text(text.clone()));
            Ok(Value::String(text))
        }
        "json" => {
            if let Some(ImportEntry::Value(value)) = cached(ctx, &url) {
                return Ok(value);
            }
            let text = read_text(ctx, path, &url, range)?;
            let json: serde_json::Value = serde_json::from_str(&text).map_err(|error| {
                RuntimeError::new(
                    RuntimeErrorKind::FileParsingError {
                        for_name: path.to_owned(),
                        at: url.clone(),
                        message: error.to_string(),
                    },
                    range.clone(),
                )
            })?;
            let value = json_to_value(json);
            cache(ctx, &url, ImportEntry::Value(value.clone()));
            Ok(value)
        }
        _ => import_model(ctx, path, &url, range),
    }
}

/// Parses (with caching) and evaluates a `.shape` file in the current
/// context, with the base URL and source swapped to the imported file.
fn import_shape(
    ctx: &mut EvaluationContext<'_>,
    path: &str,
    url: &Path,
    range: &SourceRange,
) -> EvalResult<()> {
    let program = match cached(ctx, url) {
        Some(ImportEntry::Program(program)) => program,
        _ => {
            let text = read_text(ctx, path, url, range)?;
            let program = match parser::parse(&text) {
                Ok(program) => Rc::new(program),
                Err(inner) => {
                    return Err(wrap_import_error(inner, url, &text, range));
                }
            };
            cache(ctx, url, ImportEntry::Program(Rc::clone(&program)));
            program
        }
    };

    ctx.import_stack.borrow_mut().push(url.to_path_buf());
    let saved_url = ctx.base_url.replace(url.to_path_buf());
    let saved_source = std::mem::replace(&mut ctx.source, program.source.as_str().into());

    let result = eval::run_statements(ctx, &program.statements, true);

    ctx.base_url = saved_url;
    ctx.source = saved_source;
    ctx.import_stack.borrow_mut().pop();

    match result {
        Ok(()) => Ok(()),
        // Cancellation passes through unwrapped; only real errors pick up
        // the import frame.
        Err(EvalInterrupt::Cancelled) => Err(EvalInterrupt::Cancelled),
        Err(EvalInterrupt::Error(inner)) => {
            Err(wrap_import_error(ProgramError::Runtime(*inner), url, &program.source, range))
        }
    }
}

fn import_model(
    ctx: &mut EvaluationContext<'_>,
    path: &str,
    url: &Path,
    range: &SourceRange,
) -> EvalResult<Value> {
    if let Some(ImportEntry::Geometry(geometry)) = cached(ctx, url) {
        return Ok(Value::Mesh(attach(*geometry, ctx, range)));
    }
    let loaded = ctx
        .delegate
        .import_geometry(url)
        .map_err(|error| io_error(&error, path, url, range))?;
    let Some(geometry) = loaded else {
        return Err(RuntimeError::new(
            RuntimeErrorKind::FileTypeMismatch {
                for_name: path.to_owned(),
                at: url.to_path_buf(),
                expected: "a model file".to_owned(),
            },
            range.clone(),
        )
        .into());
    };
    cache(ctx, url, ImportEntry::Geometry(Box::new(geometry.clone())));
    Ok(Value::Mesh(attach(geometry, ctx, range)))
}

/// Imported geometry picks up the current material, smoothing, and source
/// location; the child transform applies when the value is accumulated.
fn attach(mut geometry: Geometry, ctx: &EvaluationContext<'_>, range: &SourceRange) -> Geometry {
    geometry.material = ctx.material.clone();
    geometry.smoothing = ctx.smoothing;
    geometry.source_range = Some(range.clone());
    geometry
}

fn read_text(
    ctx: &mut EvaluationContext<'_>,
    path: &str,
    url: &Path,
    range: &SourceRange,
) -> EvalResult<String> {
    ctx.delegate
        .load_text(url)
        .map_err(|error| io_error(&error, path, url, range))
}

fn io_error(error: &io::Error, path: &str, url: &Path, range: &SourceRange) -> EvalInterrupt {
    let kind = match error.kind() {
        io::ErrorKind::PermissionDenied => RuntimeErrorKind::FileAccessRestricted {
            for_name: path.to_owned(),
            at: url.to_path_buf(),
        },
        io::ErrorKind::NotFound => RuntimeErrorKind::FileNotFound {
            for_name: path.to_owned(),
            at: Some(url.to_path_buf()),
        },
        _ => RuntimeErrorKind::FileParsingError {
            for_name: path.to_owned(),
            at: url.to_path_buf(),
            message: error.to_string(),
        },
    };
    RuntimeError::new(kind, range.clone()).into()
}

fn wrap_import_error(
    inner: ProgramError,
    url: &Path,
    source: &str,
    range: &SourceRange,
) -> EvalInterrupt {
    RuntimeError::new(
        RuntimeErrorKind::ImportError {
            inner: Box::new(inner),
            url: url.to_path_buf(),
            source: source.to_owned(),
        },
        range.clone(),
    )
    .into()
}

fn cached(ctx: &EvaluationContext<'_>, url: &Path) -> Option<ImportEntry> {
    ctx.import_cache.borrow().get(url).cloned()
}

fn cache(ctx: &EvaluationContext<'_>, url: &Path, entry: ImportEntry) {
    ctx.import_cache.borrow_mut().insert(url.to_path_buf(), entry);
}

/// Maps parsed JSON into the value model: objects keep their key order,
/// arrays become tuples, null becomes void.
fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::void(),
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(elements) => {
            Value::Tuple(elements.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name, json_to_value(value)))
                .collect(),
        ),
    }
}
