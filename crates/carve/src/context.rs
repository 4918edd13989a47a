//! The evaluation context: scoped symbols, transform and material state,
//! the child accumulator, and everything an evaluation shares.
//!
//! Contexts form a stack by value: `push` builds the child context for a
//! block invocation, `push_definition` the context a user definition body
//! runs in, and `with_scope` gives for/if bodies a scope that restores the
//! user-symbol table on exit. The one deliberate leak in that discipline
//! is option retention: a binding set for a name the current block
//! declares as an option survives the pop, which is how caller-supplied
//! options reach the definition site.

use std::{cell::RefCell, path::PathBuf, rc::Rc};

use ahash::AHashMap;

use carve_geom::{Geometry, GeometryCache, GeometryKind, Material, MaterialProperty, Text, Transform};

use crate::{
    errors::{EvalInterrupt, EvalResult, RuntimeError, RuntimeErrorKind},
    imports::{ImportDelegate, ImportEntry},
    lexer::SourceRange,
    random::RandomSequence,
    stdlib::Stdlib,
    symbols::{BlockType, OptionSlot, Symbol, SymbolTable},
    types::ValueType,
    value::Value,
};

/// How deep user-defined function and block invocations may nest.
pub(crate) const MAX_RECURSION_DEPTH: u32 = 25;

/// The default segment count for curved surfaces.
pub(crate) const DEFAULT_DETAIL: u32 = 16;

pub(crate) struct EvaluationContext<'a> {
    pub delegate: &'a dyn ImportDelegate,
    pub cancelled: &'a dyn Fn() -> bool,
    pub stdlib: Rc<Stdlib>,

    /// Source of the lexical frame currently evaluating, for diagnostics.
    pub source: Rc<str>,
    /// URL of the file currently evaluating; imports resolve relative to
    /// this.
    pub base_url: Option<PathBuf>,

    /// The built-in table for the current block kind.
    symbols: Rc<SymbolTable>,
    pub user_symbols: SymbolTable,
    /// Option slots the current block declares.
    pub options: Rc<AHashMap<String, OptionSlot>>,
    /// Whether `option` statements are legal here (user block bodies).
    pub allows_options: bool,

    pub material: Material,
    pub background: Option<MaterialProperty>,
    pub transform: Transform,
    pub child_transform: Transform,
    /// The opacity seed: the parent's material opacity at push time.
    /// Setting `opacity` multiplies by this.
    pub opacity: f64,
    pub detail: u32,
    pub smoothing: Option<f64>,
    pub font: Option<String>,
    pub name: Option<String>,
    /// Set when the `position`/`orientation` properties are written; light
    /// and camera nodes dispatch on these.
    pub has_position: bool,
    pub has_orientation: bool,

    pub child_types: ValueType,
    pub children: Vec<Value>,
    /// Names defined in this context, in definition order.
    pub definition_order: Vec<String>,
    /// Named geometry gathered from values added to this context.
    pub named_objects: AHashMap<String, Geometry>,

    pub random: Rc<RefCell<RandomSequence>>,
    pub import_cache: Rc<RefCell<AHashMap<PathBuf, ImportEntry>>>,
    pub import_stack: Rc<RefCell<Vec<PathBuf>>>,
    pub geometry_cache: GeometryCache,
    pub stack_depth: u32,
}

impl<'a> EvaluationContext<'a> {
    pub fn new_root(
        delegate: &'a dyn ImportDelegate,
        cancelled: &'a dyn Fn() -> bool,
        source: Rc<str>,
        base_url: Option<PathBuf>,
        geometry_cache: GeometryCache,
    ) -> Self {
        let stdlib = Rc::new(Stdlib::new());
        let symbols = stdlib.table(crate::symbols::BlockKind::Root);
        Self {
            delegate,
            cancelled,
            stdlib,
            source,
            base_url,
            symbols,
            user_symbols: SymbolTable::default(),
            options: Rc::new(AHashMap::new()),
            allows_options: false,
            material: Material::default(),
            background: None,
            transform: Transform::IDENTITY,
            child_transform: Transform::IDENTITY,
            opacity: 1.0,
            detail: DEFAULT_DETAIL,
            smoothing: None,
            font: None,
            name: None,
            has_position: false,
            has_orientation: false,
            child_types: ValueType::union_of([ValueType::Mesh, ValueType::Text]),
            children: Vec::new(),
            definition_order: Vec::new(),
            named_objects: AHashMap::new(),
            random: Rc::new(RefCell::new(RandomSequence::default())),
            import_cache: Rc::new(RefCell::new(AHashMap::new())),
            import_stack: Rc::new(RefCell::new(Vec::new())),
            geometry_cache,
            stack_depth: 0,
        }
    }

    pub fn check_cancelled(&self) -> EvalResult<()> {
        if (self.cancelled)() {
            Err(EvalInterrupt::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn check_recursion(&self, range: &SourceRange) -> EvalResult<()> {
        if self.stack_depth > MAX_RECURSION_DEPTH {
            return Err(RuntimeError::new(
                RuntimeErrorKind::AssertionFailure {
                    message: "Too much recursion".to_owned(),
                },
                range.clone(),
            )
            .into());
        }
        Ok(())
    }

    /// Child context for a block invocation.
    ///
    /// Inherits the shared evaluation state, the material (whose opacity
    /// becomes the child's opacity seed), detail, smoothing, font, and
    /// base URL. Transform state and children reset; the block's symbol
    /// table is installed and user symbols it shadows are cleared.
    pub fn push(&self, block_type: &BlockType) -> EvaluationContext<'a> {
        let symbols = self.stdlib.table(block_type.kind);
        let mut user_symbols = self.user_symbols.clone();
        user_symbols.retain(|name, _| !symbols.contains_key(name));
        EvaluationContext {
            delegate: self.delegate,
            cancelled: self.cancelled,
            stdlib: Rc::clone(&self.stdlib),
            source: Rc::clone(&self.source),
            base_url: self.base_url.clone(),
            symbols,
            user_symbols,
            options: Rc::clone(&block_type.options),
            allows_options: false,
            material: self.material.clone(),
            background: None,
            transform: Transform::IDENTITY,
            child_transform: Transform::IDENTITY,
            opacity: self.material.opacity,
            detail: self.detail,
            smoothing: self.smoothing,
            font: self.font.clone(),
            name: None,
            has_position: false,
            has_orientation: false,
            child_types: block_type.child_types.clone(),
            children: Vec::new(),
            definition_order: Vec::new(),
            named_objects: AHashMap::new(),
            random: Rc::clone(&self.random),
            import_cache: Rc::clone(&self.import_cache),
            import_stack: Rc::clone(&self.import_stack),
            geometry_cache: self.geometry_cache.clone(),
            stack_depth: self.stack_depth + 1,
        }
    }

    /// Context for a user definition body: like `push`, but it adopts the
    /// current name, transform, and opacity, accepts any child, and
    /// installs the definition symbol table.
    pub fn push_definition(&self) -> EvaluationContext<'a> {
        let mut child = self.push(&BlockType::new(
            crate::symbols::BlockKind::User,
            ValueType::Any,
            ValueType::Any,
        ));
        child.name = self.name.clone();
        child.transform = self.transform;
        child.opacity = self.opacity;
        child
    }

    /// Runs `body` in a fresh lexical scope, restoring the user-symbol
    /// table afterwards. Option bindings whose name the current block
    /// declares as an option are retained across the pop.
    pub fn with_scope<T>(&mut self, body: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        let snapshot = self.user_symbols.clone();
        let result = body(self);
        let scoped = std::mem::replace(&mut self.user_symbols, snapshot);
        for (name, symbol) in scoped {
            if matches!(symbol, Symbol::Option(_)) && self.options.contains_key(&name) {
                self.user_symbols.insert(name, symbol);
            }
        }
        result
    }

    /// Installs a user-level definition, tracking definition order for
    /// the `object` block.
    pub fn define(&mut self, name: &str, symbol: Symbol) {
        if !self.definition_order.iter().any(|n| n == name) {
            self.definition_order.push(name.to_owned());
        }
        self.user_symbols.insert(name.to_owned(), symbol);
    }

    /// Looks a name up through user symbols, option slots, and the
    /// built-in table, in that order.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.user_symbols.get(name) {
            return Some(symbol.clone());
        }
        if let Some(slot) = self.options.get(name)
            && let Some(default) = &slot.default
        {
            return Some(Symbol::Option(default.clone()));
        }
        self.symbols.get(name).cloned()
    }

    /// Whether `name` is settable as an option of the current block.
    pub fn option_slot(&self, name: &str) -> Option<&OptionSlot> {
        self.options.get(name)
    }

    /// Every name resolvable here, for suggestions. Sorted for
    /// deterministic diagnostics.
    pub fn symbol_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .symbols
            .keys()
            .chain(self.user_symbols.keys())
            .chain(self.options.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// The child-accumulation contract: a produced value lands in
    /// `children` when the context accepts it, with transforms applied.
    /// Tuples fan out element-wise, paths wrap into path geometry where
    /// meshes are wanted, and strings wrap into text where text is
    /// allowed. Anything else is an unused value.
    pub fn add_value(&mut self, value: Value, range: &SourceRange) -> EvalResult<()> {
        match value {
            Value::Tuple(elements) => {
                for element in elements {
                    self.add_value(element, range)?;
                }
                Ok(())
            }
            value if value.value_type().is_subtype_of(&self.child_types) => {
                let transformed = match value {
                    Value::Mesh(mut geometry) => {
                        geometry.transform = geometry.transform.then(self.child_transform);
                        self.gather_named(&geometry);
                        Value::Mesh(geometry)
                    }
                    Value::Vector(v) => Value::Vector(self.child_transform.apply(v)),
                    Value::Point(p) => Value::Point(p.transformed(self.child_transform)),
                    Value::Polygon(p) => Value::Polygon(p.transformed(self.child_transform)),
                    Value::Path(p) => Value::Path(p.transformed(self.child_transform)),
                    other => other,
                };
                self.children.push(transformed);
                Ok(())
            }
            Value::Path(path) if ValueType::Mesh.is_subtype_of(&self.child_types) => {
                // A path where a mesh is wanted becomes path geometry.
                let mut geometry = Geometry::new(GeometryKind::Path { path });
                geometry.transform = self.child_transform;
                geometry.material = self.material.clone();
                geometry.source_range = Some(range.clone());
                self.children.push(Value::Mesh(geometry));
                Ok(())
            }
            Value::String(string) if ValueType::Text.is_subtype_of(&self.child_types) => {
                let text = self.wrap_text(string);
                self.children.push(Value::Text(text));
                Ok(())
            }
            other => Err(RuntimeError::new(
                RuntimeErrorKind::UnusedValue {
                    of_type: other.type_description(),
                },
                range.clone(),
            )
            .into()),
        }
    }

    /// Wraps a plain string into text carrying the current font, color,
    /// and line spacing.
    pub fn wrap_text(&self, string: String) -> Text {
        Text {
            string,
            font: self.font.clone(),
            color: self.material.diffuse.as_ref().and_then(MaterialProperty::color),
            linespacing: None,
        }
    }

    fn gather_named(&mut self, geometry: &Geometry) {
        geometry.walk(&mut |node| {
            if let Some(name) = &node.name {
                self.named_objects.insert(name.clone(), node.clone());
            }
        });
    }

    /// Folds a finished child context's side effects back into this one.
    pub fn adopt(&mut self, child: EvaluationContext<'_>) {
        self.named_objects.extend(child.named_objects);
    }
}
