//! Shader program composition.
//!
//! Material programs are built by splicing named [`ShaderPatch`]es into a base
//! WGSL program at marked [`InsertionPoint`]s. The base program keeps its own
//! transforms, normals and shading; patches only add code after a marker, so
//! the base stays intact and a patch can be swapped without touching it.
//!
//! A marker is a line comment of the form `// @insert <tag>`:
//!
//! ```ignore
//! var transformed = position;
//! // @insert begin_vertex
//! let world = model * vec4<f32>(transformed, 1.0);
//! ```
//!
//! The composed source remembers which byte ranges came from which patch, so
//! a naga diagnostic can be traced back to the fragment that caused it.

use std::collections::HashMap;
use std::ops::Range;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::ShaderError;

/// Named places in a base program where patches may add code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertionPoint {
    /// Module scope, after the base program's own declarations.
    Declarations,
    /// Vertex stage, after `transformed` is initialised from the object-space
    /// position and before it is projected.
    BeginVertex,
    /// Fragment stage, after the lit color is computed and before fog.
    ColorFragment,
}

impl InsertionPoint {
    /// Tag used in the `// @insert <tag>` marker.
    pub fn tag(&self) -> &'static str {
        match self {
            InsertionPoint::Declarations => "declarations",
            InsertionPoint::BeginVertex => "begin_vertex",
            InsertionPoint::ColorFragment => "color_fragment",
        }
    }

    /// Full marker line text.
    pub fn marker(&self) -> String {
        format!("// @insert {}", self.tag())
    }
}

/// A named WGSL fragment to splice into a base program.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPatch {
    /// Name reported in diagnostics.
    pub name: &'static str,
    /// Where the fragment goes.
    pub point: InsertionPoint,
    /// WGSL source of the fragment.
    pub source: String,
}

impl ShaderPatch {
    pub fn new(name: &'static str, point: InsertionPoint, source: impl Into<String>) -> Self {
        Self {
            name,
            point,
            source: source.into(),
        }
    }
}

/// A base program with insertion markers.
#[derive(Debug, Clone, Copy)]
pub struct BaseProgram {
    /// Program name reported in diagnostics.
    pub name: &'static str,
    /// WGSL source containing `// @insert` markers.
    pub source: &'static str,
}

impl BaseProgram {
    /// Check whether the program declares a marker for `point`.
    pub fn has_point(&self, point: InsertionPoint) -> bool {
        self.source.contains(&point.marker())
    }
}

/// Byte range of the composed source that came from one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSpan {
    pub patch: &'static str,
    pub range: Range<usize>,
}

/// A base program with all patches applied.
#[derive(Debug, Clone)]
pub struct ComposedProgram {
    name: &'static str,
    source: String,
    spans: Vec<PatchSpan>,
}

impl ComposedProgram {
    /// Name of the base program this was composed from.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The complete WGSL source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Where each patch landed in [`source`](Self::source).
    pub fn spans(&self) -> &[PatchSpan] {
        &self.spans
    }

    /// Name of the patch that contributed the byte at `offset`, if any.
    pub fn patch_at(&self, offset: usize) -> Option<&'static str> {
        self.spans
            .iter()
            .find(|s| s.range.contains(&offset))
            .map(|s| s.patch)
    }

    /// Parse and validate the program with naga.
    ///
    /// Errors are attributed to the patch whose source span contains the
    /// first labelled location, or to the base program otherwise.
    pub fn validate(&self) -> Result<naga::Module, ShaderError> {
        let module = naga::front::wgsl::parse_str(&self.source).map_err(|err| {
            let offset = err
                .labels()
                .next()
                .and_then(|(span, _)| span.to_range())
                .map(|r| r.start);
            self.error_at(offset, err.emit_to_string(&self.source))
        })?;

        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        validator.validate(&module).map_err(|err| {
            let offset = err
                .spans()
                .next()
                .and_then(|(span, _)| span.to_range())
                .map(|r| r.start);
            self.error_at(offset, err.emit_to_string(&self.source))
        })?;

        Ok(module)
    }

    fn error_at(&self, offset: Option<usize>, message: String) -> ShaderError {
        match offset.and_then(|o| self.patch_at(o)) {
            Some(patch) => ShaderError::InvalidPatch { patch, message },
            None => ShaderError::InvalidBase {
                program: self.name,
                message,
            },
        }
    }
}

/// Splice `patches` into `base`.
///
/// Patches that share an insertion point are emitted in the order given.
/// Every marker line is kept in the output, followed by its patches.
pub fn compose(base: &BaseProgram, patches: &[ShaderPatch]) -> Result<ComposedProgram, ShaderError> {
    // Locate every marker the patches need.
    let mut markers: Vec<(usize, InsertionPoint)> = Vec::new();
    for patch in patches {
        if markers.iter().any(|(_, p)| *p == patch.point) {
            continue;
        }
        let marker = patch.point.marker();
        let start = base
            .source
            .find(&marker)
            .ok_or(ShaderError::MissingInsertionPoint {
                patch: patch.name,
                point: patch.point,
            })?;
        markers.push((start + marker.len(), patch.point));
    }
    markers.sort_by_key(|(end, _)| *end);

    let mut by_point: HashMap<InsertionPoint, Vec<&ShaderPatch>> = HashMap::new();
    for patch in patches {
        by_point.entry(patch.point).or_default().push(patch);
    }

    let extra: usize = patches.iter().map(|p| p.source.len() + p.name.len() + 32).sum();
    let mut source = String::with_capacity(base.source.len() + extra);
    let mut spans = Vec::with_capacity(patches.len());
    let mut cursor = 0;

    for (marker_end, point) in markers {
        source.push_str(&base.source[cursor..marker_end]);
        cursor = marker_end;
        for patch in by_point.get(&point).into_iter().flatten() {
            source.push_str("\n// patch: ");
            source.push_str(patch.name);
            source.push('\n');
            let start = source.len();
            source.push_str(&patch.source);
            spans.push(PatchSpan {
                patch: patch.name,
                range: start..source.len(),
            });
        }
    }
    source.push_str(&base.source[cursor..]);

    Ok(ComposedProgram {
        name: base.name,
        source,
        spans,
    })
}

/// Programs registered for the lifetime of a scene.
///
/// The scene registers each material program once during construction and
/// drops the registry on teardown.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: HashMap<String, ComposedProgram>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `program` and register it under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        program: ComposedProgram,
    ) -> Result<&ComposedProgram, ShaderError> {
        let name = name.into();
        if self.programs.contains_key(&name) {
            return Err(ShaderError::AlreadyRegistered(name));
        }
        program.validate()?;
        log::debug!("Registered material program '{}' ({} patches)", name, program.spans.len());
        Ok(self.programs.entry(name).or_insert(program))
    }

    /// Look up a registered program.
    pub fn get(&self, name: &str) -> Option<&ComposedProgram> {
        self.programs.get(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
