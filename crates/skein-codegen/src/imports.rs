//! Import requirements
//!
//! Each synthesis step declares what its output needs as it is produced.
//! The assembler unions these per module, and the template turns each flag
//! into a conditional import block.

use crate::synth::ir::StringFormat;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Import {
    /// Open string-keyed maps
    Map,
    /// HTTP client and task support
    Http,
    /// JSON decoding runtime
    Decode,
    /// JSON encoding runtime
    Encode,
    /// URL building (path segments, query strings)
    Url,
}

impl Import {
    pub const ALL: [Import; 5] = [
        Import::Map,
        Import::Http,
        Import::Decode,
        Import::Encode,
        Import::Url,
    ];

    /// Template flag controlling this import block
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Map => "needs_map",
            Self::Http => "needs_http",
            Self::Decode => "needs_decode",
            Self::Encode => "needs_encode",
            Self::Url => "needs_url",
        }
    }
}

/// Structured requirement set for one declaration or module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    imports: BTreeSet<Import>,
    formats: BTreeSet<StringFormat>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, import: Import) {
        self.imports.insert(import);
    }

    pub fn with(mut self, import: Import) -> Self {
        self.insert(import);
        self
    }

    pub fn require_format(&mut self, format: StringFormat) {
        self.formats.insert(format);
        self.imports.insert(Import::Decode);
        self.imports.insert(Import::Encode);
    }

    pub fn contains(&self, import: Import) -> bool {
        self.imports.contains(&import)
    }

    pub fn merge(&mut self, other: &ImportSet) {
        self.imports.extend(other.imports.iter().copied());
        self.formats.extend(other.formats.iter().copied());
    }

    pub fn iter(&self) -> impl Iterator<Item = Import> + '_ {
        self.imports.iter().copied()
    }

    /// String formats whose alias types must be in scope
    pub fn formats(&self) -> impl Iterator<Item = StringFormat> + '_ {
        self.formats.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.formats.is_empty()
    }
}

impl FromIterator<Import> for ImportSet {
    fn from_iter<I: IntoIterator<Item = Import>>(iter: I) -> Self {
        Self {
            imports: iter.into_iter().collect(),
            formats: BTreeSet::new(),
        }
    }
}
