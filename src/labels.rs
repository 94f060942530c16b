//! Label interning and persistence.
//!
//! Labels (XML tag names, generated alphabet symbols) are mapped to dense
//! small integers. The mapping is injective and stable: the id of a label is
//! its position in assignment order, which is also the order used by the
//! on-disk dump. Trees reference labels through per-node `LabelId` vectors.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

/// Dense identifier of an interned label.
pub type LabelId = u32;

/// Errors raised while loading a persisted label store.
#[derive(Debug, Error)]
pub enum LabelStoreError {
    /// Underlying file could not be read or written.
    #[error("label store I/O failed: {0}")]
    Io(#[from] io::Error),
    /// A persisted entry is not valid UTF-8.
    #[error("label {0} is not valid UTF-8")]
    InvalidUtf8(usize),
    /// A persisted entry appears twice; the mapping must stay injective.
    #[error("duplicate label '{0}' in store")]
    DuplicateLabel(String),
}

/// Injective mapping from label strings to dense integer ids.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    values: Vec<String>,
    ids: HashMap<String, LabelId>,
}

impl Labels {
    /// Create an empty label store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a label, returning its stable id.
    ///
    /// Repeated interning of the same string returns the same id.
    pub fn intern(&mut self, name: &str) -> LabelId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.values.len() as LabelId;
        self.values.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Resolve an id back to its label string.
    ///
    /// # Panics
    /// Panics if `id` was never assigned; ids are produced by [`intern`]
    /// only.
    ///
    /// [`intern`]: Labels::intern
    pub fn resolve(&self, id: LabelId) -> &str {
        &self.values[id as usize]
    }

    /// Look up the id of a label without interning it.
    pub fn id_of(&self, name: &str) -> Option<LabelId> {
        self.ids.get(name).copied()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no label has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over labels in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Dump all labels as a length-prefixed UTF-8 sequence in assignment
    /// order: a `u32` little-endian entry count, then per entry a `u32`
    /// little-endian byte length followed by the raw bytes.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        out.write_all(&(self.values.len() as u32).to_le_bytes())?;
        for value in &self.values {
            out.write_all(&(value.len() as u32).to_le_bytes())?;
            out.write_all(value.as_bytes())?;
        }
        Ok(())
    }

    /// Inverse of [`write_to`]; ids are restored from list position.
    ///
    /// [`write_to`]: Labels::write_to
    pub fn read_from(input: &mut impl Read) -> Result<Self, LabelStoreError> {
        let mut count_buf = [0u8; 4];
        input.read_exact(&mut count_buf)?;
        let count = u32::from_le_bytes(count_buf) as usize;

        let mut labels = Labels::new();
        for index in 0..count {
            let mut len_buf = [0u8; 4];
            input.read_exact(&mut len_buf)?;
            let len = u32::from_le_bytes(len_buf) as usize;
            let mut bytes = vec![0u8; len];
            input.read_exact(&mut bytes)?;
            let value =
                String::from_utf8(bytes).map_err(|_| LabelStoreError::InvalidUtf8(index))?;
            if labels.ids.contains_key(&value) {
                return Err(LabelStoreError::DuplicateLabel(value));
            }
            labels.intern(&value);
        }
        Ok(labels)
    }

    /// Persist the store to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LabelStoreError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Load a store previously written by [`save`].
    ///
    /// [`save`]: Labels::save
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LabelStoreError> {
        let mut input = BufReader::new(File::open(path)?);
        Self::read_from(&mut input)
    }
}
