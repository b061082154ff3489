//! Interned names for messages, routines and other identifiers the runtime
//! compares and copies far more often than it reads.

use std::fmt;

use ahash::RandomState;
use hashbrown::HashMap;

/// Handle to an interned name.
///
/// Atoms are only meaningful together with the [`Atoms`] table which created
/// them. Comparing atoms from different tables compares nonsense.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Atom(u32);

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Atom").field(&self.0).finish()
    }
}

/// The name table.
///
/// Interned names are never freed. The runtime interns routine and message
/// names, which form a small, stable set over the life of an interpreter
/// instance.
pub struct Atoms {
    map: HashMap<Box<str>, Atom, RandomState>,
    names: Vec<Box<str>>,
}

impl Default for Atoms {
    fn default() -> Self {
        Atoms::new()
    }
}

impl Atoms {
    pub fn new() -> Self {
        Atoms {
            map: HashMap::default(),
            names: Vec::new(),
        }
    }

    /// Intern a name, returning the existing atom if it was seen before.
    ///
    /// Rexx identifiers are case-insensitive, so names are folded to
    /// uppercase before interning.
    pub fn intern(&mut self, name: &str) -> Atom {
        let folded = name.to_uppercase();
        if let Some(atom) = self.map.get(folded.as_str()).copied() {
            return atom;
        }
        let name: Box<str> = folded.into();
        let atom = Atom(self.names.len() as u32);
        self.names.push(name.clone());
        self.map.insert(name, atom);
        atom
    }

    /// Returns the name an atom was created from.
    pub fn lookup(&self, atom: Atom) -> &str {
        &self.names[atom.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
