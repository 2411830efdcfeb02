//! Trace records fed to the policies.

/// Kind of access carried by a [`Reference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpKind {
    /// Read access. Unrecognized operation strings canonicalize here.
    #[default]
    Read,
    /// Write access; marks the touched page dirty.
    Write,
}

impl OpKind {
    /// Parses a trace operation field.
    ///
    /// `"Write"`, `"write"`, `"W"`, and `"w"` map to [`OpKind::Write`];
    /// every other string, including unknown labels, maps to
    /// [`OpKind::Read`].
    pub fn parse(s: &str) -> Self {
        match s {
            "Write" | "write" | "W" | "w" => Self::Write,
            _ => Self::Read,
        }
    }

    /// Returns `true` for [`OpKind::Write`].
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

impl From<&str> for OpKind {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// One trace record: a page address plus the kind of access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Page address (the cache key).
    pub addr: u64,
    /// Access kind.
    pub op: OpKind,
}

impl Reference {
    /// Creates a reference with an explicit operation kind.
    pub fn new(addr: u64, op: OpKind) -> Self {
        Self { addr, op }
    }

    /// Creates a read reference.
    pub fn read(addr: u64) -> Self {
        Self::new(addr, OpKind::Read)
    }

    /// Creates a write reference.
    pub fn write(addr: u64) -> Self {
        Self::new(addr, OpKind::Write)
    }
}
