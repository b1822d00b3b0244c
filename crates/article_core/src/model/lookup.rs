//! Category and publisher lookup entities.

use std::fmt::{Display, Formatter};

/// Which lookup table a name is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Category,
    Publisher,
}

impl LookupKind {
    /// Backing table name. Only these two static values ever reach SQL.
    pub fn table(self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::Publisher => "publishers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Publisher => "publisher",
        }
    }
}

impl Display for LookupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A persisted category or publisher row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntity {
    pub id: i64,
    pub kind: LookupKind,
    pub name: String,
}
