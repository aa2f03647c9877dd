use serde::{Deserialize, Serialize};
use std::fmt;

/// Type spellings accepted as an update count for modifying queries.
pub const UPDATE_COUNT_TYPES: [&str; 5] = ["i32", "i64", "u32", "u64", "usize"];

/// Type spellings treated as "returns nothing".
pub const UNIT_TYPES: [&str; 1] = ["()"];

const SCALAR_TYPES: [&str; 17] = [
    "bool", "char", "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
    "u64", "u128", "usize", "String",
];

///
/// TypeRef
///
/// Path-like reference to a declared type, e.g. `Page<User>` or `()`.
/// Only the final path segment takes part in shape detection.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TypeRef {
    pub path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Self>,
}

impl TypeRef {
    #[must_use]
    pub fn named(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn generic(path: impl Into<String>, args: impl IntoIterator<Item = Self>) -> Self {
        Self {
            path: path.into(),
            args: args.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn unit() -> Self {
        Self::named("()")
    }

    /// Last `::`-separated segment of the path.
    #[must_use]
    pub fn ident(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }

    #[must_use]
    pub fn is(&self, ident: &str) -> bool {
        self.ident() == ident
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        UNIT_TYPES.contains(&self.ident())
    }

    #[must_use]
    pub fn is_update_count(&self) -> bool {
        UPDATE_COUNT_TYPES.contains(&self.ident())
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.ident() == "bool"
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        SCALAR_TYPES.contains(&self.ident()) || self.is_update_count() || self.is_bool()
    }

    #[must_use]
    pub fn first_arg(&self) -> Option<&Self> {
        self.args.first()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.args.is_empty() {
            return Ok(());
        }

        f.write_str("<")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(">")
    }
}
