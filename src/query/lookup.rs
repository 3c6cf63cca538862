//! Lookup operators and `field__operator` key handling.

use std::fmt;
use std::str::FromStr;

/// Separator between path segments and between a path and its operator.
pub const LOOKUP_SEP: &str = "__";

/// Operator assumed when a query key carries no `__` suffix.
pub const DEFAULT_LOOKUP: &str = "exact";

/// A named comparison applied to one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Range,
    IsNull,
    #[cfg(feature = "regex")]
    Regex,
    #[cfg(feature = "regex")]
    IRegex,
}

impl Lookup {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::EndsWith => "endswith",
            Self::IEndsWith => "iendswith",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Range => "range",
            Self::IsNull => "isnull",
            #[cfg(feature = "regex")]
            Self::Regex => "regex",
            #[cfg(feature = "regex")]
            Self::IRegex => "iregex",
        }
    }

    /// Every operator compiled into this build.
    pub fn all() -> &'static [Self] {
        &[
            Self::Exact,
            Self::IExact,
            Self::Contains,
            Self::IContains,
            Self::StartsWith,
            Self::IStartsWith,
            Self::EndsWith,
            Self::IEndsWith,
            Self::Gt,
            Self::Gte,
            Self::Lt,
            Self::Lte,
            Self::In,
            Self::Range,
            Self::IsNull,
            #[cfg(feature = "regex")]
            Self::Regex,
            #[cfg(feature = "regex")]
            Self::IRegex,
        ]
    }

    pub const fn is_case_insensitive(self) -> bool {
        match self {
            Self::IExact | Self::IContains | Self::IStartsWith | Self::IEndsWith => true,
            #[cfg(feature = "regex")]
            Self::IRegex => true,
            _ => false,
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLookup(pub String);

impl fmt::Display for UnknownLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown lookup operator '{}'", self.0)
    }
}

impl std::error::Error for UnknownLookup {}

impl FromStr for Lookup {
    type Err = UnknownLookup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all().iter().copied().find(|l| l.as_str() == s).ok_or_else(|| UnknownLookup(s.to_string()))
    }
}

/// Splits a query key into `(field_path, operator)` at the last `__`.
///
/// Keys without a separator use [`DEFAULT_LOOKUP`]. The operator is returned as
/// written; whether it is a real operator is for the caller to decide.
pub fn split_lookup_key(key: &str) -> (&str, &str) {
    match key.rsplit_once(LOOKUP_SEP) {
        Some((path, op)) => (path, op),
        None => (key, DEFAULT_LOOKUP),
    }
}

/// Converts a `__`-separated field path into the dotted form used to walk documents.
pub fn field_path_to_dotted(path: &str) -> String {
    path.replace(LOOKUP_SEP, ".")
}
