use super::lookup::Lookup;

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;

/// Right-hand side of a lookup after parsing the raw query-string value.
#[derive(Debug, Clone)]
pub enum LookupValue {
    Text(String),
    List(Vec<String>),
    Range(String, String),
    Flag(bool),
    #[cfg(feature = "regex")]
    Pattern(regex::Regex),
}

#[derive(Debug, Clone)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    /// `path` is dotted (`owner.name`).
    Lookup { path: String, lookup: Lookup, value: LookupValue },
}

impl Filter {
    /// Conjunction of `self` and `other`, flattening nested `And`s and dropping `True`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, f) | (f, Self::True) => f,
            (Self::And(mut a), Self::And(b)) => {
                a.extend(b);
                Self::And(a)
            }
            (Self::And(mut a), f) => {
                a.push(f);
                Self::And(a)
            }
            (f, Self::And(mut b)) => {
                b.insert(0, f);
                Self::And(b)
            }
            (a, b) => Self::And(vec![a, b]),
        }
    }

    pub const fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }
}
