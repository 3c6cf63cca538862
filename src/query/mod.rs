// Submodules for separation of concerns
mod eval;
mod lookup;
mod parse;
mod queryset;
mod types;

// Public API re-exports
pub use eval::{coerced_cmp, eval_filter, from_json, get_path, render, to_json};
pub use lookup::{
    DEFAULT_LOOKUP, LOOKUP_SEP, Lookup, UnknownLookup, field_path_to_dotted, split_lookup_key,
};
pub use parse::{lookup_filter, parse_flag, parse_lookup_value};
pub use queryset::QuerySet;
pub use types::{Filter, LookupValue};
