//! Query-side logic that needs no external service
//!
//! Canonicalization of generated Cypher, the candidate/error pair carried
//! through repair, store result shapes, and identifier extraction.

mod canonical;
mod ids;
mod types;

pub use canonical::{canonicalize, has_deprecated_id_access, CANONICAL_ID_FUNCTION};
pub use ids::{extract_ids, DEFAULT_ID_FIELD};
pub use types::{Candidate, ErrorList, QueryResult, UNCHECKED_MARKER};
