//! FieldQuote Text: pure item-name processing.
//!
//! Every function here is total over arbitrary strings: malformed or empty
//! input degrades to an empty result, never an error.

pub mod normalize;
pub mod similarity;
pub mod sizes;

pub use normalize::{
    key_variants, normalize, normalize_loose, normalize_strict, strict_chars, STOP_WORDS,
};
pub use similarity::similarity;
pub use sizes::{extract_size_tokens, size_boundary_pattern, SizeTokens};
