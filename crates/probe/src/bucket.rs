//! Partitioning of candidate names into probe buckets.

/// Splits `words` into consecutive buckets of at most `size` names.
///
/// Order is preserved and every name lands in exactly one bucket. A size of
/// zero is treated as one.
#[must_use]
pub fn create_buckets(words: &[String], size: usize) -> Vec<Vec<String>> {
    words.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}
