//! Request validation at the boundary; the engine is never invoked for a
//! request that fails here.

/// Validate a raw `[begin, end]` range.
///
/// Non-negativity of indices and limits is guaranteed by the unsigned types.
/// `begin == end` stays rejected to match the documented behavior of the
/// original validator, even though the engine itself handles single-term
/// ranges.
pub fn validate_range(begin: u64, end: u64) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if begin > end {
        problems.push("Begin must be less than or equal to End.".to_string());
    }
    if begin == end {
        problems.push("Begin must be different than End.".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}
