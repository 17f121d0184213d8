//! # Merkle Aggregation
//!
//! Folds an ordered list of credential digests into a single root.
//!
//! ## Algorithm
//!
//! - Empty input: the root is `SHA256("")`.
//! - Otherwise fold at least once, then until one digest remains. A fold
//!   pairs consecutive digests; an odd last digest is paired with itself.
//!   A pair combines as `SHA256(hex(left) || hex(right))`, hashing the
//!   128 ASCII hex chars, not the 64 raw bytes.
//!
//! Because the first fold always runs, `root([h]) == SHA256(hex(h) || hex(h))`
//! rather than `h`. The fold is order-sensitive: reversing the input changes
//! the root.
//!
//! No tree is retained; `merkle_levels` recomputes every level for callers
//! that need to audit the fold step by step.

use idv_core::{sha256_bytes, CredentialDigest};

/// Combine two sibling digests into their parent.
pub fn combine(left: &CredentialDigest, right: &CredentialDigest) -> CredentialDigest {
    let mut buf = String::with_capacity(128);
    buf.push_str(&left.to_hex());
    buf.push_str(&right.to_hex());
    sha256_bytes(buf.as_bytes())
}

/// Fold one level into the next, duplicating an odd last node.
///
/// An empty level folds to an empty level.
pub fn fold_level(level: &[CredentialDigest]) -> Vec<CredentialDigest> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            combine(left, right)
        })
        .collect()
}

/// Compute the Merkle root of an ordered digest list.
pub fn merkle_root(digests: &[CredentialDigest]) -> CredentialDigest {
    if digests.is_empty() {
        return sha256_bytes(b"");
    }
    let mut level = fold_level(digests);
    while level.len() > 1 {
        level = fold_level(&level);
    }
    level[0]
}

/// Every level of the fold, leaves first, root level last.
///
/// Returns an empty vector for empty input. For non-empty input the last
/// level has exactly one element.
pub fn merkle_levels(digests: &[CredentialDigest]) -> Vec<Vec<CredentialDigest>> {
    if digests.is_empty() {
        return Vec::new();
    }
    let mut levels = Vec::new();
    let mut current = digests.to_vec();
    loop {
        let next = fold_level(&current);
        levels.push(current);
        if next.len() == 1 {
            levels.push(next);
            return levels;
        }
        current = next;
    }
}
