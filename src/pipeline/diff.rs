//! Line-set diff between two versions of a resource.
//!
//! Membership-based, not positional: a line that merely moved is not
//! reported, and a line whose exact value appears anywhere in the old
//! content is never reported. Duplicate new lines absent from the old
//! content are emitted once per occurrence, in the new content's order.

use std::collections::HashSet;

/// Compute the lines present in `new` but absent from `old`.
///
/// `old` is `None` when the resource has never been stored; the diff is
/// then every line of `new` in order.
pub fn diff_lines(old: Option<&str>, new: &str) -> Vec<String> {
    let Some(old) = old else {
        return new.split('\n').map(str::to_string).collect();
    };

    let old_lines: HashSet<&str> = old.split('\n').collect();

    new.split('\n')
        .filter(|line| !old_lines.contains(line))
        .map(str::to_string)
        .collect()
}
