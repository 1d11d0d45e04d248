//! Minimal list diffing over media items.

use std::collections::HashSet;

use crate::model::{ItemId, MediaItem};

/// Returns the indices of `new` whose items (identifier + locator) are absent
/// from `old`, in ascending order.
///
/// # Example
/// ```
/// use story_engine::MediaItem;
/// use story_engine::diff::insertion_indices;
///
/// let old = vec![MediaItem::new("a", "file:///a.mp4")];
/// let new = vec![
///     MediaItem::new("a", "file:///a.mp4"),
///     MediaItem::new("b", "file:///b.mp4"),
/// ];
/// assert_eq!(insertion_indices(&old, &new), vec![1]);
/// ```
pub fn insertion_indices(old: &[MediaItem], new: &[MediaItem]) -> Vec<usize> {
    let existing: HashSet<(&ItemId, &str)> = old
        .iter()
        .map(|item| (&item.id, item.locator.as_str()))
        .collect();
    new.iter()
        .enumerate()
        .filter(|(_, item)| !existing.contains(&(&item.id, item.locator.as_str())))
        .map(|(index, _)| index)
        .collect()
}

/// Length of the longest shared prefix compared by item identity.
pub fn common_prefix_len(old: &[MediaItem], new: &[MediaItem]) -> usize {
    old.iter()
        .zip(new)
        .take_while(|(left, right)| left.same_identity(right))
        .count()
}
