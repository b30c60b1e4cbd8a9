//! Queue position allocation.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::store::QueueDocument;

/// Shuffles `documents` uniformly and stamps consecutive indices.
///
/// Indices run from `current_index` to `current_index + len - 1`; every
/// document gets the same `createdAt`.
pub fn allocate<R: Rng>(
    mut documents: Vec<QueueDocument>,
    current_index: i64,
    created_at: &str,
    rng: &mut R,
) -> Vec<QueueDocument> {
    documents.shuffle(rng);
    for (index, document) in (current_index..).zip(documents.iter_mut()) {
        document.record.stamp_index(index);
        document.record.stamp_created_at(created_at);
    }
    documents
}
