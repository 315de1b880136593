use crate::error::BackendError;
use crate::query::condition::Condition;
use serde::{Deserialize, Serialize};

pub const MIN_TOKEN: i64 = i64::MIN;
/// Exclusive upper bound of the ring. Sessions place every partition token
/// in `[MIN_TOKEN, MAX_TOKEN)`; see [`crate::session::Session`].
pub const MAX_TOKEN: i64 = i64::MAX;

/// Most shards a single `splits` request may produce.
pub const MAX_SPLITS: u64 = 1 << 16;

/// A half-open token range `[start, end)` of the partitioner ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    pub start: String,
    pub end: String,
    /// Estimated bytes covered by this range.
    pub length: u64,
}

impl Shard {
    /// The scan condition selecting exactly this range.
    pub fn condition(&self) -> Condition {
        Condition::scan(self.start.clone(), self.end.clone())
    }
}

/// Splits the whole token ring into evenly sized ranges so that each covers
/// roughly `split_size` bytes of `estimated_bytes`.
pub fn split_token_ring(estimated_bytes: u64, split_size: u64) -> Result<Vec<Shard>, BackendError> {
    if split_size == 0 {
        return Err(BackendError::InvalidArgument(
            "split size must be greater than zero".into(),
        ));
    }
    let count = estimated_bytes.div_ceil(split_size).max(1);
    if count > MAX_SPLITS {
        return Err(BackendError::InvalidArgument(format!(
            "split size {split_size} over {estimated_bytes} bytes yields {count} splits (max {MAX_SPLITS})"
        )));
    }
    let capacity = usize::try_from(count).map_err(|_| {
        BackendError::InvalidArgument(format!("{count} splits do not fit in memory"))
    })?;
    let width = i128::from(MAX_TOKEN) - i128::from(MIN_TOKEN);
    let step = width / i128::from(count);
    let length = estimated_bytes / count;

    let mut shards = Vec::with_capacity(capacity);
    for i in 0..i128::from(count) {
        let start = i128::from(MIN_TOKEN) + i * step;
        let end = if i + 1 == i128::from(count) {
            i128::from(MAX_TOKEN)
        } else {
            start + step
        };
        shards.push(Shard {
            start: start.to_string(),
            end: end.to_string(),
            length,
        });
    }
    Ok(shards)
}
