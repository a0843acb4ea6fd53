//! Progress reporting for loading runs.

use crate::plan::SpeedTier;

/// Progress callback for loading runs.
///
/// # Arguments
///
/// * `loaded` - Items loaded so far, counting the starting offset
/// * `total` - Total items the caller expects
/// * `batch_size` - Items per request in this run
/// * `tier` - Speed tier the run was planned for
///
/// Called once before the first request and once after every round. The
/// driver does not guard against panics from the callback.
pub type ProgressCallback = Box<dyn Fn(usize, usize, usize, SpeedTier) + Send + Sync>;
