use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The number of blocks per task must be valid.
    #[error("chunk size must be > 0 for the Chunked strategy")]
    InvalidChunkSize(usize),

    /// The block size must be valid.
    #[error("block size must be > 0")]
    InvalidBlockSize(usize),

    /// The destination is not a whole number of blocks.
    #[error("destination length {0} is not a multiple of the block size {1}")]
    SizeMismatch(usize, usize),
}

/// Controls how the windows of a convolution are extracted.
///
/// Every output position owns a disjoint block of the destination buffer, so the
/// blocks can be filled in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool and hand out one output position per task.
    #[default]
    Parallel,

    /// Use the global Rayon thread pool and hand out `n` output positions per task.
    ///
    /// This is often more cache-friendly than [`ExecutionStrategy::Parallel`]
    /// when the windows are small.
    Chunked(usize),

    /// Run sequentially on the current thread.
    ///
    /// Useful for small inputs, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

/// Fill `dst` block by block according to `strategy`.
///
/// # Arguments
///
/// * `strategy` - The execution strategy.
/// * `dst` - The destination buffer, a whole number of blocks.
/// * `block_size` - The number of elements of one block.
/// * `op` - Called with the block index and the block to fill.
///
/// # Errors
///
/// Returns an error if the block size or the strategy parameters are zero, if
/// `dst` is not a whole number of blocks or if the thread pool cannot be built.
pub fn for_each_block<T, F>(
    strategy: ExecutionStrategy,
    dst: &mut [T],
    block_size: usize,
    op: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if block_size == 0 {
        return Err(ParallelError::InvalidBlockSize(block_size));
    }

    if dst.len() % block_size != 0 {
        return Err(ParallelError::SizeMismatch(dst.len(), block_size));
    }

    match strategy {
        ExecutionStrategy::Serial => {
            dst.chunks_exact_mut(block_size)
                .enumerate()
                .for_each(|(i, block)| op(i, block));
        }
        ExecutionStrategy::Parallel => {
            dst.par_chunks_exact_mut(block_size)
                .enumerate()
                .for_each(|(i, block)| op(i, block));
        }
        ExecutionStrategy::Chunked(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidChunkSize(n));
            }
            dst.par_chunks_mut(block_size * n)
                .enumerate()
                .for_each(|(chunk, blocks)| {
                    blocks
                        .chunks_exact_mut(block_size)
                        .enumerate()
                        .for_each(|(i, block)| op(chunk * n + i, block));
                });
        }
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| {
                dst.par_chunks_exact_mut(block_size)
                    .enumerate()
                    .for_each(|(i, block)| op(i, block));
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_with_index(strategy: ExecutionStrategy) -> Result<Vec<usize>, ParallelError> {
        let mut dst = vec![0; 12];
        for_each_block(strategy, &mut dst, 3, |i, block| {
            block.iter_mut().for_each(|v| *v = i);
        })?;
        Ok(dst)
    }

    const EXPECTED: [usize; 12] = [0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3];

    #[test]
    fn test_for_each_block_serial() -> Result<(), ParallelError> {
        assert_eq!(fill_with_index(ExecutionStrategy::Serial)?, EXPECTED);
        Ok(())
    }

    #[test]
    fn test_for_each_block_parallel() -> Result<(), ParallelError> {
        assert_eq!(fill_with_index(ExecutionStrategy::Parallel)?, EXPECTED);
        Ok(())
    }

    #[test]
    fn test_for_each_block_chunked() -> Result<(), ParallelError> {
        // the last chunk holds a single block
        assert_eq!(fill_with_index(ExecutionStrategy::Chunked(3))?, EXPECTED);
        Ok(())
    }

    #[test]
    fn test_for_each_block_fixed() -> Result<(), ParallelError> {
        assert_eq!(fill_with_index(ExecutionStrategy::Fixed(2))?, EXPECTED);
        Ok(())
    }

    #[test]
    fn test_for_each_block_invalid() {
        assert_eq!(
            fill_with_index(ExecutionStrategy::Chunked(0)),
            Err(ParallelError::InvalidChunkSize(0))
        );
        assert_eq!(
            fill_with_index(ExecutionStrategy::Fixed(0)),
            Err(ParallelError::InvalidThreadCount(0))
        );

        let mut dst = vec![0u8; 5];
        let res = for_each_block(ExecutionStrategy::Serial, &mut dst, 2, |_, _| {});
        assert_eq!(res, Err(ParallelError::SizeMismatch(5, 2)));

        let res = for_each_block(ExecutionStrategy::Serial, &mut dst, 0, |_, _| {});
        assert_eq!(res, Err(ParallelError::InvalidBlockSize(0)));
    }

    #[test]
    fn test_for_each_block_empty() -> Result<(), ParallelError> {
        let mut dst: Vec<u8> = Vec::new();
        for_each_block(ExecutionStrategy::Parallel, &mut dst, 4, |_, _| {})?;
        assert!(dst.is_empty());
        Ok(())
    }
}
