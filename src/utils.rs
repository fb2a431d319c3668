/// Number of threads available to the process, used as the default size for
/// the parallel-join pool.
pub fn n_threads() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}
