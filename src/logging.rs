use log::LevelFilter;

/// Initialize the logger with the specified level.
/// Safe to call more than once (tests share a process); later calls are no-ops.
pub fn init_logger(level: LevelFilter) {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .is_test(cfg!(test))
        .try_init();
}
