//! Environment variable names read by this crate.
//!
//! Only [`APP_VERSION_ENV`] is consulted implicitly (when a hook is built
//! without an explicit version); the rest are read by
//! [`HookOptions::from_env`](crate::options::HookOptions::from_env).

/// Version of the running application, copied into the `ver` field.
pub const APP_VERSION_ENV: &str = "APP_VERSION";

/// Comma separated level names the caller hook fires for, e.g. `debug,trace`.
pub const CALLER_HOOK_LEVELS_ENV: &str = "CALLER_HOOK_LEVELS";

/// Number of trailing source path segments kept in the `src` field.
pub const CALLER_HOOK_PATH_SEGMENTS_ENV: &str = "CALLER_HOOK_PATH_SEGMENTS";

/// Extra application wrapper frames to skip when resolving the caller.
pub const CALLER_HOOK_STACK_OFFSET_ENV: &str = "CALLER_HOOK_STACK_OFFSET";

/// Read an environment variable, treating unset and empty the same.
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
