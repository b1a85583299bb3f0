use crate::env::{
    env_non_empty, APP_VERSION_ENV, CALLER_HOOK_LEVELS_ENV, CALLER_HOOK_PATH_SEGMENTS_ENV,
    CALLER_HOOK_STACK_OFFSET_ENV,
};
use tracing::Level;

/// Levels the caller hook fires for when none are configured.
pub const DEFAULT_LEVELS: [Level; 2] = [Level::DEBUG, Level::TRACE];

/// Source path segments kept when no limit is configured.
pub const DEFAULT_PATH_SEGMENTS_LIMIT: i32 = 3;

/// Options for [`CallerHook`](crate::hook::CallerHook).
///
/// **Fields**
/// - `app_version`: version of the running app. When unset or empty the
///   `APP_VERSION` environment variable is read at construction time.
/// - `levels`: levels the hook fires for; empty means `DEBUG` and `TRACE`.
/// - `path_segments_limit`: trailing source path segments to keep.
///   Unset means 3, zero or below disables trimming.
///   Untrimmed: `/home/user/src/acme/app/src/worker.rs`,
///   trimmed (3): `app/src/worker.rs`.
/// - `stack_offset`: application wrapper functions between the real call
///   site and the logging macro, skipped when resolving the caller.
/// - `skip_modules`: module paths whose frames are treated as part of the
///   logging pipeline, such as an application's own logging facade.
#[derive(Clone, Debug, Default)]
pub struct HookOptions {
    pub app_version: Option<String>,
    pub levels: Vec<Level>,
    pub path_segments_limit: Option<i32>,
    pub stack_offset: usize,
    pub skip_modules: Vec<String>,
}

/// Error returned when options read from the environment are malformed.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown log level {value:?} in {key}")]
    InvalidLevel { key: &'static str, value: String },

    #[error("invalid number {value:?} in {key}")]
    InvalidNumber { key: &'static str, value: String },
}

impl HookOptions {
    /// Build options from the `CALLER_HOOK_*` environment variables.
    ///
    /// Unset variables keep their defaults. `APP_VERSION` is not read here;
    /// the hook picks it up itself when no version was given.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_non_empty)
    }

    /// Same as [`HookOptions::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opt = HookOptions::default();

        if let Some(raw) = lookup(CALLER_HOOK_LEVELS_ENV) {
            opt.levels = parse_levels(CALLER_HOOK_LEVELS_ENV, &raw)?;
        }

        if let Some(raw) = lookup(CALLER_HOOK_PATH_SEGMENTS_ENV) {
            let limit = raw.trim().parse::<i32>().map_err(|_| ConfigError::InvalidNumber {
                key: CALLER_HOOK_PATH_SEGMENTS_ENV,
                value: raw.clone(),
            })?;
            opt.path_segments_limit = Some(limit);
        }

        if let Some(raw) = lookup(CALLER_HOOK_STACK_OFFSET_ENV) {
            opt.stack_offset = raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidNumber {
                key: CALLER_HOOK_STACK_OFFSET_ENV,
                value: raw.clone(),
            })?;
        }

        Ok(opt)
    }
}

fn parse_levels(key: &'static str, raw: &str) -> Result<Vec<Level>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Level>().map_err(|_| ConfigError::InvalidLevel {
                key,
                value: s.to_string(),
            })
        })
        .collect()
}

/// Options with every default applied.
#[derive(Clone, Debug)]
pub(crate) struct CheckedOptions {
    pub app_version: String,
    pub levels: Vec<Level>,
    pub path_segments_limit: i32,
    pub stack_offset: usize,
    pub skip_modules: Vec<String>,
}

pub(crate) fn check_hook_options<F>(opt: Option<HookOptions>, lookup: F) -> CheckedOptions
where
    F: Fn(&str) -> Option<String>,
{
    let opt = opt.unwrap_or_default();

    let app_version = match opt.app_version {
        Some(v) if !v.is_empty() => v,
        _ => lookup(APP_VERSION_ENV).unwrap_or_default(),
    };

    let levels = if opt.levels.is_empty() {
        DEFAULT_LEVELS.to_vec()
    } else {
        opt.levels
    };

    CheckedOptions {
        app_version,
        levels,
        path_segments_limit: opt.path_segments_limit.unwrap_or(DEFAULT_PATH_SEGMENTS_LIMIT),
        stack_offset: opt.stack_offset,
        skip_modules: opt.skip_modules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_applied() {
        let opt = check_hook_options(None, vars(&[]));
        assert_eq!(opt.app_version, "");
        assert_eq!(opt.levels, vec![Level::DEBUG, Level::TRACE]);
        assert_eq!(opt.path_segments_limit, 3);
        assert_eq!(opt.stack_offset, 0);
        assert!(opt.skip_modules.is_empty());
    }

    #[test]
    fn app_version_falls_back_to_environment() {
        let env = vars(&[("APP_VERSION", "v9.9.9")]);
        let opt = check_hook_options(Some(HookOptions::default()), &env);
        assert_eq!(opt.app_version, "v9.9.9");

        let empty = HookOptions {
            app_version: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(check_hook_options(Some(empty), &env).app_version, "v9.9.9");

        let explicit = HookOptions {
            app_version: Some("v1.2.3".to_string()),
            ..Default::default()
        };
        assert_eq!(check_hook_options(Some(explicit), &env).app_version, "v1.2.3");
    }

    #[test]
    fn explicit_values_are_kept() {
        let opt = HookOptions {
            levels: vec![Level::INFO],
            path_segments_limit: Some(0),
            stack_offset: 2,
            ..Default::default()
        };
        let opt = check_hook_options(Some(opt), vars(&[]));
        assert_eq!(opt.levels, vec![Level::INFO]);
        assert_eq!(opt.path_segments_limit, 0);
        assert_eq!(opt.stack_offset, 2);
    }

    #[test]
    fn reads_options_from_lookup() {
        let opt = HookOptions::from_lookup(vars(&[
            ("CALLER_HOOK_LEVELS", "info, WARN,"),
            ("CALLER_HOOK_PATH_SEGMENTS", "-1"),
            ("CALLER_HOOK_STACK_OFFSET", "2"),
        ]))
        .unwrap();
        assert_eq!(opt.levels, vec![Level::INFO, Level::WARN]);
        assert_eq!(opt.path_segments_limit, Some(-1));
        assert_eq!(opt.stack_offset, 2);
        assert!(opt.app_version.is_none());
    }

    #[test]
    fn rejects_malformed_values() {
        let err = HookOptions::from_lookup(vars(&[("CALLER_HOOK_LEVELS", "debug,loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevel { ref value, .. } if value == "loud"));

        let err = HookOptions::from_lookup(vars(&[("CALLER_HOOK_STACK_OFFSET", "-3")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "CALLER_HOOK_STACK_OFFSET", .. }));
    }
}
