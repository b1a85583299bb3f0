//! Call stack inspection used to find the application frame that emitted a
//! log record.
//!
//! The walk is incremental: frames are unwound and symbolized one at a time
//! through [`backtrace::trace`] and the walk stops at the first match, so a
//! log call never pays for a full stack capture.
//!
//! Function names come from the symbol table, file and line from debuginfo.
//! Build with at least `debug = "line-tables-only"` in the profile that
//! ships, otherwise inlined functions disappear from the walk and frames
//! carry no location.

/// Physical frames skipped before inspection starts. The innermost frame
/// always belongs to the unwinder entry point or to [`StackResolver::caller`]
/// itself, which is never inlined.
pub const DEFAULT_STACK_SEARCH_OFFSET: usize = 1;

/// Upper bound on the number of logical frames inspected per lookup.
pub const MAX_STACK_SEARCH_DEPTH: usize = 64;

/// Modules that are treated as internal regardless of configuration.
const RUNTIME_MODULES: &[&str] = &["std", "core", "alloc", "backtrace"];

/// A resolved stack frame.
///
/// `CallerFrame::default()` is the zero frame returned when nothing
/// qualified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallerFrame {
    /// Fully qualified, demangled function name. Empty when unresolved.
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl CallerFrame {
    /// Whether the frame carries a source location. A symbol name alone is
    /// not enough, it is all a binary without debuginfo provides.
    pub fn is_resolved(&self) -> bool {
        !self.file.is_empty()
    }
}

/// Source location the logging engine recorded for an event, i.e. where
/// the logging macro was invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Callsite<'a> {
    pub file: &'a str,
    pub line: u32,
}

/// Finds the first stack frame that does not belong to the logging
/// pipeline.
///
/// A frame belongs to the pipeline when its function path starts with one of
/// the owner modules (matched on whole path segments). After the pipeline
/// frames, `extra` more application functions and every frame in a wrapper
/// module are skipped to step over facades the embedding application puts
/// around its logger.
#[derive(Clone, Debug)]
pub struct StackResolver {
    base: usize,
    extra: usize,
    owners: Vec<String>,
    wrappers: Vec<String>,
    max_depth: usize,
}

impl StackResolver {
    pub fn new<I, S>(base: usize, extra: usize, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let owners = RUNTIME_MODULES
            .iter()
            .map(|m| m.to_string())
            .chain(owners.into_iter().map(Into::into))
            .collect();

        Self {
            base,
            extra,
            owners,
            wrappers: Vec::new(),
            max_depth: MAX_STACK_SEARCH_DEPTH,
        }
    }

    /// Application modules whose frames wrap the logging call.
    pub fn with_wrapper_modules<I, S>(mut self, wrappers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wrappers.extend(wrappers.into_iter().map(Into::into));
        self
    }

    /// Replace the default search window.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve the caller frame, or the zero frame if none is found within
    /// the search window. The location is the one found on the stack.
    #[inline(never)]
    pub fn caller(&self) -> CallerFrame {
        self.search(None)
    }

    /// Like [`StackResolver::caller`], but when the frame found is the one
    /// that expanded the logging macro (nothing was skipped past the
    /// pipeline), its location is taken from `callsite`. Debuginfo places
    /// macro-expanded code in the macro's own source file, so the engine's
    /// record of the invocation site is the accurate one there.
    #[inline(never)]
    pub fn caller_from(&self, callsite: Callsite<'_>) -> CallerFrame {
        self.search(Some(callsite))
    }

    #[inline(never)]
    fn search(&self, callsite: Option<Callsite<'_>>) -> CallerFrame {
        let mut physical = 0usize;
        let mut inspected = 0usize;
        // Skipped base frames are known pipeline frames already.
        let mut entered = self.base > 0;
        let mut wrapped = false;
        let mut extra_left = self.extra;
        let mut last_skipped: Option<String> = None;
        let mut found: Option<CallerFrame> = None;

        backtrace::trace(|frame| {
            physical += 1;
            if physical <= self.base {
                return true;
            }

            let mut symbols = 0usize;
            backtrace::resolve_frame(frame, |symbol| {
                symbols += 1;
                if found.is_some() || inspected >= self.max_depth {
                    return;
                }
                inspected += 1;

                let Some(name) = symbol.name() else {
                    return;
                };
                let function = normalize_symbol(&format!("{:#}", name));

                if self.is_owned(&function) {
                    entered = true;
                    return;
                }
                // Anything inside the unwinder before our own frames.
                if !entered {
                    return;
                }
                if self.is_wrapper(&function) {
                    wrapped = true;
                    return;
                }

                let enclosing = enclosing_function(&function);
                if last_skipped.as_deref() == Some(enclosing) {
                    return;
                }
                if extra_left > 0 {
                    extra_left -= 1;
                    wrapped = true;
                    last_skipped = Some(enclosing.to_string());
                    return;
                }

                let (file, line) = match callsite {
                    Some(site) if !wrapped => (site.file.to_string(), site.line),
                    _ => (
                        symbol
                            .filename()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default(),
                        symbol.lineno().unwrap_or(0),
                    ),
                };
                found = Some(CallerFrame { function, file, line });
            });

            if symbols == 0 {
                inspected += 1;
            }
            found.is_none() && inspected < self.max_depth
        });

        found.unwrap_or_default()
    }

    pub(crate) fn is_owned(&self, function: &str) -> bool {
        let path = module_path(function);
        // `<F as core::ops::FnOnce>`: a generic self type has no module, the
        // impl lives with the trait.
        let path = match path.split_once(" as ") {
            Some((self_ty, trait_path)) if !self_ty.contains("::") => module_path(trait_path),
            _ => path,
        };
        self.owners.iter().any(|owner| belongs_to(path, owner))
    }

    fn is_wrapper(&self, function: &str) -> bool {
        let path = module_path(function);
        self.wrappers.iter().any(|module| belongs_to(path, module))
    }
}

/// Strip reference and pointer sigils from trait-impl symbols such as
/// `<&mut F as core::ops::FnOnce>::call_once`.
fn module_path(function: &str) -> &str {
    let mut path = function;
    loop {
        let trimmed = path
            .trim_start_matches(['<', '&', '*'])
            .trim_start_matches("mut ")
            .trim_start_matches("const ")
            .trim_start_matches("dyn ");
        if trimmed.len() == path.len() {
            return path;
        }
        path = trimmed;
    }
}

fn belongs_to(path: &str, module: &str) -> bool {
    match path.strip_prefix(module) {
        Some(rest) => rest.is_empty() || rest.starts_with("::") || rest.starts_with('<'),
        None => false,
    }
}

/// Drop the legacy mangling hash (`::h0123456789abcdef`) and LLVM clone
/// suffixes (`.llvm.1234`) if demangling left them in place.
fn normalize_symbol(name: &str) -> String {
    let mut name = name;
    if let Some(idx) = name.find(".llvm.") {
        name = &name[..idx];
    }
    if let Some((head, hash)) = name.rsplit_once("::h") {
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            name = head;
        }
    }
    name.to_string()
}

/// The function a closure or shim symbol is defined in:
/// `app::run::{{closure}}::{{closure}}` becomes `app::run`.
pub(crate) fn enclosing_function(function: &str) -> &str {
    let mut name = function;
    while let Some((head, tail)) = name.rsplit_once("::") {
        if !tail.starts_with('{') || head.is_empty() {
            break;
        }
        name = head;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOLVER_MODULE: &str = "tracing_caller_hook::stack::StackResolver";

    fn resolver(extra: usize) -> StackResolver {
        StackResolver::new(DEFAULT_STACK_SEARCH_OFFSET, extra, [RESOLVER_MODULE])
    }

    #[inline(never)]
    fn wrapper(resolver: &StackResolver) -> CallerFrame {
        let frame = resolver.caller();
        std::hint::black_box(frame)
    }

    #[inline(never)]
    fn wrapper_from(resolver: &StackResolver, callsite: Callsite<'_>) -> CallerFrame {
        let frame = resolver.caller_from(callsite);
        std::hint::black_box(frame)
    }

    const MACRO_SITE: Callsite<'static> = Callsite {
        file: "app/src/main.rs",
        line: 7,
    };

    #[test]
    fn resolves_the_calling_function() {
        let frame = resolver(0).caller();
        assert!(
            frame.function.ends_with("resolves_the_calling_function"),
            "unexpected caller {:?}",
            frame
        );
        assert!(frame.file.ends_with("stack.rs"));
        assert!(frame.line > 0);
    }

    #[test]
    fn extra_offset_skips_wrappers() {
        let direct = wrapper(&resolver(0));
        assert!(direct.function.ends_with("::wrapper"), "unexpected caller {:?}", direct);

        let skipped = wrapper(&resolver(1));
        assert!(
            skipped.function.ends_with("extra_offset_skips_wrappers"),
            "unexpected caller {:?}",
            skipped
        );
    }

    #[test]
    fn direct_caller_takes_the_callsite_location() {
        let frame = resolver(0).caller_from(MACRO_SITE);
        assert!(
            frame.function.ends_with("direct_caller_takes_the_callsite_location"),
            "unexpected caller {:?}",
            frame
        );
        assert_eq!(frame.file, "app/src/main.rs");
        assert_eq!(frame.line, 7);
    }

    #[test]
    fn skipped_wrappers_keep_the_stack_location() {
        let frame = wrapper_from(&resolver(1), MACRO_SITE);
        assert!(frame.function.ends_with("skipped_wrappers_keep_the_stack_location"));
        assert!(frame.file.ends_with("stack.rs"), "unexpected caller {:?}", frame);

        let resolver = resolver(0).with_wrapper_modules(["tracing_caller_hook::stack::tests::wrapper_from"]);
        let frame = wrapper_from(&resolver, MACRO_SITE);
        assert!(frame.function.ends_with("skipped_wrappers_keep_the_stack_location"));
        assert!(frame.file.ends_with("stack.rs"), "unexpected caller {:?}", frame);
        assert!(frame.line > 0);
    }

    #[test]
    fn location_is_required_to_count_as_resolved() {
        let symbol_only = CallerFrame {
            function: "app::main".to_string(),
            file: String::new(),
            line: 0,
        };
        assert!(!symbol_only.is_resolved());

        let located = CallerFrame {
            file: "src/main.rs".to_string(),
            line: 3,
            ..symbol_only
        };
        assert!(located.is_resolved());
    }

    #[test]
    fn empty_window_yields_zero_frame() {
        let frame = resolver(0).with_max_depth(0).caller();
        assert_eq!(frame, CallerFrame::default());
        assert!(!frame.is_resolved());
    }

    #[test]
    fn search_never_returns_owned_frames() {
        let resolver = StackResolver::new(DEFAULT_STACK_SEARCH_OFFSET, 0, ["tracing_caller_hook"])
            .with_max_depth(3);
        let frame = resolver.caller();
        assert!(!frame.function.starts_with("tracing_caller_hook"));
    }

    #[test]
    fn concurrent_callers_resolve_independently() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = resolver(0);
                std::thread::spawn(move || resolver.caller())
            })
            .collect();

        for handle in handles {
            let frame = handle.join().unwrap();
            assert!(
                frame.function.contains("concurrent_callers_resolve_independently"),
                "unexpected caller {:?}",
                frame
            );
        }
    }

    #[test]
    fn runtime_modules_are_always_owned() {
        let resolver = StackResolver::new(0, 0, ["my_logger"]);
        assert!(resolver.is_owned("std::thread::local::LocalKey<T>::with"));
        assert!(resolver.is_owned("<alloc::boxed::Box<F> as core::ops::FnOnce<A>>::call_once"));
        assert!(resolver.is_owned("<&mut F as core::ops::function::FnOnce<A>>::call_once"));
        assert!(resolver.is_owned("my_logger::facade::audit"));
        assert!(!resolver.is_owned("my_logger_ext::audit"));
        assert!(!resolver.is_owned("app::main"));
    }

    #[test]
    fn owner_match_respects_segment_boundaries() {
        assert!(belongs_to("tracing::__macro_support::Callsite::register", "tracing"));
        assert!(belongs_to("tracing", "tracing"));
        assert!(!belongs_to("tracing_core::event::Event::dispatch", "tracing"));
        assert!(belongs_to("tracing_core::event::Event::dispatch", "tracing_core"));
    }

    #[test]
    fn symbol_hashes_and_llvm_suffixes_are_dropped() {
        assert_eq!(normalize_symbol("app::run::h0123456789abcdef"), "app::run");
        assert_eq!(normalize_symbol("app::run.llvm.8812"), "app::run");
        assert_eq!(normalize_symbol("app::hash_map"), "app::hash_map");
    }

    #[test]
    fn closures_collapse_to_enclosing_function() {
        assert_eq!(enclosing_function("app::run::{{closure}}::{{closure}}"), "app::run");
        assert_eq!(enclosing_function("app::run::{closure#0}"), "app::run");
        assert_eq!(enclosing_function("app::run"), "app::run");
        assert_eq!(enclosing_function("{{closure}}"), "{{closure}}");
    }
}
