//! Caller attribution.
//!
//! # Responsibility
//! - Map "who is calling" to a code origin and then to a mod record.
//! - Keep the resolution mechanism behind [`CallerResolver`] so the rest of
//!   the crate never depends on how it works.
//!
//! # Invariants
//! - Resolution is best-effort: it returns `None` instead of failing or
//!   panicking.
//! - Frames owned by this crate are skipped; the first frame outside it
//!   decides the answer.

use crate::model::mod_record::{CodeOrigin, ModRecord};
use crate::registry::mod_registry::ModRegistry;
use log::debug;
use std::cell::RefCell;
use std::marker::PhantomData;

/// Resolves the code origin of the current logical requester.
pub trait CallerResolver {
    fn resolve_caller_origin(&self) -> Option<CodeOrigin>;
}

/// Host-provided resolution hook, e.g. a closure over the host's own
/// execution-context API.
impl<F> CallerResolver for F
where
    F: Fn() -> Option<CodeOrigin>,
{
    fn resolve_caller_origin(&self) -> Option<CodeOrigin> {
        self()
    }
}

/// Caller identity passed explicitly by the requesting mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplicitCaller(Option<CodeOrigin>);

impl ExplicitCaller {
    pub fn new(origin: CodeOrigin) -> Self {
        Self(Some(origin))
    }

    /// Call issued by host-native code with no mod behind it.
    pub fn host() -> Self {
        Self(None)
    }
}

impl CallerResolver for ExplicitCaller {
    fn resolve_caller_origin(&self) -> Option<CodeOrigin> {
        self.0
    }
}

/// Owner of one logical call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOwner {
    /// Code inside this crate; never reported as the caller.
    Core,
    /// Host-native code; ends the walk with no caller.
    Host,
    /// Code loaded from one mod.
    Extension(CodeOrigin),
}

thread_local! {
    static CALL_FRAMES: RefCell<Vec<FrameOwner>> = const { RefCell::new(Vec::new()) };
}

/// Scope guard for one pushed frame; pops it (and anything above it) on drop.
#[must_use = "the frame is popped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FrameGuard {
    depth: usize,
    // Frames live in thread-local storage; the guard must stay on its thread.
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        let _ = CALL_FRAMES.try_with(|frames| {
            if let Ok(mut frames) = frames.try_borrow_mut() {
                frames.truncate(self.depth);
            }
        });
    }
}

/// Pushes one frame onto the current thread's call chain.
pub fn enter_frame(owner: FrameOwner) -> FrameGuard {
    let depth = CALL_FRAMES
        .try_with(|frames| match frames.try_borrow_mut() {
            Ok(mut frames) => {
                let depth = frames.len();
                frames.push(owner);
                depth
            }
            Err(_) => usize::MAX,
        })
        .unwrap_or(usize::MAX);

    FrameGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Marks the current scope as running code from the mod loaded as `origin`.
pub fn enter_extension(origin: CodeOrigin) -> FrameGuard {
    enter_frame(FrameOwner::Extension(origin))
}

/// Marks the current scope as host-native code.
pub fn enter_host() -> FrameGuard {
    enter_frame(FrameOwner::Host)
}

pub(crate) fn enter_core() -> FrameGuard {
    enter_frame(FrameOwner::Core)
}

/// Resolver walking the thread-local frame chain maintained by
/// [`enter_extension`] / [`enter_host`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CallFrames;

impl CallerResolver for CallFrames {
    fn resolve_caller_origin(&self) -> Option<CodeOrigin> {
        CALL_FRAMES
            .try_with(|frames| {
                let frames = frames.try_borrow().ok()?;
                let owner = frames
                    .iter()
                    .rev()
                    .find(|owner| **owner != FrameOwner::Core)?;
                match owner {
                    FrameOwner::Extension(origin) => Some(*origin),
                    FrameOwner::Host | FrameOwner::Core => None,
                }
            })
            .ok()
            .flatten()
    }
}

/// Returns the record of the mod that issued the current call, if any.
pub fn get_calling_mod<'a>(
    registry: &'a ModRegistry,
    resolver: &impl CallerResolver,
) -> Option<&'a ModRecord> {
    let _frame = enter_core();
    let Some(origin) = resolver.resolve_caller_origin() else {
        debug!("event=caller_resolve module=registry status=none");
        return None;
    };

    let record = registry.find_by_origin(origin);
    match record {
        Some(record) => debug!(
            "event=caller_resolve module=registry status=ok mod_id={}",
            record.id
        ),
        None => debug!(
            "event=caller_resolve module=registry status=unknown_origin origin={}",
            origin
        ),
    }
    record
}
