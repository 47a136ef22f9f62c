//! Every cairn call nests several Rust frames, so a call depth that fits comfortably on the main
//! thread can still overflow a smaller one.  Calls grow the stack on demand instead, which leaves
//! the configured call depth as the only limit on recursion.

/// If less than this much stack remains, a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// The size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if it is close to running out.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
