//! Nested execution-phase tracking.
//!
//! An [`ExecutionContext`] is a stack of [`Frame`]s. Every entry point that
//! runs a circuit body pushes a frame describing the phase it runs in and pops
//! it again on every exit path. The innermost frame is the "current" state;
//! an empty stack reads as the all-false default.

use std::cell::{Cell, RefCell};
use std::fmt;

use log::{debug, error};

use crate::error::ProvableError;

/// Phase flags of one context scope.
///
/// Build partial frames with struct-update syntax; omitted flags are `false`:
///
/// ```
/// use snarkctx::context::Frame;
///
/// let frame = Frame { in_analyze: true, in_checked_computation: true, ..Frame::default() };
/// assert!(!frame.in_prover);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub in_prover: bool,
    pub in_compile: bool,
    pub in_checked_computation: bool,
    pub in_analyze: bool,
    pub in_witness_block: bool,
}

/// Identifies the frame pushed by one [`ExecutionContext::enter`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct ExecutionContext {
    frames: RefCell<Vec<(ContextId, Frame)>>,
    next_id: Cell<u64>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `frame` and return the id that must be handed back to [`leave`](Self::leave).
    pub fn enter(&self, frame: Frame) -> ContextId {
        let id = ContextId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let mut frames = self.frames.borrow_mut();
        frames.push((id, frame));
        debug!("Entered context {} at depth {}: {:?}", id, frames.len(), frame);
        id
    }

    /// Pop the innermost frame.
    ///
    /// The frame is popped even when `id` does not match it; the mismatch is
    /// still reported, since it means a caller broke the nesting discipline.
    pub fn leave(&self, id: ContextId) -> Result<(), ProvableError> {
        let popped = self.frames.borrow_mut().pop().map(|(top, _)| top);
        match popped {
            Some(top) if top == id => {
                debug!("Left context {}", id);
                Ok(())
            }
            expected => Err(ProvableError::ContextMismatch { expected, found: id }),
        }
    }

    pub fn current(&self) -> Frame {
        self.frames
            .borrow()
            .last()
            .map(|(_, frame)| *frame)
            .unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn in_prover_mode(&self) -> bool {
        self.current().in_prover
    }

    pub fn in_compile(&self) -> bool {
        self.current().in_compile
    }

    pub fn in_analyze(&self) -> bool {
        self.current().in_analyze
    }

    pub fn in_witness_block(&self) -> bool {
        self.current().in_witness_block
    }

    /// Compiling or analyzing: only the circuit shape is being traced.
    pub fn in_compile_mode(&self) -> bool {
        let frame = self.current();
        frame.in_compile || frame.in_analyze
    }

    pub fn in_checked_computation(&self) -> bool {
        let frame = self.current();
        frame.in_compile || frame.in_prover || frame.in_checked_computation
    }

    /// Enter `frame` for the lifetime of the returned guard.
    pub fn scope(&self, frame: Frame) -> ContextGuard<'_> {
        ContextGuard {
            context: self,
            id: Some(self.enter(frame)),
        }
    }

    /// Run `f` inside `frame`, leaving again on every exit path.
    pub fn run<R>(&self, frame: Frame, f: impl FnOnce() -> R) -> Result<R, ProvableError> {
        let guard = self.scope(frame);
        let result = f();
        guard.close()?;
        Ok(result)
    }
}

/// Scoped frame acquisition. Leaves the frame when closed or dropped.
#[must_use = "dropping the guard leaves the context immediately"]
pub struct ContextGuard<'a> {
    context: &'a ExecutionContext,
    id: Option<ContextId>,
}

impl ContextGuard<'_> {
    pub fn id(&self) -> Option<ContextId> {
        self.id
    }

    /// Leave the frame, surfacing a nesting violation to the caller.
    pub fn close(mut self) -> Result<(), ProvableError> {
        match self.id.take() {
            Some(id) => self.context.leave(id),
            None => Ok(()),
        }
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            if let Err(e) = self.context.leave(id) {
                error!("Context guard released out of order: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked() -> Frame {
        Frame {
            in_checked_computation: true,
            ..Frame::default()
        }
    }

    #[test]
    fn empty_stack_reads_as_default() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.current(), Frame::default());
        assert!(!ctx.in_checked_computation());
        assert!(!ctx.in_compile_mode());
        assert!(!ctx.in_prover_mode());
    }

    #[test]
    fn enter_does_not_inherit_outer_flags() {
        let ctx = ExecutionContext::new();
        let outer = ctx.enter(Frame {
            in_prover: true,
            ..Frame::default()
        });
        let inner = ctx.enter(Frame {
            in_analyze: true,
            ..Frame::default()
        });
        assert!(!ctx.in_prover_mode());
        assert!(ctx.in_compile_mode());
        assert!(ctx.in_analyze());
        ctx.leave(inner).unwrap();
        assert!(ctx.in_prover_mode());
        ctx.leave(outer).unwrap();
    }

    #[test]
    fn derived_queries() {
        let ctx = ExecutionContext::new();
        let cases = [
            (Frame { in_compile: true, ..Frame::default() }, true, true),
            (Frame { in_analyze: true, ..Frame::default() }, false, true),
            (Frame { in_prover: true, ..Frame::default() }, true, false),
            (checked(), true, false),
            (Frame { in_witness_block: true, ..Frame::default() }, false, false),
        ];
        for (frame, checked, compile) in cases {
            let id = ctx.enter(frame);
            assert_eq!(ctx.in_checked_computation(), checked, "{:?}", frame);
            assert_eq!(ctx.in_compile_mode(), compile, "{:?}", frame);
            ctx.leave(id).unwrap();
        }
    }

    #[test]
    fn well_nested_sequences_unwind_to_default() {
        let ctx = ExecutionContext::new();
        let frames = [
            checked(),
            Frame { in_compile: true, ..Frame::default() },
            Frame { in_witness_block: true, in_prover: true, ..Frame::default() },
            Frame { in_analyze: true, in_checked_computation: true, ..Frame::default() },
        ];
        for depth in 1..=frames.len() {
            let ids: Vec<_> = frames[..depth].iter().map(|f| ctx.enter(*f)).collect();
            assert_eq!(ctx.depth(), depth);
            assert_eq!(ctx.current(), frames[depth - 1]);
            for id in ids.into_iter().rev() {
                ctx.leave(id).unwrap();
            }
            assert_eq!(ctx.current(), Frame::default());
        }
    }

    #[test]
    fn out_of_order_leave_is_a_mismatch() {
        let ctx = ExecutionContext::new();
        let outer = ctx.enter(checked());
        let inner = ctx.enter(checked());
        let err = ctx.leave(outer).unwrap_err();
        assert!(matches!(
            err,
            ProvableError::ContextMismatch { expected: Some(e), found } if e == inner && found == outer
        ));
    }

    #[test]
    fn leave_on_empty_stack_is_a_mismatch() {
        let ctx = ExecutionContext::new();
        let id = ctx.enter(checked());
        ctx.leave(id).unwrap();
        assert!(matches!(
            ctx.leave(id),
            Err(ProvableError::ContextMismatch { expected: None, .. })
        ));
    }

    #[test]
    fn guard_leaves_on_drop_and_on_panic() {
        let ctx = ExecutionContext::new();
        {
            let _guard = ctx.scope(checked());
            assert!(ctx.in_checked_computation());
        }
        assert_eq!(ctx.depth(), 0);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ctx.scope(checked());
            panic!("body failed");
        }));
        assert!(result.is_err());
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn run_returns_the_closure_result() {
        let ctx = ExecutionContext::new();
        let seen = ctx.run(checked(), || ctx.in_checked_computation()).unwrap();
        assert!(seen);
        assert!(!ctx.in_checked_computation());
    }
}
