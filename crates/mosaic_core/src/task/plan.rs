//! Composable units of work.

use std::fmt;

use super::Executor;

/// A unit of work that runs to completion once executed.
pub trait Plan: Send {
    /// Runs the plan, consuming it.
    fn execute(self, executor: &Executor);

    /// Runs `self`, then `next`.
    fn then<P: Plan>(self, next: P) -> Then<Self, P>
    where
        Self: Sized,
    {
        Then {
            first: self,
            second: next,
        }
    }

    /// Runs `self` and `other` with no ordering between them.
    fn and<P: Plan>(self, other: P) -> And<Self, P>
    where
        Self: Sized,
    {
        And {
            left: self,
            right: other,
        }
    }

    /// Runs `self` inside `span`.
    fn in_span(self, span: tracing::Span) -> InSpan<Self>
    where
        Self: Sized,
    {
        InSpan { plan: self, span }
    }
}

/// A plan that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitPlan;

impl Plan for UnitPlan {
    fn execute(self, _executor: &Executor) {}
}

/// A plan wrapping a single closure, run on the executing thread.
pub struct SimplePlan<F> {
    run: F,
}

impl<F: FnOnce() + Send> SimplePlan<F> {
    /// Wraps a closure.
    pub fn new(run: F) -> Self {
        Self { run }
    }
}

impl<F: FnOnce() + Send> Plan for SimplePlan<F> {
    fn execute(self, _executor: &Executor) {
        (self.run)();
    }
}

/// Visits every item of a collection with the same action.
///
/// Items are exclusive borrows, so the executor may visit them from any
/// thread without the action being able to observe another item.
pub struct RunOnAll<'a, T: ?Sized, F> {
    items: Vec<&'a mut T>,
    action: F,
}

impl<'a, T, F> RunOnAll<'a, T, F>
where
    T: ?Sized + Send,
    F: Fn(&mut T) + Send + Sync,
{
    /// Builds a plan over the given items.
    pub fn new(items: Vec<&'a mut T>, action: F) -> Self {
        Self { items, action }
    }

    /// Number of items that will be visited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there is nothing to visit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T, F> Plan for RunOnAll<'_, T, F>
where
    T: ?Sized + Send,
    F: Fn(&mut T) + Send + Sync,
{
    fn execute(mut self, executor: &Executor) {
        let action = &self.action;
        executor.for_each_mut(&mut self.items, |item| action(&mut **item));
    }
}

impl<T: ?Sized, F> fmt::Debug for RunOnAll<'_, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOnAll")
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

/// Two plans in sequence.
#[derive(Debug)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A: Plan, B: Plan> Plan for Then<A, B> {
    fn execute(self, executor: &Executor) {
        self.first.execute(executor);
        self.second.execute(executor);
    }
}

/// Two independent plans.
#[derive(Debug)]
pub struct And<A, B> {
    left: A,
    right: B,
}

impl<A: Plan, B: Plan> Plan for And<A, B> {
    fn execute(self, executor: &Executor) {
        let Self { left, right } = self;
        executor.join(|| left.execute(executor), || right.execute(executor));
    }
}

/// A plan entered into a tracing span for its whole execution.
#[derive(Debug)]
pub struct InSpan<P> {
    plan: P,
    span: tracing::Span,
}

impl<P: Plan> Plan for InSpan<P> {
    fn execute(self, executor: &Executor) {
        let _entered = self.span.enter();
        self.plan.execute(executor);
    }
}
