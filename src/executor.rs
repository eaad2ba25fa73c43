//! Execution units
//!
//! The serial engine and the reference clock each run on their own
//! independently scheduled worker. How a worker is obtained (an RTOS task, a
//! second core, an OS thread) is up to the platform; the driver only needs
//! [`Executor::launch`].

/// Source of concurrent execution units
pub trait Executor<'a> {
    /// Handle to a launched unit
    type Unit: ExecutionUnit;

    /// Run `job` on a fresh execution unit.
    ///
    /// Returns `None` if no unit is available.
    fn launch<F>(&self, job: F) -> Option<Self::Unit>
    where
        F: FnOnce() + Send + 'a;
}

/// A launched execution unit
pub trait ExecutionUnit {
    /// Wait for the unit's job to return
    fn join(self);
}

#[cfg(any(test, feature = "std"))]
pub use self::threads::{ScopedExecutor, ThreadExecutor};

#[cfg(any(test, feature = "std"))]
mod threads {
    use std::panic::resume_unwind;
    use std::thread::{Builder, JoinHandle, Scope, ScopedJoinHandle};

    use super::{ExecutionUnit, Executor};

    /// Detached OS threads
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ThreadExecutor {
        stack_size: Option<usize>,
    }

    impl ThreadExecutor {
        pub const fn new() -> Self {
            Self { stack_size: None }
        }

        #[must_use]
        pub const fn with_stack_size(mut self, bytes: usize) -> Self {
            self.stack_size = Some(bytes);
            self
        }

        fn builder(self) -> Builder {
            let builder = Builder::new();
            match self.stack_size {
                Some(bytes) => builder.stack_size(bytes),
                None => builder,
            }
        }
    }

    impl Executor<'static> for ThreadExecutor {
        type Unit = JoinHandle<()>;

        fn launch<F>(&self, job: F) -> Option<Self::Unit>
        where
            F: FnOnce() + Send + 'static,
        {
            self.builder().spawn(job).ok()
        }
    }

    impl ExecutionUnit for JoinHandle<()> {
        fn join(self) {
            if let Err(panic) = JoinHandle::join(self) {
                resume_unwind(panic);
            }
        }
    }

    /// Threads bound to a [`std::thread::scope`]
    #[derive(Debug, Clone, Copy)]
    pub struct ScopedExecutor<'scope, 'env> {
        scope: &'scope Scope<'scope, 'env>,
    }

    impl<'scope, 'env> ScopedExecutor<'scope, 'env> {
        pub const fn new(scope: &'scope Scope<'scope, 'env>) -> Self {
            Self { scope }
        }
    }

    impl<'scope> Executor<'scope> for ScopedExecutor<'scope, '_> {
        type Unit = ScopedJoinHandle<'scope, ()>;

        fn launch<F>(&self, job: F) -> Option<Self::Unit>
        where
            F: FnOnce() + Send + 'scope,
        {
            Builder::new().spawn_scoped(self.scope, job).ok()
        }
    }

    impl ExecutionUnit for ScopedJoinHandle<'_, ()> {
        fn join(self) {
            if let Err(panic) = ScopedJoinHandle::join(self) {
                resume_unwind(panic);
            }
        }
    }

}
