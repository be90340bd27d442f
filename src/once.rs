use std::{
	any::Any,
	fmt::{self, Debug, Formatter},
	panic::{self, AssertUnwindSafe},
	sync::{
		atomic::{AtomicBool, Ordering},
		Once,
	},
};

#[cfg(test)]
use {
	assert_matches::assert_matches,
	std::{
		sync::atomic::AtomicUsize,
		thread,
	},
	test_log::test,
};

/// A run-once gate whose callback may fail.
///
/// [`std::sync::Once::call_once`] runs its closure at most once and makes every other caller wait for it, but the closure can't return anything, and a panic inside it poisons the `Once` for good. `OnceGuard` wraps a `Once` so that the closure can return a `Result`:
///
/// * The closure runs at most once per `OnceGuard`, on whichever thread gets there first. Every other thread calling [`run_once`][Self::run_once] blocks until it has finished, and then sees its effects.
/// * If the closure returns an error, that error is returned from `run_once` in the thread that ran it.
/// * If the closure panics, the panic is caught, the gate is closed normally, and then the panic is resumed in the thread that ran it.
///
///
/// # Failures are permanent
///
/// A gate that has been used can't be reset. If the closure fails, it is *not* retried: every later call to `run_once` returns `Ok(())` without doing anything, and so do calls that were blocked waiting while the failing run happened. Only the thread that ran the closure sees the error.
///
/// Use [`has_failed`][Self::has_failed] to find out whether the one and only run failed.
///
///
/// # Example
///
/// ```
/// use inet_endpoint::OnceGuard;
///
/// static INIT: OnceGuard = OnceGuard::new();
///
/// fn init() -> Result<(), std::io::Error> {
/// 	INIT.run_once(|| {
/// 		// …one-time setup that might fail…
/// 		Ok(())
/// 	})
/// }
///
/// init().unwrap();
/// init().unwrap(); // Does nothing.
/// assert!(INIT.is_completed());
/// ```
pub struct OnceGuard {
	once: Once,
	failed: AtomicBool,
}

/// What happened during one call to the gated closure. Lives only on the stack of the thread that ran it.
struct OnceInvocation<E> {
	failure: Option<Failure<E>>,
}

enum Failure<E> {
	Error(E),
	Panic(Box<dyn Any + Send + 'static>),
}

impl OnceGuard {
	/// Creates a new, unused `OnceGuard`.
	pub const fn new() -> Self {
		Self {
			once: Once::new(),
			failed: AtomicBool::new(false),
		}
	}

	/// Runs `f` if and only if no call to `run_once` on this `OnceGuard` has run a closure yet.
	///
	/// If another thread is running a closure on this `OnceGuard` right now, this blocks until it's done.
	///
	///
	/// # Errors
	///
	/// Returns the error returned by `f`, if this call ran `f` and it failed. See [the type documentation][OnceGuard] for what other callers see.
	///
	///
	/// # Panics
	///
	/// If this call ran `f` and `f` panicked, the panic is resumed here, after the gate is closed.
	pub fn run_once<F, E>(&self, f: F) -> Result<(), E>
	where F: FnOnce() -> Result<(), E> {
		let mut invocation = OnceInvocation { failure: None };

		self.once.call_once(|| {
			invocation.failure = match panic::catch_unwind(AssertUnwindSafe(f)) {
				Ok(Ok(())) => None,
				Ok(Err(error)) => Some(Failure::Error(error)),
				Err(payload) => Some(Failure::Panic(payload)),
			};

			if invocation.failure.is_some() {
				self.failed.store(true, Ordering::Release);
			}
		});

		match invocation.failure {
			None => Ok(()),

			Some(Failure::Error(error)) => {
				tracing::warn!("run-once initialization failed; it will not be retried");
				Err(error)
			},

			Some(Failure::Panic(payload)) => {
				tracing::warn!("run-once initialization panicked; it will not be retried");
				panic::resume_unwind(payload)
			},
		}
	}

	/// Returns true if a closure has been run to completion (successfully or not) on this `OnceGuard`.
	pub fn is_completed(&self) -> bool {
		self.once.is_completed()
	}

	/// Returns true if a closure was run on this `OnceGuard` and it returned an error or panicked.
	pub fn has_failed(&self) -> bool {
		self.failed.load(Ordering::Acquire)
	}
}

impl Default for OnceGuard {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for OnceGuard {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		f.debug_struct("OnceGuard")
		.field("completed", &self.is_completed())
		.field("failed", &self.has_failed())
		.finish()
	}
}

/// Runs `f(arg)` through `guard`, at most once. This is [`OnceGuard::run_once`] for callers that have a plain function and an argument rather than a closure.
///
/// `arg` is dropped without being used if the gate has already been used.
pub fn run_once<A, E>(guard: &OnceGuard, f: fn(A) -> Result<(), E>, arg: A) -> Result<(), E> {
	guard.run_once(move || f(arg))
}

#[test]
fn test_run_once_success() {
	let guard = OnceGuard::new();
	let mut runs = 0;

	assert!(!guard.is_completed());

	for _ in 0..3 {
		guard.run_once(|| -> Result<(), ()> {
			runs += 1;
			Ok(())
		}).unwrap();
	}

	assert_eq!(runs, 1);
	assert!(guard.is_completed());
	assert!(!guard.has_failed());
}

#[test]
fn test_run_once_error_is_permanent() {
	let guard = OnceGuard::default();

	assert_matches!(
		guard.run_once(|| Err("boom")),
		Err("boom")
	);

	assert!(guard.is_completed());
	assert!(guard.has_failed());

	// Not retried, and not reported again.
	let mut retried = false;
	assert_matches!(
		guard.run_once(|| -> Result<(), &str> {
			retried = true;
			Ok(())
		}),
		Ok(())
	);
	assert!(!retried);
}

#[test]
fn test_run_once_panic_does_not_poison() {
	let guard = OnceGuard::new();

	let result = panic::catch_unwind(AssertUnwindSafe(|| {
		guard.run_once(|| -> Result<(), ()> { panic!("gated closure panicked") })
	}));

	let payload = result.unwrap_err();
	assert_eq!(payload.downcast_ref::<&str>(), Some(&"gated closure panicked"));

	assert!(guard.is_completed());
	assert!(guard.has_failed());
	assert_matches!(guard.run_once(|| -> Result<(), ()> { unreachable!() }), Ok(()));
}

#[test]
fn test_run_once_fn_pointer() {
	static COUNT: AtomicUsize = AtomicUsize::new(0);

	fn add(amount: usize) -> Result<(), String> {
		COUNT.fetch_add(amount, Ordering::Relaxed);
		Ok(())
	}

	let guard = OnceGuard::new();
	run_once(&guard, add, 5).unwrap();
	run_once(&guard, add, 7).unwrap();

	assert_eq!(COUNT.load(Ordering::Relaxed), 5);
}

#[test]
fn test_run_once_threads() {
	for thread_count in [1, 2, 8, 32] {
		let guard = OnceGuard::new();
		let counter = AtomicUsize::new(0);

		thread::scope(|scope| {
			for _ in 0..thread_count {
				scope.spawn(|| {
					guard.run_once(|| -> Result<(), ()> {
						counter.fetch_add(1, Ordering::Relaxed);
						Ok(())
					}).unwrap();

					// The gated effect is visible as soon as `run_once` returns.
					assert_eq!(counter.load(Ordering::Relaxed), 1);
				});
			}
		});

		assert_eq!(counter.load(Ordering::Relaxed), 1);
	}
}
