use anyhow::{bail, Context};
use inet_endpoint::{parse_to, run_once, OnceGuard};
use std::{
	sync::{
		atomic::{AtomicU64, AtomicUsize, Ordering},
		Mutex,
	},
	thread,
};
use test_log::test;

static CONFIG_INIT: OnceGuard = OnceGuard::new();
static TIMEOUT_MS: AtomicU64 = AtomicU64::new(0);
static INIT_CALLS: AtomicUsize = AtomicUsize::new(0);

fn load_timeout(text: &str) -> anyhow::Result<()> {
	INIT_CALLS.fetch_add(1, Ordering::SeqCst);

	let timeout: u64 = parse_to(text).context("invalid timeout")?;
	if timeout == 0 {
		bail!("timeout must not be zero");
	}

	TIMEOUT_MS.store(timeout, Ordering::SeqCst);
	Ok(())
}

#[test]
fn configuration_is_loaded_once_across_threads() {
	thread::scope(|scope| {
		for _ in 0..16 {
			scope.spawn(|| {
				run_once(&CONFIG_INIT, load_timeout, "0x1f4").unwrap();
				assert_eq!(TIMEOUT_MS.load(Ordering::SeqCst), 500);
			});
		}
	});

	assert_eq!(INIT_CALLS.load(Ordering::SeqCst), 1);
	assert!(CONFIG_INIT.is_completed());
	assert!(!CONFIG_INIT.has_failed());
}

#[test]
fn failed_initialization_is_reported_once() {
	let guard = OnceGuard::new();
	let reported = Mutex::new(Vec::new());

	thread::scope(|scope| {
		for _ in 0..8 {
			scope.spawn(|| {
				let result = guard.run_once(|| -> anyhow::Result<()> {
					let _timeout: u64 = parse_to("soon").context("invalid timeout")?;
					Ok(())
				});

				if let Err(error) = result {
					reported.lock().unwrap().push(format!("{error:#}"));
				}
			});
		}
	});

	let reported = reported.into_inner().unwrap();
	assert_eq!(reported, [r#"invalid timeout: invalid input: "soon""#]);
	assert!(guard.has_failed());
}
