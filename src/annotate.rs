//! Scoped annotations attached to output streams: indentation depth and detail level.
//!
//! An [`Annotated`] stream wraps any [`io::Write`] and carries a small set of integer cells next to it. Each kind of annotation owns one process-wide [`SlotId`], which selects the same cell in every `Annotated` stream. [`Indent`] and [`DetailLevel`] are scope guards that change their cell when created and change it back when dropped, including during unwinding.
//!
//! ```
//! use inet_endpoint::annotate::{Annotated, DetailLevel, Indent};
//! use std::io::Write;
//!
//! # fn main() -> std::io::Result<()> {
//! let mut out = Annotated::new(Vec::<u8>::new());
//! writeln!(out, "server")?;
//! {
//! 	let mut out = Indent::new(&mut out, 1);
//! 	let mut out = DetailLevel::new(&mut out, 2);
//! 	let level = DetailLevel::current(&mut out);
//! 	out.write_indent()?;
//! 	writeln!(out, "detail {level}")?;
//! }
//! writeln!(out, "done")?;
//!
//! assert_eq!(out.get_ref(), b"server\n    detail 2\ndone\n");
//! # Ok(())
//! # }
//! ```
//!
//! Slot ids are allocated lazily, race-free, and only once per kind of annotation. The cells themselves are not synchronized: an `Annotated` stream is a plain value, and sharing one between threads requires a lock around it, like any other writer.

use std::{
	fmt::{self, Display, Formatter},
	io::{self, Write},
	ops::{Deref, DerefMut},
	sync::atomic::{AtomicUsize, Ordering},
};

#[cfg(test)]
use {
	std::{
		panic::{self, AssertUnwindSafe},
		thread,
	},
	test_log::test,
};

/// Text emitted for each level of indentation.
pub const INDENT_UNIT: &str = "    ";

/// Message written to a stream by [`DetailLevel::current`] when no `DetailLevel` has ever been created.
const DETAIL_HINT: &str = "Hint: wrap with inet_endpoint::annotate::DetailLevel\n";

const UNALLOCATED: usize = usize::MAX;

/// Hands out slot numbers. Allocation is irreversible: a number is never returned or reused.
static NEXT_SLOT: AtomicUsize = AtomicUsize::new(0);

static INDENT_SLOT: SlotId = SlotId::new("indent");
static DETAIL_SLOT: SlotId = SlotId::new("detail");

/// A process-wide identifier for one kind of per-stream annotation.
///
/// Every `SlotId` lives in a `static` in this module, one per kind of annotation. Its number is allocated the first time [`get_or_allocate`][Self::get_or_allocate] is called, and never changes after that. If several threads race to allocate it, all of them allocate a number, but exactly one number is published; the others are discarded (and wasted, since allocation can't be undone).
#[derive(Debug)]
pub struct SlotId {
	id: AtomicUsize,
	name: &'static str,
}

impl SlotId {
	/// Creates a new, not yet allocated `SlotId`. The `name` only appears in log messages.
	///
	/// Each allocated `SlotId` widens the cells of every stream that uses it, so this is only for `static`s.
	pub(crate) const fn new(name: &'static str) -> Self {
		Self {
			id: AtomicUsize::new(UNALLOCATED),
			name,
		}
	}

	/// Returns the slot number, or `None` if it hasn't been allocated yet.
	pub fn get(&self) -> Option<usize> {
		match self.id.load(Ordering::Acquire) {
			UNALLOCATED => None,
			id => Some(id),
		}
	}

	/// Returns the slot number, allocating it first if needed.
	pub fn get_or_allocate(&self) -> usize {
		if let Some(id) = self.get() {
			return id;
		}

		let new_id = NEXT_SLOT.fetch_add(1, Ordering::Relaxed);

		match self.id.compare_exchange(UNALLOCATED, new_id, Ordering::AcqRel, Ordering::Acquire) {
			Ok(_) => {
				tracing::debug!(slot = self.name, id = new_id, "allocated stream annotation slot");
				new_id
			},

			Err(winner) => {
				tracing::debug!(slot = self.name, id = winner, discarded = new_id, "lost race to allocate stream annotation slot");
				winner
			},
		}
	}
}

/// An output stream with annotation cells attached.
///
/// Writes go straight through to the wrapped writer. The cells start out as zero and are only changed through [`cell_mut`][Self::cell_mut], which is what [`Indent`] and [`DetailLevel`] use.
#[derive(Debug, Default)]
pub struct Annotated<W> {
	inner: W,
	cells: Vec<i64>,
}

impl<W> Annotated<W> {
	/// Wraps `inner`. All cells start at zero.
	pub fn new(inner: W) -> Self {
		Self {
			inner,
			cells: Vec::new(),
		}
	}

	/// Returns a reference to the wrapped writer.
	pub fn get_ref(&self) -> &W {
		&self.inner
	}

	/// Returns a mutable reference to the wrapped writer.
	pub fn get_mut(&mut self) -> &mut W {
		&mut self.inner
	}

	/// Unwraps this stream, discarding its annotations.
	pub fn into_inner(self) -> W {
		self.inner
	}

	/// Reads this stream's cell for `slot`. Zero if the cell was never written or `slot` was never allocated.
	pub fn cell(&self, slot: &SlotId) -> i64 {
		slot.get()
		.and_then(|id| self.cells.get(id))
		.copied()
		.unwrap_or_default()
	}

	/// Returns this stream's cell for `slot`, allocating `slot` if needed.
	pub fn cell_mut(&mut self, slot: &SlotId) -> &mut i64 {
		let id = slot.get_or_allocate();

		if self.cells.len() <= id {
			self.cells.resize(id + 1, 0);
		}

		&mut self.cells[id]
	}

	/// Returns the current indentation prefix of this stream. Display it to emit the indentation.
	///
	/// This only reads the indentation depth, so it can be called any number of times.
	pub fn indent(&self) -> IndentPrefix {
		IndentPrefix {
			depth: self.cell(&INDENT_SLOT),
		}
	}
}

impl<W: io::Write> Annotated<W> {
	/// Writes the current indentation prefix to this stream.
	pub fn write_indent(&mut self) -> io::Result<()> {
		let prefix = self.indent();
		write!(self.inner, "{prefix}")
	}
}

impl<W: io::Write> io::Write for Annotated<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.inner.write(buf)
	}

	fn write_vectored(&mut self, bufs: &[io::IoSlice<'_>]) -> io::Result<usize> {
		self.inner.write_vectored(bufs)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.inner.flush()
	}
}

/// An indentation prefix, as returned by [`Annotated::indent`]. Displays as [`INDENT_UNIT`] repeated `depth` times.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndentPrefix {
	/// The indentation depth. Zero or negative means no indentation.
	pub depth: i64,
}

impl Display for IndentPrefix {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		for _ in 0..self.depth.max(0) {
			f.write_str(INDENT_UNIT)?;
		}

		Ok(())
	}
}

/// Increases the indentation depth of a stream while it lives.
///
/// `Indent`s nest: their depths add up. Writing through an `Indent` writes to the underlying stream.
#[derive(Debug)]
pub struct Indent<'a, W> {
	stream: &'a mut Annotated<W>,
	depth: i64,
}

impl<'a, W> Indent<'a, W> {
	/// Adds `depth` to the indentation depth of `stream`, until the returned guard is dropped.
	pub fn new(stream: &'a mut Annotated<W>, depth: i64) -> Self {
		*stream.cell_mut(&INDENT_SLOT) += depth;
		Self { stream, depth }
	}
}

impl<W> Drop for Indent<'_, W> {
	fn drop(&mut self) {
		*self.stream.cell_mut(&INDENT_SLOT) -= self.depth;
	}
}

impl<W> Deref for Indent<'_, W> {
	type Target = Annotated<W>;

	fn deref(&self) -> &Self::Target {
		self.stream
	}
}

impl<W> DerefMut for Indent<'_, W> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.stream
	}
}

/// Sets the detail level of a stream while it lives.
///
/// Code that formats values can check [`DetailLevel::current`] to decide how much to print. Unlike [`Indent`], nested `DetailLevel`s don't add up; the innermost one wins, and the previous level comes back when it is dropped.
#[derive(Debug)]
pub struct DetailLevel<'a, W> {
	stream: &'a mut Annotated<W>,
	previous: i64,
}

impl<'a, W> DetailLevel<'a, W> {
	/// Sets the detail level of `stream` to `level`, until the returned guard is dropped.
	pub fn new(stream: &'a mut Annotated<W>, level: i64) -> Self {
		let cell = stream.cell_mut(&DETAIL_SLOT);
		let previous = *cell;
		*cell = level;

		Self { stream, previous }
	}
}

impl<W: io::Write> DetailLevel<'_, W> {
	/// Returns the detail level of `stream`. Zero if it was never set.
	///
	/// If no `DetailLevel` has been created anywhere in this process yet, this also writes a one-line hint to `stream`, as a reminder to wrap the stream in a `DetailLevel`. Errors writing the hint are ignored.
	pub fn current(stream: &mut Annotated<W>) -> i64 {
		level_or_hint(stream, &DETAIL_SLOT)
	}
}

fn level_or_hint<W: io::Write>(stream: &mut Annotated<W>, slot: &SlotId) -> i64 {
	if slot.get().is_none() {
		tracing::info!("detail level requested, but no DetailLevel has been used yet");
		if let Err(error) = stream.inner.write_all(DETAIL_HINT.as_bytes()) {
			tracing::debug!(%error, "could not write DetailLevel hint to stream");
		}

		return 0;
	}

	stream.cell(slot)
}

impl<W> Drop for DetailLevel<'_, W> {
	fn drop(&mut self) {
		*self.stream.cell_mut(&DETAIL_SLOT) = self.previous;
	}
}

impl<W> Deref for DetailLevel<'_, W> {
	type Target = Annotated<W>;

	fn deref(&self) -> &Self::Target {
		self.stream
	}
}

impl<W> DerefMut for DetailLevel<'_, W> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		self.stream
	}
}

#[cfg(test)]
fn output(stream: Annotated<Vec<u8>>) -> String {
	String::from_utf8(stream.into_inner()).unwrap()
}

#[test]
fn test_indent_nesting() {
	let mut out = Annotated::new(Vec::new());

	out.write_indent().unwrap();
	writeln!(out, "a").unwrap();

	{
		let mut out = Indent::new(&mut out, 1);
		out.write_indent().unwrap();
		writeln!(out, "b").unwrap();

		{
			let mut out = Indent::new(&mut out, 2);
			assert_eq!(out.indent(), IndentPrefix { depth: 3 });
			assert_eq!(out.indent(), IndentPrefix { depth: 3 });
			out.write_indent().unwrap();
			writeln!(out, "c").unwrap();
		}

		out.write_indent().unwrap();
		writeln!(out, "d").unwrap();
	}

	assert_eq!(out.indent().depth, 0);
	assert_eq!(output(out), "a\n    b\n            c\n    d\n");
}

#[test]
fn test_indent_restored_on_unwind() {
	let mut out = Annotated::new(Vec::<u8>::new());

	let result = panic::catch_unwind(AssertUnwindSafe(|| {
		let _indent = Indent::new(&mut out, 4);
		panic!("formatting failed");
	}));

	assert!(result.is_err());
	assert_eq!(out.indent().depth, 0);
}

#[test]
fn test_negative_indent_prints_nothing() {
	assert_eq!(IndentPrefix { depth: -2 }.to_string(), "");
	assert_eq!(IndentPrefix { depth: 2 }.to_string(), "        ");
}

#[test]
fn test_detail_level_restores_previous() {
	let mut out = Annotated::new(Vec::new());

	{
		let mut out = DetailLevel::new(&mut out, 1);
		assert_eq!(DetailLevel::current(&mut out), 1);

		{
			let mut out = DetailLevel::new(&mut out, 5);
			assert_eq!(DetailLevel::current(&mut out), 5);
		}

		assert_eq!(DetailLevel::current(&mut out), 1);
	}

	assert_eq!(DetailLevel::current(&mut out), 0);
	assert_eq!(output(out), "");
}

#[test]
fn test_streams_are_independent() {
	let mut first = Annotated::new(Vec::<u8>::new());
	let mut second = Annotated::new(Vec::<u8>::new());

	let first = Indent::new(&mut first, 2);
	let mut second = DetailLevel::new(&mut second, 3);

	assert_eq!(first.indent().depth, 2);
	assert_eq!(second.indent().depth, 0);
	assert_eq!(first.cell(&DETAIL_SLOT), 0);
	assert_eq!(DetailLevel::current(&mut second), 3);
}

#[test]
fn test_hint_when_never_allocated() {
	static NEVER_USED: SlotId = SlotId::new("never used");

	let mut out = Annotated::new(Vec::new());

	assert_eq!(level_or_hint(&mut out, &NEVER_USED), 0);
	assert_eq!(NEVER_USED.get(), None);
	assert_eq!(output(out), DETAIL_HINT);
}

#[test]
fn test_hint_write_error_is_ignored() {
	struct Broken;

	impl io::Write for Broken {
		fn write(&mut self, _: &[u8]) -> io::Result<usize> {
			Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	static NEVER_USED: SlotId = SlotId::new("never used, broken stream");

	let mut out = Annotated::new(Broken);
	assert_eq!(level_or_hint(&mut out, &NEVER_USED), 0);
	assert_eq!(NEVER_USED.get(), None);
}

#[test]
fn test_cells_stay_small() {
	let mut first = Annotated::new(Vec::<u8>::new());
	let mut second = Annotated::new(Vec::<u8>::new());

	for depth in 0..100 {
		let mut first = Indent::new(&mut first, depth);
		let _first = DetailLevel::new(&mut first, depth);
		let mut second = DetailLevel::new(&mut second, depth);
		let _second = Indent::new(&mut second, depth);
	}

	// Only the two built-in slots are ever allocated for these streams, so the cells never grow past them.
	let widest = INDENT_SLOT.get().unwrap().max(DETAIL_SLOT.get().unwrap()) + 1;
	assert!(first.cells.len() <= widest);
	assert!(second.cells.len() <= widest);
	assert_eq!(first.cell(&INDENT_SLOT), 0);
	assert_eq!(second.cell(&DETAIL_SLOT), 0);
}

#[test]
fn test_slot_allocation_race() {
	let slot = SlotId::new("race");

	let ids: Vec<usize> = thread::scope(|scope| {
		let handles: Vec<_> =
			(0..16)
			.map(|_| scope.spawn(|| slot.get_or_allocate()))
			.collect();

		handles.into_iter()
		.map(|handle| handle.join().unwrap())
		.collect()
	});

	let published = slot.get().unwrap();
	assert!(ids.iter().all(|id| *id == published));
	assert_eq!(slot.get_or_allocate(), published);
}
