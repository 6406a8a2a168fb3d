//! Controller-owned mutable state and the processing guard.

// crates.io
use futures_util::future::AbortHandle;
// self
use crate::{
	_prelude::*,
	flow::FlowState,
	operation::ClientOperationHandler,
	profile::Profile,
};

/// Configuration captured when a flow starts.
#[derive(Debug)]
pub(crate) struct Session {
	pub(crate) profile: Profile,
	pub(crate) pkce_verifier: Option<String>,
}

/// State shared by all clones of one controller.
///
/// Locked only for short synchronous sections; never across `.await`.
#[derive(Debug, Default)]
pub(crate) struct ControllerInner {
	pub(crate) state: FlowState,
	pub(crate) processing: bool,
	pub(crate) generation: u64,
	pub(crate) session: Option<Arc<Session>>,
	pub(crate) client_operation: Option<Arc<dyn ClientOperationHandler>>,
	pub(crate) awaiting_external: bool,
	pub(crate) token_exchange: Option<AbortHandle>,
}
impl ControllerInner {
	/// Clears everything tied to the current session and moves to a new generation.
	pub(crate) fn invalidate(&mut self) {
		self.generation = self.generation.wrapping_add(1);

		if let Some(handle) = self.token_exchange.take() {
			handle.abort();
		}

		self.session = None;
		self.client_operation = None;
		self.awaiting_external = false;
		self.processing = false;
	}
}

/// Owns the processing flag for one pipeline run.
///
/// Dropping the guard clears the flag unless the guard was held for an operation awaiting
/// external input or the controller moved to a newer generation in the meantime.
#[derive(Debug)]
pub(crate) struct ProcessingGuard {
	inner: Arc<Mutex<ControllerInner>>,
	generation: u64,
	session: Option<Arc<Session>>,
	held: bool,
}
impl ProcessingGuard {
	/// Sets the processing flag, or returns `None` when another operation owns it.
	pub(crate) fn try_begin(inner: &Arc<Mutex<ControllerInner>>) -> Option<Self> {
		let mut locked = inner.lock();

		if locked.processing {
			return None;
		}

		locked.processing = true;

		Some(Self {
			inner: inner.clone(),
			generation: locked.generation,
			session: locked.session.clone(),
			held: false,
		})
	}

	/// Takes over a flag held for an operation awaiting external input.
	pub(crate) fn adopt(inner: &Arc<Mutex<ControllerInner>>, locked: &mut ControllerInner) -> Self {
		locked.processing = true;
		locked.awaiting_external = false;
		locked.client_operation = None;

		Self {
			inner: inner.clone(),
			generation: locked.generation,
			session: locked.session.clone(),
			held: false,
		}
	}

	/// Replaces the session with a fresh one and moves to a new generation.
	///
	/// Returns `false` when a reset intervened since the guard was taken.
	pub(crate) fn begin_session(&mut self, session: Session) -> bool {
		let session = Arc::new(session);
		let mut locked = self.inner.lock();

		if locked.generation != self.generation {
			return false;
		}

		locked.invalidate();
		locked.processing = true;
		locked.session = Some(session.clone());
		self.generation = locked.generation;
		self.session = Some(session);

		true
	}

	/// Keeps the processing flag set after the guard drops.
	pub(crate) fn hold(&mut self) {
		self.held = true;
	}

	pub(crate) fn generation(&self) -> u64 {
		self.generation
	}

	pub(crate) fn session(&self) -> Option<Arc<Session>> {
		self.session.clone()
	}

	/// Returns `true` while no reset happened since the guard was taken.
	pub(crate) fn is_current(&self) -> bool {
		self.inner.lock().generation == self.generation
	}
}
impl Drop for ProcessingGuard {
	fn drop(&mut self) {
		if self.held {
			return;
		}

		let mut locked = self.inner.lock();

		if locked.generation == self.generation {
			locked.processing = false;
		}
	}
}
