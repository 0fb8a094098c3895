use std::fmt;
use std::sync::{
	Mutex,
	MutexGuard,
};

use super::{
	Dispatch,
	SysexHandler,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

struct Registry {
	next_id: u64,
	handlers: Vec<(SubscriptionId, SysexHandler)>,
	closed: bool,
}

/// Subscribers waiting for inbound sysex frames
///
/// Handlers run on the thread calling `dispatch` (the port reader) with the
/// registry locked; they must not subscribe or cancel themselves.
pub struct SysexEvents {
	registry: Mutex<Registry>,
}

impl Default for SysexEvents {
	fn default() -> Self {
		SysexEvents {
			registry: Mutex::new(Registry {
				next_id: 0,
				handlers: Vec::new(),
				closed: false,
			}),
		}
	}
}

impl SysexEvents {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<Registry> {
		// a panicking handler must not take the whole port down
		self.registry.lock().unwrap_or_else(|e| e.into_inner())
	}

	pub fn subscribe(&self, handler: SysexHandler) -> crate::AResult<SubscriptionId> {
		let mut registry = self.lock();
		ensure!(!registry.closed, "sysex event stream closed");
		let id = SubscriptionId(registry.next_id);
		registry.next_id += 1;
		registry.handlers.push((id, handler));
		trace!("sysex subscription {} registered", id);
		Ok(id)
	}

	pub fn cancel(&self, id: SubscriptionId) {
		let mut registry = self.lock();
		if let Some(pos) = registry.handlers.iter().position(|(h_id, _)| *h_id == id) {
			registry.handlers.remove(pos);
			trace!("sysex subscription {} cancelled", id);
		}
	}

	/// Offer a frame to the subscribers in registration order; the first one
	/// consuming it is removed. Returns whether anyone consumed it.
	pub fn dispatch(&self, raw: &[u8]) -> bool {
		let mut registry = self.lock();
		for pos in 0..registry.handlers.len() {
			if (registry.handlers[pos].1)(raw) == Dispatch::Consumed {
				let (id, _) = registry.handlers.remove(pos);
				trace!("sysex subscription {} consumed frame", id);
				return true;
			}
		}
		false
	}

	/// Drops all handlers without calling them and refuses new subscriptions
	pub fn close(&self) {
		let mut registry = self.lock();
		registry.closed = true;
		let dropped = registry.handlers.len();
		registry.handlers.clear();
		if dropped > 0 {
			debug!("sysex event stream closed, dropped {} pending subscriptions", dropped);
		}
	}

	pub fn is_closed(&self) -> bool {
		self.lock().closed
	}

	pub fn pending(&self) -> usize {
		self.lock().handlers.len()
	}
}
