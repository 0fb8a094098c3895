use std::sync::{
	Arc,
	Mutex,
};
use std::thread;

use super::consts::*;
use super::{
	Board,
	PinMode,
	SubscriptionId,
	SysexEvents,
	SysexHandler,
	SysexTransport,
};

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PinOp {
	Mode(u8, PinMode),
	Write(u8, bool),
}

/// In-memory board: records everything sent; a responder produces the raw
/// frames the "firmware" answers with, delivered from another thread
#[derive(Default)]
pub struct MockBoard {
	pub events: Arc<SysexEvents>,
	pub sent: Mutex<Vec<Vec<u8>>>,
	pub pins: Mutex<Vec<PinOp>>,
	pub fail_writes: bool,
	responder: Mutex<Option<Responder>>,
}

impl MockBoard {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn responding<F>(responder: F) -> Self
	where
		F: FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
	{
		let board = Self::new();
		*board.responder.lock().unwrap() = Some(Box::new(responder));
		board
	}

	pub fn sent(&self) -> Vec<Vec<u8>> {
		self.sent.lock().unwrap().clone()
	}

	pub fn pins(&self) -> Vec<PinOp> {
		self.pins.lock().unwrap().clone()
	}
}

/// Raw frame as the firmware sends it: command byte raw, data 7-bit encoded
pub fn response_frame(command: u8, data: &[u8]) -> Vec<u8> {
	let mut frame = vec![START_SYSEX, command];
	frame.extend(crate::sysex::encode_7bit_pairs(data));
	frame.push(END_SYSEX);
	frame
}

impl SysexTransport for MockBoard {
	fn write_sysex(&self, payload: &[u8]) -> crate::AResult<()> {
		ensure!(!self.fail_writes, "mock write failure");
		self.sent.lock().unwrap().push(payload.to_vec());

		let frames = match self.responder.lock().unwrap().as_mut() {
			Some(responder) => responder(payload),
			None => return Ok(()),
		};
		let events = self.events.clone();
		thread::spawn(move || {
			for frame in frames {
				events.dispatch(&frame);
			}
		});
		Ok(())
	}

	fn subscribe_sysex(&self, handler: SysexHandler) -> crate::AResult<SubscriptionId> {
		self.events.subscribe(handler)
	}

	fn cancel_sysex(&self, id: SubscriptionId) {
		self.events.cancel(id)
	}
}

impl Board for MockBoard {
	fn set_pin_mode(&self, pin: u8, mode: PinMode) -> crate::AResult<()> {
		ensure!(!self.fail_writes, "mock write failure");
		self.pins.lock().unwrap().push(PinOp::Mode(pin, mode));
		Ok(())
	}

	fn digital_write(&self, pin: u8, level: bool) -> crate::AResult<()> {
		ensure!(!self.fail_writes, "mock write failure");
		self.pins.lock().unwrap().push(PinOp::Write(pin, level));
		Ok(())
	}
}
