/// Minimal Firmata plumbing: Sysex frames in both directions, pin mode and
/// single pin writes out. No capability negotiation, no reporting.

mod assembler;
mod events;
mod port;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

pub use self::assembler::SysexAssembler;

pub use self::events::{
	SubscriptionId,
	SysexEvents,
};

pub use self::port::{
	FirmataPort,
};

pub mod consts {
	pub const START_SYSEX: u8 = 0xF0;
	pub const END_SYSEX: u8 = 0xF7;
	pub const SET_PIN_MODE: u8 = 0xF4;
	pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;

	// longest sysex frame we are willing to buffer (markers included)
	pub const MAX_SYSEX_LEN: usize = 1024;

	pub const DEFAULT_BAUD: u32 = 57600;
}

/// What a sysex subscriber did with a frame
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dispatch {
	// done, remove the subscription
	Consumed,
	// not for us, keep listening
	Ignored,
}

/// Gets the raw frame: `[START_SYSEX, command, data..., END_SYSEX]`
pub type SysexHandler = Box<dyn FnMut(&[u8]) -> Dispatch + Send>;

pub trait SysexTransport {
	// send `[START_SYSEX, payload..., END_SYSEX]`; payload must be 7-bit clean
	fn write_sysex(&self, payload: &[u8]) -> crate::AResult<()>;

	// handler stays registered until it returns `Dispatch::Consumed`, gets
	// cancelled, or the transport closes (which drops it unfired)
	fn subscribe_sysex(&self, handler: SysexHandler) -> crate::AResult<SubscriptionId>;

	fn cancel_sysex(&self, id: SubscriptionId);
}

impl<'a, T: ?Sized + SysexTransport> SysexTransport for &'a T {
	fn write_sysex(&self, payload: &[u8]) -> crate::AResult<()> {
		T::write_sysex(*self, payload)
	}
	fn subscribe_sysex(&self, handler: SysexHandler) -> crate::AResult<SubscriptionId> {
		T::subscribe_sysex(*self, handler)
	}
	fn cancel_sysex(&self, id: SubscriptionId) {
		T::cancel_sysex(*self, id)
	}
}

impl<T: ?Sized + SysexTransport> SysexTransport for Arc<T> {
	fn write_sysex(&self, payload: &[u8]) -> crate::AResult<()> {
		T::write_sysex(&**self, payload)
	}
	fn subscribe_sysex(&self, handler: SysexHandler) -> crate::AResult<SubscriptionId> {
		T::subscribe_sysex(&**self, handler)
	}
	fn cancel_sysex(&self, id: SubscriptionId) {
		T::cancel_sysex(&**self, id)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum PinMode {
	Output,
}

impl PinMode {
	pub fn code(self) -> u8 {
		match self {
			PinMode::Output => 0x01,
		}
	}
}

/// Digital pin access on the board
pub trait Board {
	fn set_pin_mode(&self, pin: u8, mode: PinMode) -> crate::AResult<()>;
	fn digital_write(&self, pin: u8, level: bool) -> crate::AResult<()>;
}

impl<'a, B: ?Sized + Board> Board for &'a B {
	fn set_pin_mode(&self, pin: u8, mode: PinMode) -> crate::AResult<()> {
		B::set_pin_mode(*self, pin, mode)
	}
	fn digital_write(&self, pin: u8, level: bool) -> crate::AResult<()> {
		B::digital_write(*self, pin, level)
	}
}

impl<B: ?Sized + Board> Board for Arc<B> {
	fn set_pin_mode(&self, pin: u8, mode: PinMode) -> crate::AResult<()> {
		B::set_pin_mode(&**self, pin, mode)
	}
	fn digital_write(&self, pin: u8, level: bool) -> crate::AResult<()> {
		B::digital_write(&**self, pin, level)
	}
}
