use std::time::Duration;

/// Malformed data received from the accessory
#[derive(Clone, PartialEq, Eq, Debug, Fail)]
pub enum DecodeError {
	#[fail(display = "sysex response is too short: len = {}", len)]
	FrameTooShort {
		len: usize,
	},
	#[fail(display = "invalid eeprom header length: {} but {} is required", len, required)]
	HeaderTooShort {
		len: usize,
		required: usize,
	},
	#[fail(display = "sysex response is shorter than size declared in the header: size = {}, actual length: {}", size, available)]
	RecordTooShort {
		size: usize,
		available: usize,
	},
	#[fail(display = "write acknowledgement too short: len = {}", len)]
	AckTooShort {
		len: usize,
	},
	#[fail(display = "crc status callback without status byte")]
	CrcStatusMissing,
}

#[derive(Debug, Fail)]
pub enum RequestError {
	#[fail(display = "sysex transport failure: {}", _0)]
	Transport(failure::Error),
	#[fail(display = "malformed sysex response: {}", _0)]
	Malformed(#[cause] DecodeError),
	#[fail(display = "timeout while waiting for sysex response ({:?})", _0)]
	Timeout(Duration),
	#[fail(display = "sysex request too large: {} bytes (max {})", size, max)]
	Oversized {
		size: usize,
		max: usize,
	},
}

impl RequestError {
	pub fn is_timeout(&self) -> bool {
		match self {
			RequestError::Timeout(_) => true,
			_ => false,
		}
	}

	pub fn is_malformed(&self) -> bool {
		match self {
			RequestError::Malformed(_) => true,
			_ => false,
		}
	}

	pub fn is_transport(&self) -> bool {
		match self {
			RequestError::Transport(_) => true,
			_ => false,
		}
	}

	pub fn decode_error(&self) -> Option<&DecodeError> {
		match self {
			RequestError::Malformed(e) => Some(e),
			_ => None,
		}
	}
}

impl From<DecodeError> for RequestError {
	fn from(e: DecodeError) -> Self {
		RequestError::Malformed(e)
	}
}
