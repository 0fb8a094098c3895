use std::sync::mpsc::{
	self,
	RecvTimeoutError,
};
use std::sync::Mutex;
use std::time::Duration;

use crate::firmata::{
	Dispatch,
	SysexTransport,
};

use super::consts::*;
use super::record::*;
use super::{
	Command,
	DecodeError,
	RequestError,
	SysexResponse,
	encode_7bit_pairs,
};

pub const SYSEX_EEPROM_TIMEOUT: Duration = Duration::from_secs(3);

// Responses carry no request tag, only the range they cover; a range other
// than the requested one answers an earlier (timed out) request. Frames too
// short to carry the range are left to the decoder to reject.
fn echoes_range(data: &[u8], address: u16, size: usize) -> bool {
	match decode_prefix(data) {
		None => true,
		Some((echo_size, echo_address)) => {
			if echo_address == address && echo_size as usize == size {
				true
			} else {
				debug!(
					"sysex response for {} bytes at 0x{:04x}, waiting for {} bytes at 0x{:04x}",
					echo_size, echo_address, size, address,
				);
				false
			}
		},
	}
}

/// EEPROM of the accessory, accessed through user sysex commands
///
/// The protocol has no request tags: a response is matched to whatever
/// request is outstanding. All requests through one `Eeprom` are therefore
/// serialized; don't use two `Eeprom`s on the same transport concurrently.
pub struct Eeprom<T: SysexTransport> {
	transport: T,
	timeout: Duration,
	serialize: Mutex<()>,
}

impl<T: SysexTransport> Eeprom<T> {
	pub fn new(transport: T) -> Self {
		Self::with_timeout(transport, SYSEX_EEPROM_TIMEOUT)
	}

	pub fn with_timeout(transport: T, timeout: Duration) -> Self {
		Eeprom {
			transport,
			timeout,
			serialize: Mutex::new(()),
		}
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Send `request` and wait for the response `accept` recognizes
	///
	/// `accept` returns `None` for frames that don't answer this request
	/// (other commands, or a range other than the requested one); those are
	/// logged and the wait continues.
	pub fn transact<R, F>(&self, request: &[u8], mut accept: F) -> Result<R, RequestError>
	where
		R: Send + 'static,
		F: FnMut(&SysexResponse) -> Option<Result<R, DecodeError>> + Send + 'static,
	{
		let _serialized = self.serialize.lock().unwrap_or_else(|e| e.into_inner());

		let (tx, rx) = mpsc::sync_channel::<Result<R, DecodeError>>(1);
		let subscription = self.transport.subscribe_sysex(Box::new(move |raw: &[u8]| {
			debug!("sysex response {:02x?}", raw);
			let outcome = match SysexResponse::parse(raw) {
				Err(e) => Err(e),
				Ok(response) => match accept(&response) {
					Some(outcome) => outcome,
					None => {
						info!("ignoring sysex response {} not matching the pending request", response.kind());
						return Dispatch::Ignored;
					},
				},
			};
			if let Err(ref e) = outcome {
				warn!("malformed sysex response: {}", e);
			}
			// fails only if the request already gave up waiting
			let _ = tx.try_send(outcome);
			Dispatch::Consumed
		})).map_err(RequestError::Transport)?;

		debug!("sysex request {:02x?}", request);
		if let Err(e) = self.transport.write_sysex(&encode_7bit_pairs(request)) {
			self.transport.cancel_sysex(subscription);
			return Err(RequestError::Transport(e));
		}

		let result = match rx.recv_timeout(self.timeout) {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(e)) => Err(RequestError::Malformed(e)),
			Err(RecvTimeoutError::Timeout) => Err(RequestError::Timeout(self.timeout)),
			Err(RecvTimeoutError::Disconnected) => Err(RequestError::Transport(
				format_err!("connection closed while waiting for sysex response")
			)),
		};
		self.transport.cancel_sysex(subscription);
		result
	}

	pub fn read(&self, address: u16, size: usize) -> Result<EepromRecord, RequestError> {
		let request = read_request(address, size)?;
		self.transact(&request, move |response| match response.kind() {
			Command::ReadEepromDone => {
				if !echoes_range(&response.data, address, size) {
					return None;
				}
				Some(decode_record(&response.data))
			},
			_ => None,
		})
	}

	pub fn read_header(&self) -> Result<EepromHeader, RequestError> {
		let record = self.read(EEPROM_HEADER_ADDR, EEPROM_HEADER_LEN)?;
		Ok(decode_header(&record.payload)?)
	}

	pub fn read_valve_name(&self, index: usize) -> Result<String, RequestError> {
		let end = index.checked_mul(EEPROM_ONE_VALVE_NAME_LEN)
			.and_then(|o| o.checked_add(EEPROM_VALVE_NAME_ADDR as usize + EEPROM_ONE_VALVE_NAME_LEN));
		let offset = match end {
			Some(end) if end <= 0x1_0000 => end - EEPROM_ONE_VALVE_NAME_LEN,
			_ => return Err(RequestError::Oversized { size: end.unwrap_or(usize::MAX), max: 0x1_0000 }),
		};
		let record = self.read(offset as u16, EEPROM_ONE_VALVE_NAME_LEN)?;
		Ok(decode_eeprom_string(&record.payload))
	}

	pub fn write(&self, address: u16, data: &[u8]) -> Result<EepromAck, RequestError> {
		let request = write_request(address, data)?;
		let size = data.len();
		self.transact(&request, move |response| match response.kind() {
			Command::WriteComplete => {
				if !echoes_range(&response.data, address, size) {
					return None;
				}
				Some(decode_ack(&response.data))
			},
			_ => None,
		})
	}

	/// Whether the firmware considers the EEPROM CRC valid
	pub fn check_crc(&self) -> Result<bool, RequestError> {
		self.transact(&check_crc_request(), |response| match response.kind() {
			Command::CrcStatus => Some(decode_crc_status(&response.data)),
			_ => None,
		})
	}
}
