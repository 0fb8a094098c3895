use super::consts::*;

/// Cuts sysex frames out of the Firmata byte stream
///
/// Everything outside `START_SYSEX .. END_SYSEX` (version reports, digital
/// and analog messages) is skipped.
#[derive(Clone, Debug, Default)]
pub struct SysexAssembler {
	buf: Vec<u8>,
	in_sysex: bool,
}

impl SysexAssembler {
	pub fn new() -> Self {
		Self::default()
	}

	fn abort(&mut self) {
		self.buf.clear();
		self.in_sysex = false;
	}

	/// Returns a complete frame including both markers
	pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
		match byte {
			START_SYSEX => {
				if self.in_sysex {
					warn!("sysex frame restarted after {} bytes, dropping partial frame", self.buf.len());
				}
				self.buf.clear();
				self.buf.push(byte);
				self.in_sysex = true;
				None
			},
			END_SYSEX if self.in_sysex => {
				self.buf.push(byte);
				self.in_sysex = false;
				Some(std::mem::replace(&mut self.buf, Vec::new()))
			},
			_ if !self.in_sysex => {
				trace!("skipping non-sysex byte 0x{:02x}", byte);
				None
			},
			b if b & 0x80 != 0 => {
				warn!("status byte 0x{:02x} inside sysex frame, dropping {} bytes", b, self.buf.len());
				self.abort();
				None
			},
			_ => {
				// keep room for END_SYSEX
				if self.buf.len() + 2 > MAX_SYSEX_LEN {
					warn!("sysex frame exceeds {} bytes, dropping it", MAX_SYSEX_LEN);
					self.abort();
					return None;
				}
				self.buf.push(byte);
				None
			},
		}
	}

	pub fn extend(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
		bytes.iter().filter_map(|&b| self.push(b)).collect()
	}
}
