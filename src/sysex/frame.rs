use std::fmt;

use super::consts::*;
use super::decode_7bit_pairs;
use super::DecodeError;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Command {
	CheckCrc,
	WriteEeprom,
	ReadEeprom,
	CrcStatus,
	ReadEepromDone,
	WriteComplete,
	Unknown(u8),
}

impl Command {
	pub fn code(self) -> u8 {
		match self {
			Command::CheckCrc => SYSEX_USR_CHECK_CRC,
			Command::WriteEeprom => SYSEX_USR_WR_EEPROM,
			Command::ReadEeprom => SYSEX_USR_RD_EEPROM,
			Command::CrcStatus => SYSEX_USR_CRC_STATUS_CB,
			Command::ReadEepromDone => SYSEX_USR_RD_EEPROM_CB,
			Command::WriteComplete => SYSEX_USR_WRITE_CMPLTE_CB,
			Command::Unknown(c) => c,
		}
	}
}

impl From<u8> for Command {
	fn from(code: u8) -> Self {
		match code {
			SYSEX_USR_CHECK_CRC => Command::CheckCrc,
			SYSEX_USR_WR_EEPROM => Command::WriteEeprom,
			SYSEX_USR_RD_EEPROM => Command::ReadEeprom,
			SYSEX_USR_CRC_STATUS_CB => Command::CrcStatus,
			SYSEX_USR_RD_EEPROM_CB => Command::ReadEepromDone,
			SYSEX_USR_WRITE_CMPLTE_CB => Command::WriteComplete,
			c => Command::Unknown(c),
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Command::Unknown(c) => write!(f, "0x{:02x}", c),
			c => write!(f, "{:?} (0x{:02x})", c, c.code()),
		}
	}
}

/// Sysex message as received from the board, user data already decoded
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SysexResponse {
	pub command: u8,
	pub data: Vec<u8>,
}

impl SysexResponse {
	// raw: [START_SYSEX, command, encoded data..., END_SYSEX]; markers are not checked
	pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
		if raw.len() < 4 {
			return Err(DecodeError::FrameTooShort { len: raw.len() });
		}

		Ok(SysexResponse {
			command: raw[1],
			data: decode_7bit_pairs(&raw[2..raw.len() - 1]),
		})
	}

	pub fn kind(&self) -> Command {
		Command::from(self.command)
	}
}
