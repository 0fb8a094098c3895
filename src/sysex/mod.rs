/// User Sysex protocol of the accessory firmware
///
/// The firmware extends StandardFirmata with a handful of user Sysex commands
/// giving access to its EEPROM. Requests are sent completely encoded as 7-bit
/// pairs (command byte included); responses carry the command byte raw,
/// followed by 7-bit pair encoded data.
///
/// Commands:
/// - 0: CHECK CRC, triggers a CRC status callback: `{0}`
/// - 1: WRITE EEPROM, up to 28 bytes: `{1, size, indexMSB, indexLSB, data1, …, dataX}`
/// - 2: READ EEPROM, up to 127 bytes, triggers a read callback: `{2, size, indexMSB, indexLSB}`
/// - 3: CRC STATUS callback, X = 1 valid, X = 0 invalid: `{3, X}`
/// - 4: READ EEPROM callback: `{4, size, indexMSB, indexLSB, data1, …, dataX}`
/// - 5: WRITE COMPLETE callback: `{5, size, indexMSB, indexLSB}`

mod codec;
mod eeprom;
mod error;
mod frame;
mod record;

pub use self::codec::{
	decode_7bit_pairs,
	encode_7bit_pairs,
};

pub use self::eeprom::{
	Eeprom,
	SYSEX_EEPROM_TIMEOUT,
};

pub use self::error::{
	DecodeError,
	RequestError,
};

pub use self::frame::{
	Command,
	SysexResponse,
};

pub use self::record::{
	EepromAck,
	EepromHeader,
	EepromRecord,
	check_crc_request,
	decode_ack,
	decode_crc_status,
	decode_eeprom_string,
	decode_header,
	decode_record,
	read_request,
	write_request,
};

pub mod consts {
	pub const SYSEX_USR_CHECK_CRC: u8 = 0;
	pub const SYSEX_USR_WR_EEPROM: u8 = 1;
	pub const SYSEX_USR_RD_EEPROM: u8 = 2;
	pub const SYSEX_USR_CRC_STATUS_CB: u8 = 3;
	pub const SYSEX_USR_RD_EEPROM_CB: u8 = 4;
	pub const SYSEX_USR_WRITE_CMPLTE_CB: u8 = 5;

	pub const MAX_READ_SIZE: usize = 127;
	pub const MAX_WRITE_SIZE: usize = 28;

	pub const EEPROM_HEADER_ADDR: u16 = 0;
	pub const EEPROM_HEADER_LEN: usize = 51;
	pub const EEPROM_VALVE_NAME_ADDR: u16 = 51;
	pub const EEPROM_ONE_VALVE_NAME_LEN: usize = 20;
}
