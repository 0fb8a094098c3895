use super::consts::*;
use super::{
	DecodeError,
	RequestError,
};

// Header layout:
// - device name:   idx 0, len 20
// - serial number: idx 20, len 10
// - hardware rev:  idx 30, len 10 (idx 40..50 reserved)
// - nb valves:     idx 50, len 1
const DEVICE_NAME: (usize, usize) = (0, 20);
const SERIAL_NUMBER: (usize, usize) = (20, 30);
const HARDWARE_REVISION: (usize, usize) = (30, 40);
const VALVE_COUNT: usize = 50;

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct EepromHeader {
	pub device_name: String,
	pub serial_number: String,
	pub hardware_revision: String,
	pub valve_count: u8,
}

/// Result of a read
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct EepromRecord {
	pub size: u8,
	pub address: u16,
	pub payload: Vec<u8>,
}

/// Write completion callback: which range got written
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EepromAck {
	pub size: u8,
	pub address: u16,
}

// NUL bytes are padding and skipped wherever they show up; everything else
// is taken as latin-1
pub fn decode_eeprom_string(data: &[u8]) -> String {
	data.iter()
		.filter(|&&b| b != 0)
		.map(|&b| b as char)
		.collect()
}

pub fn decode_header(payload: &[u8]) -> Result<EepromHeader, DecodeError> {
	if payload.len() < EEPROM_HEADER_LEN {
		return Err(DecodeError::HeaderTooShort {
			len: payload.len(),
			required: EEPROM_HEADER_LEN,
		});
	}

	Ok(EepromHeader {
		device_name: decode_eeprom_string(&payload[DEVICE_NAME.0..DEVICE_NAME.1]),
		serial_number: decode_eeprom_string(&payload[SERIAL_NUMBER.0..SERIAL_NUMBER.1]),
		hardware_revision: decode_eeprom_string(&payload[HARDWARE_REVISION.0..HARDWARE_REVISION.1]),
		valve_count: payload[VALVE_COUNT],
	})
}

/// `(size, address)` echoed at the start of read and write callbacks
pub(super) fn decode_prefix(data: &[u8]) -> Option<(u8, u16)> {
	if data.len() < 3 {
		return None;
	}
	let size = data[0];
	let address = (data[1] as u16) << 8 | data[2] as u16;
	Some((size, address))
}

/// Decode `{size, indexMSB, indexLSB, data...}`
pub fn decode_record(data: &[u8]) -> Result<EepromRecord, DecodeError> {
	// length after the prefix, taken before anything is split off
	let available = data.len().saturating_sub(3);

	let (size, address) = decode_prefix(data).ok_or(DecodeError::RecordTooShort {
		size: data.first().cloned().unwrap_or(0) as usize,
		available,
	})?;

	if available < size as usize {
		return Err(DecodeError::RecordTooShort {
			size: size as usize,
			available,
		});
	}

	Ok(EepromRecord {
		size,
		address,
		payload: data[3..3 + size as usize].to_vec(),
	})
}

pub fn decode_ack(data: &[u8]) -> Result<EepromAck, DecodeError> {
	let (size, address) = decode_prefix(data).ok_or(DecodeError::AckTooShort { len: data.len() })?;
	Ok(EepromAck { size, address })
}

pub fn decode_crc_status(data: &[u8]) -> Result<bool, DecodeError> {
	match data.first() {
		None => Err(DecodeError::CrcStatusMissing),
		Some(&x) => Ok(x != 0),
	}
}

pub fn read_request(address: u16, size: usize) -> Result<Vec<u8>, RequestError> {
	if size > MAX_READ_SIZE {
		return Err(RequestError::Oversized { size, max: MAX_READ_SIZE });
	}
	Ok(vec![
		SYSEX_USR_RD_EEPROM,
		size as u8,
		(address >> 8) as u8,
		address as u8,
	])
}

pub fn write_request(address: u16, data: &[u8]) -> Result<Vec<u8>, RequestError> {
	if data.len() > MAX_WRITE_SIZE {
		return Err(RequestError::Oversized { size: data.len(), max: MAX_WRITE_SIZE });
	}
	let mut msg = vec![
		SYSEX_USR_WR_EEPROM,
		data.len() as u8,
		(address >> 8) as u8,
		address as u8,
	];
	msg.extend_from_slice(data);
	Ok(msg)
}

pub fn check_crc_request() -> Vec<u8> {
	vec![SYSEX_USR_CHECK_CRC]
}
