use std::fmt;
use std::path::PathBuf;
use std::str;

use serialport::{
	SerialPortInfo,
	SerialPortType,
	UsbPortInfo,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UsbId(pub u16);

impl fmt::Display for UsbId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:04x}", self.0)
	}
}

impl str::FromStr for UsbId {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		let s = if s.starts_with("0x") || s.starts_with("0X") { &s[2..] } else { s };
		ensure!(!s.is_empty() && s.len() <= 4, "invalid USB id: {:?}", s);
		let id = with_context!(("invalid USB id: {}", s),
			Ok(u16::from_str_radix(s, 16)?)
		)?;
		Ok(UsbId(id))
	}
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UsbSerialPort {
	// as reported by the OS, e.g. `/dev/ttyACM0`
	pub name: String,
	pub vendor: UsbId,
	pub product: UsbId,
	pub serial_number: Option<String>,
}

impl UsbSerialPort {
	pub fn device_path(&self) -> PathBuf {
		PathBuf::from(&self.name)
	}
}

impl fmt::Display for UsbSerialPort {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} ({}:{})", self.name, self.vendor, self.product)?;
		if let Some(ref serial) = self.serial_number {
			write!(f, " serial {}", serial)?;
		}
		Ok(())
	}
}

fn usb_serial_ports(ports: Vec<SerialPortInfo>) -> Vec<UsbSerialPort> {
	let mut list: Vec<UsbSerialPort> = ports.into_iter().filter_map(|port| match port.port_type {
		SerialPortType::UsbPort(UsbPortInfo { vid, pid, serial_number, .. }) => Some(UsbSerialPort {
			name: port.port_name,
			vendor: UsbId(vid),
			product: UsbId(pid),
			serial_number,
		}),
		_ => {
			trace!("Skipping non-USB serial port {}", port.port_name);
			None
		},
	}).collect();
	list.sort();
	list
}

pub fn list_usb_ports() -> crate::AResult<Vec<UsbSerialPort>> {
	let ports = with_context!("couldn't enumerate serial ports",
		Ok(serialport::available_ports()?)
	)?;
	Ok(usb_serial_ports(ports))
}

pub fn find_usb_port(vendor: UsbId, product: UsbId) -> crate::AResult<Option<UsbSerialPort>> {
	Ok(list_usb_ports()?.into_iter().find(|port| port.vendor == vendor && port.product == product))
}

#[cfg(test)]
mod test {
	use std::path::Path;

	use super::*;

	fn check_usb_id(id: u16, repr: &str) {
		match repr.parse::<UsbId>() {
			Err(e) => panic!("{} failed to parse as UsbId: {}", repr, e),
			Ok(parsed) => assert_eq!(UsbId(id), parsed, "failed validating parsed {}", repr),
		}
	}

	#[test]
	fn parse_usb_id() {
		check_usb_id(0x2341, "2341");
		check_usb_id(0x8037, "8037\n");
		check_usb_id(0x8037, "0x8037");
		check_usb_id(0x8037, "0X8037");
		check_usb_id(0xabcd, "0XABCD");
		check_usb_id(0x00ab, "ab");
		assert_eq!(UsbId(0x00ab).to_string(), "00ab");
		assert!("".parse::<UsbId>().is_err());
		assert!("0X".parse::<UsbId>().is_err());
		assert!("12345".parse::<UsbId>().is_err());
		assert!("zz".parse::<UsbId>().is_err());
	}

	fn usb(name: &str, vid: u16, pid: u16, serial_number: Option<&str>) -> SerialPortInfo {
		SerialPortInfo {
			port_name: name.into(),
			port_type: SerialPortType::UsbPort(UsbPortInfo {
				vid,
				pid,
				serial_number: serial_number.map(String::from),
				manufacturer: None,
				product: None,
			}),
		}
	}

	#[test]
	fn only_usb_ports_are_listed() {
		let ports = usb_serial_ports(vec![
			usb("/dev/ttyUSB0", 0x0403, 0x6001, None),
			SerialPortInfo {
				port_name: "/dev/ttyS0".into(),
				port_type: SerialPortType::Unknown,
			},
			usb("/dev/ttyACM0", 0x2341, 0x8037, Some("HVM01")),
			SerialPortInfo {
				port_name: "/dev/ttyS4".into(),
				port_type: SerialPortType::PciPort,
			},
		]);

		assert_eq!(ports, vec![
			UsbSerialPort {
				name: "/dev/ttyACM0".into(),
				vendor: UsbId(0x2341),
				product: UsbId(0x8037),
				serial_number: Some("HVM01".into()),
			},
			UsbSerialPort {
				name: "/dev/ttyUSB0".into(),
				vendor: UsbId(0x0403),
				product: UsbId(0x6001),
				serial_number: None,
			},
		]);
		assert_eq!(ports[0].device_path(), Path::new("/dev/ttyACM0"));
		assert_eq!(ports[0].to_string(), "/dev/ttyACM0 (2341:8037) serial HVM01");
		assert_eq!(ports[1].to_string(), "/dev/ttyUSB0 (0403:6001)");
	}
}
