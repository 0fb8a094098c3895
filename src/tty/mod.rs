mod list;
mod serial;

pub use self::list::{
	UsbId,
	UsbSerialPort,
	find_usb_port,
	list_usb_ports,
};

pub use self::serial::{
	READ_POLL_TIMEOUT,
	open_serial,
};

// Arduino Micro, running the accessory firmware
pub const ARDUINO_VENDOR: UsbId = UsbId(0x2341);
pub const ARDUINO_MICRO_PRODUCT: UsbId = UsbId(0x8037);
