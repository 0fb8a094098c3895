use std::io::{
	self,
	Read,
	Write,
};
use std::path::Path;
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
	SysexAssembler,
	SysexEvents,
	SysexHandler,
	SysexTransport,
};

/// Firmata connection over any byte stream (usually a serial TTY)
///
/// A reader thread cuts sysex frames out of the incoming stream and hands
/// them to the subscribers; it exits on EOF or read error, closing the event
/// stream (pending subscribers are dropped, new ones refused). Dropping the
/// port closes the event stream too; a polling reader then exits on its next
/// read timeout.
pub struct FirmataPort {
	writer: Mutex<Box<dyn Write + Send>>,
	events: Arc<SysexEvents>,
}

impl FirmataPort {
	pub fn new<R, W>(reader: R, writer: W) -> io::Result<Self>
	where
		R: Read + Send + 'static,
		W: Write + Send + 'static,
	{
		let events = Arc::new(SysexEvents::new());
		let reader_events = events.clone();
		thread::Builder::new()
			.name("firmata-reader".into())
			.spawn(move || read_loop(reader, &reader_events))?;

		Ok(FirmataPort {
			writer: Mutex::new(Box::new(writer)),
			events,
		})
	}

	pub fn open<P: AsRef<Path>>(path: P, baud: u32) -> crate::AResult<Self> {
		let path = path.as_ref();
		let serial = crate::tty::open_serial(path, baud)?;
		let reader = with_context!(("couldn't duplicate handle for {}", path.display()), {
			Ok(serial.try_clone()?)
		})?;
		info!("Opened {} at {} baud", path.display(), baud);
		Ok(Self::new(reader, serial)?)
	}

	pub fn events(&self) -> &SysexEvents {
		&self.events
	}

	pub fn is_closed(&self) -> bool {
		self.events.is_closed()
	}

	fn write_all(&self, bytes: &[u8]) -> crate::AResult<()> {
		ensure!(!self.is_closed(), "firmata port closed");
		trace!("firmata out: {:02x?}", bytes);
		let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
		writer.write_all(bytes)?;
		writer.flush()?;
		Ok(())
	}
}

fn read_loop<R: Read>(mut reader: R, events: &SysexEvents) {
	let mut assembler = SysexAssembler::new();
	let mut buf = [0u8; 256];
	loop {
		let len = match reader.read(&mut buf) {
			Ok(0) => {
				debug!("firmata port: end of stream");
				break;
			},
			Ok(len) => len,
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
			// serial ports poll; the port itself may be gone by now
			Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
				if events.is_closed() {
					break;
				}
				continue;
			},
			Err(e) => {
				error!("firmata port: read failed: {}", e);
				break;
			},
		};
		trace!("firmata in: {:02x?}", &buf[..len]);
		for frame in assembler.extend(&buf[..len]) {
			debug!("sysex frame: {:02x?}", frame);
			if !events.dispatch(&frame) {
				debug!("sysex frame with command 0x{:02x} not consumed", frame[1]);
			}
		}
	}
	events.close();
}

impl Drop for FirmataPort {
	fn drop(&mut self) {
		self.events.close();
	}
}

impl SysexTransport for FirmataPort {
	fn write_sysex(&self, payload: &[u8]) -> crate::AResult<()> {
		ensure!(payload.iter().all(|b| b & 0x80 == 0), "sysex payload not 7-bit clean: {:02x?}", payload);
		let mut frame = Vec::with_capacity(payload.len() + 2);
		frame.push(START_SYSEX);
		frame.extend_from_slice(payload);
		frame.push(END_SYSEX);
		self.write_all(&frame)
	}

	fn subscribe_sysex(&self, handler: SysexHandler) -> crate::AResult<SubscriptionId> {
		self.events.subscribe(handler)
	}

	fn cancel_sysex(&self, id: SubscriptionId) {
		self.events.cancel(id)
	}
}

impl Board for FirmataPort {
	fn set_pin_mode(&self, pin: u8, mode: PinMode) -> crate::AResult<()> {
		ensure!(pin < 0x80, "invalid pin {}", pin);
		self.write_all(&[SET_PIN_MODE, pin, mode.code()])
	}

	fn digital_write(&self, pin: u8, level: bool) -> crate::AResult<()> {
		ensure!(pin < 0x80, "invalid pin {}", pin);
		self.write_all(&[SET_DIGITAL_PIN_VALUE, pin, level as u8])
	}
}

#[cfg(test)]
mod test {
	use std::io::{
		Read,
		Write,
	};
	use std::os::unix::net::UnixStream;
	use std::thread;
	use std::time::{
		Duration,
		Instant,
	};

	use super::*;
	use crate::sysex::{
		Eeprom,
		encode_7bit_pairs,
	};

	fn pair() -> (FirmataPort, UnixStream) {
		let (host, device) = UnixStream::pair().unwrap();
		let port = FirmataPort::new(host.try_clone().unwrap(), host).unwrap();
		(port, device)
	}

	fn read_frame(device: &mut UnixStream) -> Vec<u8> {
		let mut frame = Vec::new();
		let mut byte = [0u8];
		loop {
			device.read_exact(&mut byte).unwrap();
			frame.push(byte[0]);
			if byte[0] == END_SYSEX {
				return frame;
			}
		}
	}

	fn header_response() -> Vec<u8> {
		let mut data = vec![51, 0, 0];
		let mut header = b"mini-sampler".to_vec();
		header.resize(20, 0);
		header.extend_from_slice(b"SN001\0\0\0\0\0rev1");
		header.resize(50, 0);
		header.push(7);
		data.extend(header);

		let mut frame = vec![START_SYSEX, 0x04];
		frame.extend(encode_7bit_pairs(&data));
		frame.push(END_SYSEX);
		frame
	}

	#[test]
	fn read_header_over_stream() {
		let (port, mut device) = pair();

		let device = thread::spawn(move || {
			let request = read_frame(&mut device);
			assert_eq!(request, vec![START_SYSEX, 2, 0, 51, 0, 0, 0, 0, 0, END_SYSEX]);
			// firmware noise before the answer
			device.write_all(&[0xf9, 2, 5]).unwrap();
			device.write_all(&[START_SYSEX, 0x79, 2, 5, END_SYSEX]).unwrap();
			device.write_all(&header_response()).unwrap();
			device
		});

		let eeprom = Eeprom::new(&port);
		let header = eeprom.read_header().unwrap();
		assert_eq!(header.device_name, "mini-sampler");
		assert_eq!(header.serial_number, "SN001");
		assert_eq!(header.hardware_revision, "rev1");
		assert_eq!(header.valve_count, 7);
		assert_eq!(port.events().pending(), 0);

		drop(device.join().unwrap());
	}

	#[test]
	fn pin_messages() {
		let (port, mut device) = pair();
		port.set_pin_mode(13, PinMode::Output).unwrap();
		port.digital_write(13, true).unwrap();
		port.digital_write(2, false).unwrap();

		let mut buf = [0u8; 9];
		device.read_exact(&mut buf).unwrap();
		assert_eq!(buf, [
			SET_PIN_MODE, 13, 0x01,
			SET_DIGITAL_PIN_VALUE, 13, 1,
			SET_DIGITAL_PIN_VALUE, 2, 0,
		]);
		assert!(port.digital_write(0x80, true).is_err());
	}

	#[test]
	fn rejects_8bit_sysex_payload() {
		let (port, _device) = pair();
		assert!(port.write_sysex(&[0x02, 0x80]).is_err());
	}

	// serial port without traffic: every read times out
	struct IdleSerial;

	impl Read for IdleSerial {
		fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
			thread::sleep(Duration::from_millis(1));
			Err(io::ErrorKind::TimedOut.into())
		}
	}

	#[test]
	fn read_timeouts_keep_port_open() {
		let port = FirmataPort::new(IdleSerial, io::sink()).unwrap();
		thread::sleep(Duration::from_millis(50));
		assert!(!port.is_closed());
		port.digital_write(3, true).unwrap();
	}

	#[test]
	fn closed_stream_fails_requests() {
		let (port, device) = pair();
		drop(device);

		let deadline = Instant::now() + Duration::from_secs(2);
		while !port.is_closed() {
			assert!(Instant::now() < deadline, "reader thread didn't notice EOF");
			thread::sleep(Duration::from_millis(5));
		}

		let err = Eeprom::new(&port).read_header().unwrap_err();
		assert!(err.is_transport(), "unexpected error: {}", err);
	}
}
