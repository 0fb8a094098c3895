use std::path::Path;
use std::time::Duration;

use serialport::{
	ClearBuffer,
	DataBits,
	FlowControl,
	Parity,
	SerialPort,
	StopBits,
};

// reads return `TimedOut` after this long, so a reader notices shutdown
pub const READ_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Open a serial port 8N1 without flow control
pub fn open_serial(path: &Path, baud: u32) -> crate::AResult<Box<dyn SerialPort>> {
	ensure!(baud > 0, "invalid baud rate {}", baud);

	with_context!(("couldn't open serial port {}", path.display()), {
		let port = serialport::new(path.to_string_lossy(), baud)
			.data_bits(DataBits::Eight)
			.parity(Parity::None)
			.stop_bits(StopBits::One)
			.flow_control(FlowControl::None)
			.timeout(READ_POLL_TIMEOUT)
			.open()?;
		// drop whatever the board sent before we were listening
		port.clear(ClearBuffer::All)?;
		Ok(port)
	})
}
