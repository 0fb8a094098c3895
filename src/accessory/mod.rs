/// HeptaValve mini: up to eight valves with one LED each, plus a power LED,
/// all on plain digital pins of an Arduino Micro.
///
/// LED pins 18 and above are the analog pins A0.. used as digital outputs.

use crate::firmata::{
	Board,
	PinMode,
	SysexTransport,
};
use crate::sysex::{
	Eeprom,
	EepromHeader,
};

pub const MINI_DEVICE_NAME: &str = "mini-sampler";

pub const MINI_PWR_GPIO_CFG: u8 = 3;

pub const MINI_VALVE_GPIO_CFG: [u8; 8] = [
	13, 10, 5, 9,
	12, 11, 6, 4,
];

pub const MINI_LED_GPIO_CFG: [u8; 8] = [
	2, 0, 1, 8,
	0 + 18, 1 + 18, 2 + 18, 4 + 18,
];

pub fn check_valve_number(valve: usize) -> crate::AResult<()> {
	ensure!(valve < MINI_VALVE_GPIO_CFG.len(),
		"heptaValveMini valve number overflow: {} (max idx = {})", valve, MINI_VALVE_GPIO_CFG.len() - 1
	);
	Ok(())
}

pub struct HeptaValveMini<P: Board + SysexTransport> {
	eeprom: Eeprom<P>,
	header: EepromHeader,
}

impl<P: Board + SysexTransport> HeptaValveMini<P> {
	/// Identify the accessory by reading its EEPROM header
	pub fn connect(port: P) -> crate::AResult<Self> {
		Self::connect_eeprom(Eeprom::new(port))
	}

	pub fn connect_eeprom(eeprom: Eeprom<P>) -> crate::AResult<Self> {
		let header = with_context!("couldn't read accessory EEPROM header", {
			Ok(eeprom.read_header()?)
		})?;

		if header.device_name == MINI_DEVICE_NAME {
			info!("Found {}; valves: {}", MINI_DEVICE_NAME, header.valve_count);
		} else {
			warn!("Found an accessory but not the {}: {:?}", MINI_DEVICE_NAME, header.device_name);
		}

		Ok(HeptaValveMini {
			eeprom,
			header,
		})
	}

	pub fn header(&self) -> &EepromHeader {
		&self.header
	}

	pub fn eeprom(&self) -> &Eeprom<P> {
		&self.eeprom
	}

	fn board(&self) -> &P {
		self.eeprom.transport()
	}

	/// All valve and LED pins as outputs, valve 0 open, power LED on
	pub fn configure(&self) -> crate::AResult<()> {
		for (i, (&valve_pin, &led_pin)) in MINI_VALVE_GPIO_CFG.iter().zip(MINI_LED_GPIO_CFG.iter()).enumerate() {
			self.board().set_pin_mode(valve_pin, PinMode::Output)?;
			self.board().set_pin_mode(led_pin, PinMode::Output)?;

			let level = i == 0;
			self.board().digital_write(valve_pin, level)?;
			self.board().digital_write(led_pin, level)?;
		}

		self.set_pwr_led(true)
	}

	pub fn set_pwr_led(&self, level: bool) -> crate::AResult<()> {
		debug!("Setting PWR LED (pin {}) to {}", MINI_PWR_GPIO_CFG, level);
		self.board().digital_write(MINI_PWR_GPIO_CFG, level)
	}

	pub fn set_valve(&self, valve: usize, level: bool) -> crate::AResult<()> {
		check_valve_number(valve)?;
		self.board().digital_write(MINI_VALVE_GPIO_CFG[valve], level)
	}

	pub fn set_led(&self, valve: usize, level: bool) -> crate::AResult<()> {
		check_valve_number(valve)?;
		self.board().digital_write(MINI_LED_GPIO_CFG[valve], level)
	}

	pub fn set_valve_and_led(&self, valve: usize, level: bool) -> crate::AResult<()> {
		self.set_valve(valve, level)?;
		self.set_led(valve, level)
	}

	/// Open `valve` first, then close every other valve the header knows of
	pub fn switch_to_valve(&self, valve: usize) -> crate::AResult<()> {
		self.set_valve_and_led(valve, true)?;
		for i in 0..self.header.valve_count as usize {
			if i == valve {
				continue;
			}
			self.set_valve_and_led(i, false)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::firmata::mock::{
		MockBoard,
		PinOp,
		response_frame,
	};
	use crate::sysex::consts::SYSEX_USR_RD_EEPROM_CB;

	fn board_with_header(name: &str, valves: u8) -> MockBoard {
		let mut data = vec![51, 0, 0];
		let mut header = name.as_bytes().to_vec();
		header.resize(50, 0);
		header.push(valves);
		data.extend(header);
		MockBoard::responding(move |_request| vec![response_frame(SYSEX_USR_RD_EEPROM_CB, &data)])
	}

	#[test]
	fn valve_numbers() {
		assert!(check_valve_number(0).is_ok());
		assert!(check_valve_number(7).is_ok());
		assert!(check_valve_number(8).is_err());
	}

	#[test]
	fn connect_reads_header() {
		let board = board_with_header("mini-sampler", 7);
		let mini = HeptaValveMini::connect(&board).unwrap();
		assert_eq!(mini.header().device_name, "mini-sampler");
		assert_eq!(mini.header().valve_count, 7);
		// no pin touched while identifying
		assert!(board.pins().is_empty());
	}

	#[test]
	fn connect_fails_without_answer() {
		let board = MockBoard::new();
		let eeprom = Eeprom::with_timeout(&board, std::time::Duration::from_millis(20));
		let err = HeptaValveMini::connect_eeprom(eeprom).err().unwrap();
		assert!(err.to_string().contains("couldn't read accessory EEPROM header"));
	}

	#[test]
	fn configure_opens_first_valve() {
		let board = board_with_header("mini-sampler", 7);
		let mini = HeptaValveMini::connect(&board).unwrap();
		mini.configure().unwrap();

		let pins = board.pins();
		assert_eq!(pins.len(), 8 * 4 + 1);
		assert_eq!(&pins[..4], &[
			PinOp::Mode(13, PinMode::Output),
			PinOp::Mode(2, PinMode::Output),
			PinOp::Write(13, true),
			PinOp::Write(2, true),
		]);
		assert_eq!(&pins[28..32], &[
			PinOp::Mode(4, PinMode::Output),
			PinOp::Mode(22, PinMode::Output),
			PinOp::Write(4, false),
			PinOp::Write(22, false),
		]);
		assert_eq!(pins[32], PinOp::Write(MINI_PWR_GPIO_CFG, true));
	}

	#[test]
	fn switch_closes_other_valves() {
		let board = board_with_header("mini-sampler", 3);
		let mini = HeptaValveMini::connect(&board).unwrap();
		mini.switch_to_valve(1).unwrap();

		assert_eq!(board.pins(), vec![
			PinOp::Write(10, true),
			PinOp::Write(0, true),
			PinOp::Write(13, false),
			PinOp::Write(2, false),
			PinOp::Write(5, false),
			PinOp::Write(1, false),
		]);
	}

	#[test]
	fn switch_rejects_unknown_valve() {
		let board = board_with_header("mini-sampler", 7);
		let mini = HeptaValveMini::connect(&board).unwrap();
		assert!(mini.switch_to_valve(8).is_err());
		assert!(board.pins().is_empty());
	}
}
