#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate hepta_valve;
use hepta_valve::*;

use std::io::{
	self,
	BufRead,
	Write,
};
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use hepta_valve::accessory::HeptaValveMini;
use hepta_valve::firmata::FirmataPort;
use hepta_valve::sysex::Eeprom;
use hepta_valve::tty::UsbId;

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_param_or<T>(matches: &clap::ArgMatches, name: &str, default: T) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	if matches.is_present(name) {
		get_param(matches, name)
	} else {
		Ok(default)
	}
}

// decimal or 0x-prefixed hex
fn get_number(matches: &clap::ArgMatches, name: &str) -> AResult<usize> {
	let param: String = get_param(matches, name)?;
	let parsed = if param.starts_with("0x") {
		usize::from_str_radix(&param[2..], 16)
	} else {
		param.parse::<usize>()
	};
	parsed.map_err(|e| {
		let msg = format!("invalid parameter {}: {}", name, e);
		failure::Error::from(e).context(msg).into()
	})
}

fn open_port(matches: &clap::ArgMatches) -> AResult<FirmataPort> {
	let baud: u32 = get_param_or(matches, "baud", firmata::consts::DEFAULT_BAUD)?;

	let path = match matches.value_of("device") {
		Some(device) => PathBuf::from(device),
		None => {
			let vendor: UsbId = get_param_or(matches, "vid", tty::ARDUINO_VENDOR)?;
			let product: UsbId = get_param_or(matches, "pid", tty::ARDUINO_MICRO_PRODUCT)?;
			match tty::find_usb_port(vendor, product)? {
				None => bail!("accessory board not connected (no USB serial port with id {}:{})", vendor, product),
				Some(port) => {
					info!("Found Arduino Micro port: {}", port);
					port.device_path()
				},
			}
		},
	};

	FirmataPort::open(&path, baud)
}

fn connect<'a>(matches: &clap::ArgMatches, port: &'a FirmataPort) -> AResult<HeptaValveMini<&'a FirmataPort>> {
	let timeout = Duration::from_millis(get_param_or(matches, "timeout", 3000u64)?);
	HeptaValveMini::connect_eeprom(Eeprom::with_timeout(port, timeout))
}

fn list(matches: &clap::ArgMatches) -> AResult<()> {
	let vendor: UsbId = get_param_or(matches, "vid", tty::ARDUINO_VENDOR)?;
	let product: UsbId = get_param_or(matches, "pid", tty::ARDUINO_MICRO_PRODUCT)?;

	for port in tty::list_usb_ports()? {
		if port.vendor == vendor && port.product == product {
			println!("{} *", port);
		} else {
			println!("{}", port);
		}
	}

	Ok(())
}

fn info(matches: &clap::ArgMatches) -> AResult<()> {
	let port = open_port(matches)?;
	let mini = connect(matches, &port)?;
	let header = mini.header();

	println!("Device name:       {}", header.device_name);
	println!("Serial number:     {}", header.serial_number);
	println!("Hardware revision: {}", header.hardware_revision);
	println!("Valves:            {}", header.valve_count);

	match mini.eeprom().check_crc() {
		Ok(true) => println!("EEPROM CRC:        valid"),
		Ok(false) => println!("EEPROM CRC:        invalid"),
		Err(e) => warn!("Couldn't check EEPROM CRC: {}", e),
	}

	for valve in 0..header.valve_count as usize {
		let name = mini.eeprom().read_valve_name(valve)?;
		println!("Valve {}:           {}", valve, name);
	}

	Ok(())
}

fn read(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_number(sub_m, "ADDRESS")?;
	let size = get_number(sub_m, "SIZE")?;
	ensure!(address <= 0xffff, "address out of range: 0x{:x}", address);

	let port = open_port(matches)?;
	let timeout = Duration::from_millis(get_param_or(matches, "timeout", 3000u64)?);
	let record = Eeprom::with_timeout(&port, timeout).read(address as u16, size)?;

	let data = &record.payload;
	for i in 0..data.len() {
		if 0 == i % 16 {
			print!("{:04x} ", record.address as usize + i);
		} else if 0 == i % 8 {
			print!(" ");
		}
		print!(" {:02x}", data[i]);
		if 15 == i % 16 {
			println!();
		}
	}
	if 0 != data.len() % 16 {
		println!();
	}

	Ok(())
}

fn switch(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let valve: usize = get_param(sub_m, "VALVE")?;
	accessory::check_valve_number(valve)?;

	let port = open_port(matches)?;
	let mini = connect(matches, &port)?;
	mini.configure()?;
	mini.switch_to_valve(valve)
}

fn interactive(matches: &clap::ArgMatches) -> AResult<()> {
	let port = open_port(matches)?;
	let mini = connect(matches, &port)?;
	mini.configure()?;

	let stdin = io::stdin();
	let mut lines = stdin.lock().lines();
	loop {
		print!("Enter <valve>: ");
		io::stdout().flush()?;

		let line = match lines.next() {
			None => return Ok(()),
			Some(line) => line?,
		};
		let text = line.trim();
		debug!("You entered {:?}", text);

		let valve = match text.parse::<usize>() {
			Ok(valve) => valve,
			Err(e) => {
				error!("Invalid valve {:?}: {}", text, e);
				continue;
			},
		};

		if let Err(e) = mini.switch_to_valve(valve) {
			error!("Couldn't switch to valve {}: {}", valve, e);
		}
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg device: -d --device +takes_value "serial device to use (default: search USB by id)")
		(@arg baud: -b --baud +takes_value "baud rate (default: 57600)")
		(@arg vid: --vid +takes_value "USB vendor id to search for (default: 2341)")
		(@arg pid: --pid +takes_value "USB product id to search for (default: 8037)")
		(@arg timeout: -t --timeout +takes_value "sysex response timeout in milliseconds (default: 3000)")
		(@subcommand list =>
			(about: "list USB serial ports, marking the ones matching the accessory id")
		)
		(@subcommand info =>
			(about: "show EEPROM header, CRC status and valve names")
		)
		(@subcommand read =>
			(about: "hex dump EEPROM range")
			(@arg ADDRESS: +required "start address (decimal or 0x-prefixed hex)")
			(@arg SIZE: +required "number of bytes (max 127)")
		)
		(@subcommand switch =>
			(about: "open one valve and close all others")
			(@arg VALVE: +required "valve index (0-7)")
		)
		(@subcommand interactive =>
			(about: "read valve indices from stdin and switch to them")
		)
	).get_matches();

	match matches.subcommand() {
		("list", _) => {
			list(&matches)
		}
		("info", _) => {
			info(&matches)
		}
		("read", Some(sub_m)) => {
			read(&matches, sub_m)
		}
		("switch", Some(sub_m)) => {
			switch(&matches, sub_m)
		}
		("interactive", _) => {
			interactive(&matches)
		}
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
