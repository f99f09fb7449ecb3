//! bang-bridge firmware entry point.
//!
//! 1. Install the three UART drivers (console, command, debug)
//! 2. Build the bridge engine over command + debug channels
//! 3. Poll forever: relay, console input, log drain

#[cfg(target_os = "espidf")]
use bang_bridge::{
    channel::{CharStream, FmtWriter},
    clock::EspClock,
    config::UartConfig,
    console::Console,
    log_drain::drain_log,
    uart::init_uart,
    Bang, BRIDGE_LOG_STREAM,
};

/// Log entries written per loop iteration, so a log burst cannot starve the relay.
#[cfg(target_os = "espidf")]
const LOG_DRAIN_PER_TICK: usize = 8;

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;

    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // Board wiring, see `uart` module docs
    log::info!("bang-bridge: installing UART drivers");
    let mut term = init_uart(peripherals.uart0, pins.gpio43, pins.gpio44, &UartConfig::CONSOLE)?;
    let cmd = init_uart(peripherals.uart1, pins.gpio17, pins.gpio18, &UartConfig::COMMAND)?;
    let dbg = init_uart(peripherals.uart2, pins.gpio4, pins.gpio5, &UartConfig::DEBUG)?;

    let mut bang = Bang::with_debug(cmd, dbg, EspClock).with_log(&BRIDGE_LOG_STREAM);
    let mut console = Console::new();
    console.print_banner(&mut FmtWriter(&mut term));

    loop {
        bang.sync();

        while let Some(byte) = term.read() {
            console.process_byte(byte, &mut bang, &mut FmtWriter(&mut term));
        }

        drain_log(&BRIDGE_LOG_STREAM, &mut term, LOG_DRAIN_PER_TICK);

        // Yield to the idle task (watchdog)
        FreeRtos::delay_ms(1);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("bang-bridge firmware: build for an ESP-IDF target (e.g. --target xtensa-esp32s3-espidf)");
}
