//! scan2usb - serial-scanned keyboard to USB HID on the nRF52840.
//!
//! Data flow: buffered UARTE0 → rx task → receive ring → [`Keyboard`] engine →
//! outbound report queue → USB HID writer. Host LED and idle requests come
//! back through the HID request handler.

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_futures::select::{select3, Either3};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::wdt::{self, Watchdog};
use embassy_time::{Duration, Ticker};
use embassy_usb::UsbDevice;
use {defmt_rtt as _, panic_probe as _};

use scan2usb::board::NrfBoard;
use scan2usb::config::{IDLE_TICK_MS, WATCHDOG_TIMEOUT_MS};
use scan2usb::hid::Protocol;
use scan2usb::keyboard::Keyboard;
use scan2usb::link::ScannerLink;
use scan2usb::serial::{self, ScannerRx, SerialParts};
use scan2usb::storage::flash;
use scan2usb::usb::hid_device::{self, UsbDriver};

/// Watchdog counter frequency (32.768 kHz LFCLK).
const WDT_TICKS_PER_SECOND: u32 = 32_768;

#[embassy_executor::task]
async fn usb_task(device: UsbDevice<'static, UsbDriver>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn scanner_rx_task(rx: ScannerRx) -> ! {
    serial::rx_task(rx).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("scan2usb starting");

    let mut wdt_config = wdt::Config::default();
    wdt_config.timeout_ticks = WDT_TICKS_PER_SECOND * WATCHDOG_TIMEOUT_MS / 1000;
    wdt_config.action_during_debug_halt = wdt::HaltConfig::PAUSE;
    let Ok((_watchdog, [watchdog])) = Watchdog::try_new(p.WDT, wdt_config) else {
        defmt::panic!("Watchdog already running with a different configuration");
    };

    let mut nvm = BlockingAsync::new(Nvmc::new(p.NVMC));
    let image = flash::load(&mut nvm).await;

    let (tx, rx) = serial::init(SerialParts {
        uarte: p.UARTE0,
        timer: p.TIMER1,
        ppi_ch1: p.PPI_CH0,
        ppi_ch2: p.PPI_CH1,
        ppi_group: p.PPI_GROUP0,
        rxd: p.P0_08,
        txd: p.P0_06,
    });
    let usb = hid_device::init(p.USBD);
    let mut writer = usb.writer;

    if spawner.spawn(usb_task(usb.device)).is_err() {
        defmt::panic!("Failed to spawn USB task");
    }
    if spawner.spawn(scanner_rx_task(rx)).is_err() {
        defmt::panic!("Failed to spawn scanner rx task");
    }

    let board = NrfBoard::new(tx, watchdog, NrfBoard::power_gate(p.P0_13));
    let mut keyboard = Keyboard::new(serial::link(), image, board);
    keyboard.init();
    keyboard.board_mut().pump_tx();

    hid_device::wait_configured().await;
    info!("Host connected, entering main loop");

    let mut ticker = Ticker::every(Duration::from_millis(IDLE_TICK_MS));

    loop {
        match select3(
            serial::rx_ready().wait(),
            ticker.next(),
            hid_device::led_signal().wait(),
        )
        .await
        {
            Either3::First(()) => {
                while keyboard.link_mut().byte_available() {
                    keyboard.poll_event();
                }
            }
            Either3::Second(()) => {
                for kind in hid_device::idle_tick() {
                    keyboard.resend(kind);
                }
            }
            Either3::Third(leds) => keyboard.set_led_report(leds),
        }

        if hid_device::take_bus_reset() {
            keyboard.set_protocol(Protocol::Report);
        }

        while let Some(report) = keyboard.next_report() {
            if hid_device::send_report(&mut writer, &report).await.is_err() {
                warn!("Dropped {:?} report", report.kind);
            }
        }

        if flash::flush(&mut nvm, keyboard.storage_mut()).await.is_err() {
            warn!("Config image not saved, will retry");
        }

        let board = keyboard.board_mut();
        board.pump_tx();
        board.pet();
    }
}
