//! USB HID keyboard device.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes one HID interface carrying the key, media and
//! system reports. Control requests are answered here from state shared
//! with the main loop: the last report of each kind (GET_REPORT), the
//! idle timers (GET/SET_IDLE) and the host LED byte (SET_REPORT).

use core::cell::RefCell;

use defmt::{debug, info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::{Builder, Config, Handler, UsbDevice};
use heapless::Vec;
use static_cell::StaticCell;

use super::descriptor::REPORT_DESCRIPTOR;
use crate::config;
use crate::error::Error;
use crate::hid::idle::IdleTimers;
use crate::hid::{parse_led_output, OutboundReport, ReportKind, MAX_REPORT_SIZE};

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

pub type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;
pub type KeyboardWriter = HidWriter<'static, UsbDriver, MAX_REPORT_SIZE>;

static HID_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static DEVICE_HANDLER: StaticCell<DeviceHandler> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<KeyboardRequestHandler> = StaticCell::new();

static LED_SIGNAL: Signal<CriticalSectionRawMutex, u8> = Signal::new();
static BUS_RESET: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static CONFIGURED: Signal<CriticalSectionRawMutex, bool> = Signal::new();

static IDLE_TIMERS: Mutex<CriticalSectionRawMutex, RefCell<IdleTimers>> =
    Mutex::new(RefCell::new(IdleTimers::new()));

/// Last report sent per kind, indexed by report id.
static REPORT_CACHE: Mutex<CriticalSectionRawMutex, RefCell<[Option<OutboundReport>; 4]>> =
    Mutex::new(RefCell::new([None; 4]));

/// Host LED byte from SET_REPORT(Output).
pub fn led_signal() -> &'static Signal<CriticalSectionRawMutex, u8> {
    &LED_SIGNAL
}

/// Returns `true` once after each USB bus reset.
pub fn take_bus_reset() -> bool {
    BUS_RESET.try_take().is_some()
}

/// Wait until the host has configured the device.
pub async fn wait_configured() {
    while !CONFIGURED.wait().await {}
}

/// Age the idle timers by one tick; returns the reports due for a repeat.
pub fn idle_tick() -> Vec<ReportKind, 3> {
    IDLE_TIMERS.lock(|timers| timers.borrow_mut().tick())
}

/// Remember `report` as the answer to GET_REPORT for its id.
pub fn cache_report(report: &OutboundReport) {
    REPORT_CACHE.lock(|cache| {
        cache.borrow_mut()[usize::from(report.kind.report_id())] = Some(*report);
    });
}

struct DeviceHandler;

impl Handler for DeviceHandler {
    fn reset(&mut self) {
        debug!("USB bus reset");
        BUS_RESET.signal(());
    }

    fn configured(&mut self, configured: bool) {
        info!("USB configured: {}", configured);
        CONFIGURED.signal(configured);
    }

    fn suspended(&mut self, suspended: bool) {
        debug!("USB suspended: {}", suspended);
    }
}

struct KeyboardRequestHandler;

impl RequestHandler for KeyboardRequestHandler {
    fn get_report(&mut self, id: ReportId, buf: &mut [u8]) -> Option<usize> {
        let ReportId::In(report_id) = id else {
            return None;
        };
        let kind = ReportKind::from_report_id(report_id)?;
        let cached = REPORT_CACHE.lock(|cache| cache.borrow()[usize::from(report_id)]);
        let report = cached.unwrap_or_else(|| {
            let mut empty = [0u8; MAX_REPORT_SIZE];
            if kind != ReportKind::Boot {
                empty[0] = report_id;
            }
            OutboundReport::new(kind, &empty[..kind.wire_len()])
        });
        let bytes = report.as_bytes();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Some(n)
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        match (id, parse_led_output(data)) {
            (ReportId::Out(_), Some(leds)) => {
                LED_SIGNAL.signal(leds);
                OutResponse::Accepted
            }
            _ => {
                warn!("Rejected SET_REPORT {:?} ({} bytes)", id, data.len());
                OutResponse::Rejected
            }
        }
    }

    fn get_idle_ms(&mut self, id: Option<ReportId>) -> Option<u32> {
        let report_id = match id {
            Some(ReportId::In(report_id)) => report_id,
            None => 0,
            Some(_) => return None,
        };
        IDLE_TIMERS
            .lock(|timers| timers.borrow().get_idle(report_id))
            .map(|rate| u32::from(rate) * config::IDLE_TICK_MS as u32)
    }

    fn set_idle_ms(&mut self, id: Option<ReportId>, duration_ms: u32) {
        let rate = (duration_ms / config::IDLE_TICK_MS as u32).min(u32::from(u8::MAX)) as u8;
        IDLE_TIMERS.lock(|timers| {
            let mut timers = timers.borrow_mut();
            match id {
                Some(ReportId::In(report_id)) => timers.set_idle(report_id, rate),
                None => {
                    for report_id in 1..=3 {
                        timers.set_idle(report_id, rate);
                    }
                }
                Some(_) => {}
            }
        });
        debug!("SET_IDLE {:?} -> {} ms", id, duration_ms);
    }
}

/// Build result containing the USB device runner and the HID writer.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub writer: KeyboardWriter,
}

/// Initialise the USB stack and create the HID device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbHidDevice {
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        usb_config,
        USB_CONFIG_DESC.init([0u8; 256]),
        USB_BOS_DESC.init([0u8; 256]),
        USB_MSOS_DESC.init([0u8; 256]),
        USB_CTRL_BUF.init([0u8; 128]),
    );
    builder.handler(DEVICE_HANDLER.init(DeviceHandler));

    let hid_config = HidConfig {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: Some(REQUEST_HANDLER.init(KeyboardRequestHandler)),
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: MAX_REPORT_SIZE as u16,
    };
    let writer = HidWriter::new(&mut builder, HID_STATE.init(State::new()), hid_config);

    let device = builder.build();
    info!("USB HID keyboard initialised");

    UsbHidDevice { device, writer }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Send one report and record it for GET_REPORT.
pub async fn send_report(writer: &mut KeyboardWriter, report: &OutboundReport) -> Result<(), Error> {
    cache_report(report);
    writer.write(report.as_bytes()).await.map_err(|_| {
        warn!("USB report write failed");
        Error::Usb
    })
}
