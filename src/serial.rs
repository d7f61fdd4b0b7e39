//! UART link to the scanner MCU.
//!
//! UARTE0 runs as a `BufferedUarte`: its interrupt keeps receiving into
//! the rx buffer and sending from the tx buffer even while the engine sits
//! in a busy-wait. The rx task moves received bytes into the engine's
//! receive ring and wakes the main loop; the board copies the engine's
//! transmit ring into the tx buffer.

use defmt::{info, warn};
use embassy_nrf::buffered_uarte::{self, BufferedUarte, BufferedUarteRx, BufferedUarteTx};
use embassy_nrf::uarte::{Baudrate, Config, Parity};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;

use crate::config::{SCANNER_BAUD, UART_RX_BUFFER, UART_TX_BUFFER};
use crate::link::{IsrLink, LinkRing};

bind_interrupts!(struct Irqs {
    UARTE0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
});

static RX_RING: LinkRing = LinkRing::new();
static TX_RING: LinkRing = LinkRing::new();
static RX_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

static RX_BUFFER: StaticCell<[u8; UART_RX_BUFFER]> = StaticCell::new();
static TX_BUFFER: StaticCell<[u8; UART_TX_BUFFER]> = StaticCell::new();

/// Retry period while the engine's receive ring is full.
const RING_FULL_BACKOFF: Duration = Duration::from_millis(2);

pub type ScannerTx = BufferedUarteTx<'static, peripherals::UARTE0>;
pub type ScannerRx = BufferedUarteRx<'static, peripherals::UARTE0, peripherals::TIMER1>;

/// The engine's view of the link.
pub fn link() -> IsrLink<'static> {
    IsrLink::new(&RX_RING, &TX_RING)
}

/// Signalled whenever a received byte is waiting.
pub fn rx_ready() -> &'static Signal<CriticalSectionRawMutex, ()> {
    &RX_READY
}

/// Transmit ring, drained by [`crate::board::NrfBoard`].
pub fn tx_ring() -> &'static LinkRing {
    &TX_RING
}

/// Peripherals claimed by the scanner UART.
pub struct SerialParts {
    pub uarte: peripherals::UARTE0,
    pub timer: peripherals::TIMER1,
    pub ppi_ch1: peripherals::PPI_CH0,
    pub ppi_ch2: peripherals::PPI_CH1,
    pub ppi_group: peripherals::PPI_GROUP0,
    pub rxd: peripherals::P0_08,
    pub txd: peripherals::P0_06,
}

/// Configure UARTE0 for the scanner and split it. Must be called once.
pub fn init(parts: SerialParts) -> (ScannerTx, ScannerRx) {
    let mut config = Config::default();
    config.parity = Parity::EXCLUDED;
    const _: () = assert!(SCANNER_BAUD == 1200);
    config.baudrate = Baudrate::BAUD1200;
    info!("Scanner UART at {} baud", SCANNER_BAUD);

    let uart = BufferedUarte::new(
        parts.uarte,
        parts.timer,
        parts.ppi_ch1,
        parts.ppi_ch2,
        parts.ppi_group,
        Irqs,
        parts.rxd,
        parts.txd,
        config,
        RX_BUFFER.init([0; UART_RX_BUFFER]),
        TX_BUFFER.init([0; UART_TX_BUFFER]),
    );
    let (rx, tx) = uart.split();
    (tx, rx)
}

/// Receive loop - must be spawned as a dedicated Embassy task.
pub async fn rx_task(mut rx: ScannerRx) -> ! {
    loop {
        let taken = match rx.fill_buf().await {
            Ok(received) => {
                let mut taken = 0;
                for &byte in received {
                    if !RX_RING.push(byte) {
                        break;
                    }
                    taken += 1;
                }
                taken
            }
            Err(e) => {
                warn!("Scanner UART error: {:?}", e);
                continue;
            }
        };
        if taken > 0 {
            rx.consume(taken);
            RX_READY.signal(());
        } else {
            // The rest stays in the UARTE buffer until the engine catches up.
            RX_READY.signal(());
            Timer::after(RING_FULL_BACKOFF).await;
        }
    }
}
