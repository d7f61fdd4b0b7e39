//! nRF52840 implementation of the engine's [`Board`] services.

use defmt::warn;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::wdt::WatchdogHandle;
use embassy_time::{block_for, Duration};

use crate::keyboard::{Board, StackProbe};
use crate::serial::{tx_ring, ScannerTx};

/// Fill pattern `cortex-m-rt` paints the stack with at reset.
const STACK_PAINT: u32 = 0xCCCC_CCCC;

/// Longest single busy-wait between watchdog pets.
const DELAY_SLICE_MS: u32 = 10;

pub struct NrfBoard {
    tx: ScannerTx,
    watchdog: WatchdogHandle,
    scanner_power: Output<'static>,
}

impl NrfBoard {
    pub fn new(tx: ScannerTx, watchdog: WatchdogHandle, scanner_power: Output<'static>) -> Self {
        Self {
            tx,
            watchdog,
            scanner_power,
        }
    }

    /// Scanner supply gate, initially off.
    pub fn power_gate(pin: embassy_nrf::peripherals::P0_13) -> Output<'static> {
        Output::new(pin, Level::Low, OutputDrive::Standard)
    }

    pub fn pet(&mut self) {
        self.watchdog.pet();
    }

    /// Hand queued command bytes to the UARTE; its interrupt sends them.
    pub fn pump_tx(&mut self) {
        while let Some(byte) = tx_ring().pop() {
            match self.tx.try_write(&[byte]) {
                Ok(1) => {}
                Ok(_) => warn!("Scanner UART tx buffer full, dropped {=u8:#x}", byte),
                Err(e) => warn!("Scanner UART write failed: {:?}", e),
            }
        }
    }
}

impl Board for NrfBoard {
    fn delay_ms(&mut self, ms: u32) {
        let mut left = ms;
        loop {
            self.pump_tx();
            self.pet();
            if left == 0 {
                break;
            }
            let slice = left.min(DELAY_SLICE_MS);
            block_for(Duration::from_millis(u64::from(slice)));
            left -= slice;
        }
    }

    fn scanner_power(&mut self, on: bool) {
        self.scanner_power.set_level(if on { Level::High } else { Level::Low });
    }

    fn stack_probe(&mut self) -> StackProbe {
        extern "C" {
            static _stack_end: u32;
        }
        let sp = cortex_m::register::msp::read();
        // SAFETY: `_stack_end` is the lowest stack address placed by the
        // linker script; every word between it and the stack pointer is
        // stack memory owned by this core.
        let mut addr = unsafe { core::ptr::addr_of!(_stack_end) } as u32;
        let mut unused: u32 = 0;
        while addr < sp && unsafe { core::ptr::read_volatile(addr as *const u32) } == STACK_PAINT {
            unused += 4;
            addr += 4;
        }
        StackProbe {
            unused: unused.min(u32::from(u16::MAX)) as u16,
            stack_pointer: sp as u16,
        }
    }
}
