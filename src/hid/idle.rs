//! HID idle-rate bookkeeping (GET_IDLE / SET_IDLE and periodic resend).
//!
//! Rates are in the HID unit of 4 ms; a rate of 0 means "only report on
//! change". Boot and key reports share one timer since boot protocol only
//! ever exposes the keyboard report.

use heapless::Vec;

use super::ReportKind;

const TIMERS: usize = 3;

/// Per-report idle timers, ticked every [`crate::config::IDLE_TICK_MS`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdleTimers {
    rate: [u8; TIMERS],
    remaining: [u8; TIMERS],
}

impl IdleTimers {
    pub const fn new() -> Self {
        Self {
            rate: [0; TIMERS],
            remaining: [0; TIMERS],
        }
    }

    /// SET_IDLE for `report_id` (0 = boot / all, 1 = key, 2 = media, 3 = system).
    pub fn set_idle(&mut self, report_id: u8, rate: u8) {
        if let Some(i) = timer_index(report_id) {
            self.rate[i] = rate;
            self.remaining[i] = rate;
        }
    }

    /// GET_IDLE for `report_id`; `None` for ids this device does not have.
    pub fn get_idle(&self, report_id: u8) -> Option<u8> {
        timer_index(report_id).map(|i| self.rate[i])
    }

    /// Age every timer by one tick and return the reports that are due for
    /// an unchanged resend. Expired timers reload from their rate.
    pub fn tick(&mut self) -> Vec<ReportKind, TIMERS> {
        let mut due = Vec::new();
        for i in 0..TIMERS {
            match self.remaining[i] {
                0 => {}
                1 => {
                    self.remaining[i] = self.rate[i];
                    let _ = due.push(timer_kind(i));
                }
                _ => self.remaining[i] -= 1,
            }
        }
        due
    }
}

fn timer_index(report_id: u8) -> Option<usize> {
    match report_id {
        0 | 1 => Some(0),
        2 => Some(1),
        3 => Some(2),
        _ => None,
    }
}

fn timer_kind(index: usize) -> ReportKind {
    match index {
        0 => ReportKind::Key,
        1 => ReportKind::Media,
        _ => ReportKind::System,
    }
}
