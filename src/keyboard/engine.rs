//! The keyboard state machine.
//!
//! [`Keyboard::poll_event`] consumes one scanner byte per call. Reports that
//! must go to the host are snapshotted into an outbox which the USB side
//! drains with [`Keyboard::next_report`]; a single byte can produce several
//! (macro playback, stack probe).

use heapless::Deque;

use crate::config::{
    BEEP_FAIL_PAUSE_MS, BEEP_LONG_MS, BEEP_SHORT_MS, MORSE_DAH_MS, MORSE_DIT_MS,
    MORSE_LETTER_GAP_MS, MORSE_SYMBOL_GAP_MS, OUTBOX_DEPTH,
};
use crate::hid::usage::KeyUsage;
use crate::hid::{KeyState, OutboundReport, Protocol, ReportKind, Reports, MAX_REPORT_SIZE};
use crate::link::{response, Command, ScannerLink, BREAK_BIT, SCANCODE_MASK};
use crate::storage::Eeprom;

use super::keymap::{default_usage, KeyMap};
use super::macros::{MacroBuffer, MacroSlot};
use super::morse::{MorseCode, Symbol};
use super::{led, scancode, Board, Mode};

pub struct Keyboard<L, E, B> {
    link: L,
    storage: E,
    board: B,
    keymap: KeyMap,
    reports: Reports,
    mode: Mode,
    protocol: Protocol,
    /// LED state requested by the host, in scanner bits.
    host_leds: u8,
    /// Bits flipped on top of the host state while a function mode is shown.
    led_overlay: u8,
    macro_buffer: MacroBuffer,
    swap_source: u8,
    outbox: Deque<OutboundReport, OUTBOX_DEPTH>,
    last_emitted: Option<ReportKind>,
    scratch: [u8; MAX_REPORT_SIZE],
}

impl<L, E, B> Keyboard<L, E, B>
where
    L: ScannerLink,
    E: Eeprom,
    B: Board,
{
    pub fn new(link: L, storage: E, board: B) -> Self {
        Self {
            link,
            storage,
            board,
            keymap: KeyMap::new(),
            reports: Reports::new(),
            mode: Mode::Reset,
            protocol: Protocol::default(),
            host_leds: 0,
            led_overlay: 0,
            macro_buffer: MacroBuffer::new(),
            swap_source: 0,
            outbox: Deque::new(),
            last_emitted: None,
            scratch: [0; MAX_REPORT_SIZE],
        }
    }

    /// Power the scanner, load the persisted configuration and ask the
    /// scanner to run its self-test.
    pub fn init(&mut self) {
        self.board.scanner_power(true);
        if let Err(e) = self.keymap.check_and_load(&mut self.storage) {
            error!("Loading key map failed: {}", e);
        }
        self.command(Command::Reset);
        self.set_mode(Mode::Reset);
        info!("Keyboard engine started, awaiting scanner self-test");
    }

    /// Process at most one received byte. Returns the kind of the last
    /// report queued for transmission, if any.
    pub fn poll_event(&mut self) -> Option<ReportKind> {
        let byte = self.link.recv_byte()?;
        self.last_emitted = None;
        self.dispatch(byte);
        self.last_emitted.take()
    }

    fn dispatch(&mut self, byte: u8) {
        match self.mode {
            Mode::Error => return,
            Mode::Reset => {}
            _ => match byte {
                response::LAYOUT => return self.set_mode(Mode::Layout),
                response::RESET => {
                    warn!("Scanner restarted");
                    return self.set_mode(Mode::Reset);
                }
                _ => {}
            },
        }

        match self.mode {
            Mode::Reset => self.on_reset_reply(byte),
            Mode::Normal | Mode::MacroRecord => self.on_key(byte),
            Mode::Fn => self.on_function(byte),
            Mode::Morse => self.on_morse(byte),
            Mode::KeySwapCapture1 => self.on_swap_source(byte),
            Mode::KeySwapCapture2 => self.on_swap_target(byte),
            Mode::MacroSave => self.on_macro_save(byte),
            Mode::Layout => {
                debug!("Scanner layout {=u8:#x}", byte);
                self.set_mode(Mode::Normal);
            }
            Mode::Error => {}
        }
    }

    fn on_reset_reply(&mut self, byte: u8) {
        match byte {
            response::RESET_OK => {
                info!("Scanner self-test passed");
                self.send_leds();
                self.set_mode(Mode::Normal);
            }
            response::RESET_FAIL1 => {
                error!("Scanner self-test failed");
                self.reports.fill_error(KeyUsage::PostFail);
                self.emit(ReportKind::Key);
            }
            response::RESET_FAIL2 => {
                error!("Scanner reports fatal error, input disabled");
                self.set_mode(Mode::Error);
            }
            _ => {}
        }
    }

    fn on_key(&mut self, byte: u8) {
        if byte == response::IDLE {
            let state = self.reports.state();
            if state != KeyState::Clear {
                self.reports.clear();
                if state == KeyState::Rollover {
                    self.command(Command::ClickOff);
                }
                self.emit(ReportKind::Key);
            }
            return;
        }

        if byte == scancode::FN {
            if self.mode == Mode::MacroRecord {
                info!("Macro recording finished, {} bytes", self.macro_buffer.len());
                self.command(Command::ClickOff);
                self.reset_leds();
                self.set_mode(Mode::Normal);
            } else if self.reports.state() == KeyState::Clear {
                self.set_mode(Mode::Fn);
                self.led_overlay ^= led::COMPOSE;
                self.send_leds();
            }
            return;
        }

        if let Some(kind) = self.handle_keycode(byte) {
            self.emit(kind);
        }
    }

    /// Apply one make/break byte to the reports, recording it if a macro is
    /// being recorded.
    fn handle_keycode(&mut self, byte: u8) -> Option<ReportKind> {
        let usage = self.keymap.lookup(byte & SCANCODE_MASK);
        if usage == KeyUsage::Reserved {
            return None;
        }

        let before = self.reports.state();
        let kind = if byte & BREAK_BIT != 0 {
            self.reports.release(usage)
        } else {
            self.reports.press(usage)
        };

        if before != KeyState::Rollover && self.reports.state() == KeyState::Rollover {
            warn!("Key rollover");
            self.command(Command::ClickOn);
        }

        if kind.is_some() && self.mode == Mode::MacroRecord {
            // Recording stops before the buffer can overflow.
            let _ = self.macro_buffer.push(byte);
            if self.macro_buffer.is_full() {
                warn!("Macro buffer full, recording stopped");
                self.command(Command::ClickOff);
                self.reset_leds();
                self.set_mode(Mode::Normal);
                self.beep(BEEP_LONG_MS);
            }
        }

        kind
    }

    fn on_function(&mut self, byte: u8) {
        if byte == response::IDLE {
            self.reset_leds();
            return self.set_mode(Mode::Normal);
        }
        // FN itself and every other release are swallowed.
        if byte & BREAK_BIT != 0 {
            return;
        }

        match byte {
            scancode::HELP => {
                self.set_mode(Mode::Morse);
                self.beep(BEEP_LONG_MS);
            }
            scancode::CUT => {
                self.set_mode(Mode::KeySwapCapture1);
                self.beep(BEEP_LONG_MS);
            }
            scancode::ESCAPE => {
                if let Err(e) = self.keymap.reset_to_default(&mut self.storage) {
                    error!("Config reset failed: {}", e);
                }
                self.beep(BEEP_LONG_MS);
                self.reset_leds();
                self.set_mode(Mode::Normal);
            }
            scancode::COPY => {
                self.macro_buffer.clear();
                self.set_mode(Mode::MacroRecord);
                self.command(Command::ClickOn);
            }
            scancode::PASTE => self.set_mode(Mode::MacroSave),
            scancode::AGAIN | scancode::INSERT => {
                self.reset_leds();
                self.set_mode(Mode::Normal);
                self.play_macro();
            }
            scancode::STOP => {
                self.report_stack();
                self.reset_leds();
                self.set_mode(Mode::Normal);
            }
            _ => {
                if let Some(slot) = MacroSlot::from_scancode(byte) {
                    if let Err(e) = slot.load(&mut self.storage, &mut self.macro_buffer) {
                        error!("Loading {} failed: {}", slot, e);
                        self.macro_buffer.clear();
                    }
                    self.reset_leds();
                    self.set_mode(Mode::Normal);
                    self.play_macro();
                }
            }
        }
    }

    /// Replay the macro buffer as if typed, one report per byte, then
    /// release anything still held.
    fn play_macro(&mut self) {
        debug!("Playing {} byte macro", self.macro_buffer.len());
        let buffer = core::mem::take(&mut self.macro_buffer);
        for &byte in &buffer {
            let kind = self.handle_keycode(byte).unwrap_or(ReportKind::Key);
            self.emit(kind);
        }
        self.macro_buffer = buffer;

        let state = self.reports.state();
        if state != KeyState::Clear {
            self.reports.clear();
            if state == KeyState::Rollover {
                self.command(Command::ClickOff);
            }
            self.emit(ReportKind::Key);
        }
    }

    /// Send the stack figures to the host in the modifier byte of four key
    /// reports (unused low, unused high, SP low, SP high), then a clean one.
    fn report_stack(&mut self) {
        let probe = self.board.stack_probe();
        info!("Stack probe: {}", probe);
        let [unused_lo, unused_hi] = probe.unused.to_le_bytes();
        let [sp_lo, sp_hi] = probe.stack_pointer.to_le_bytes();
        for value in [unused_lo, unused_hi, sp_lo, sp_hi, 0] {
            self.reports.set_modifier(value);
            self.emit(ReportKind::Key);
        }
    }

    fn on_morse(&mut self, byte: u8) {
        if byte == scancode::FN {
            self.reset_leds();
            return self.set_mode(Mode::Normal);
        }
        if byte & BREAK_BIT != 0 {
            return;
        }
        if let Some(code) = MorseCode::for_usage(default_usage(byte)) {
            for symbol in code {
                self.beep(match symbol {
                    Symbol::Dit => MORSE_DIT_MS,
                    Symbol::Dah => MORSE_DAH_MS,
                });
                self.board.delay_ms(MORSE_SYMBOL_GAP_MS);
            }
            self.board.delay_ms(MORSE_LETTER_GAP_MS);
        }
    }

    fn on_swap_source(&mut self, byte: u8) {
        if byte == scancode::FN {
            self.reset_leds();
            self.set_mode(Mode::Normal);
        } else if byte < scancode::LAYOUT_ALIAS {
            self.swap_source = byte;
            self.set_mode(Mode::KeySwapCapture2);
        }
    }

    fn on_swap_target(&mut self, byte: u8) {
        if byte >= scancode::LAYOUT_ALIAS {
            return;
        }
        self.reset_leds();
        self.set_mode(Mode::Normal);
        if byte != scancode::FN {
            let usage = default_usage(self.swap_source);
            if let Err(e) = self.keymap.remap(&mut self.storage, byte, usage) {
                error!("Remap failed: {}", e);
            }
            self.beep(BEEP_SHORT_MS);
        }
    }

    fn on_macro_save(&mut self, byte: u8) {
        if byte >= response::IDLE {
            return;
        }
        if byte != scancode::FN {
            let Some(slot) = MacroSlot::from_scancode(byte) else {
                return;
            };
            match slot.save(&mut self.storage, &self.macro_buffer) {
                Ok(()) => self.beep(BEEP_SHORT_MS),
                Err(e) => {
                    warn!("Macro not saved: {}", e);
                    self.beep(BEEP_SHORT_MS);
                    self.board.delay_ms(BEEP_FAIL_PAUSE_MS);
                    self.beep(BEEP_SHORT_MS);
                }
            }
        }
        self.reset_leds();
        self.set_mode(Mode::Normal);
    }

    fn emit(&mut self, kind: ReportKind) {
        let wire_kind = match (self.protocol, kind) {
            (Protocol::Report, _) => kind,
            (Protocol::Boot, ReportKind::Boot | ReportKind::Key) => ReportKind::Boot,
            // The boot keyboard report does not carry media or system keys.
            (Protocol::Boot, ReportKind::Media | ReportKind::System) => return,
        };
        let n = self.reports.serialize(kind, self.protocol, &mut self.scratch);
        if self.outbox.is_full() {
            warn!("Report outbox full, dropping oldest");
            self.outbox.pop_front();
        }
        let _ = self
            .outbox
            .push_back(OutboundReport::new(wire_kind, &self.scratch[..n]));
        self.last_emitted = Some(kind);
    }

    /// Queue the current state of `kind` again (idle-rate repeat).
    pub fn resend(&mut self, kind: ReportKind) {
        self.emit(kind);
    }

    /// Oldest report not yet handed to the host.
    pub fn next_report(&mut self) -> Option<OutboundReport> {
        self.outbox.pop_front()
    }

    pub fn has_pending_reports(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Wire bytes of `kind` as of now, for GET_REPORT. Under boot protocol
    /// this is always the boot keyboard report.
    pub fn pending_report_bytes(&mut self, kind: ReportKind) -> &[u8] {
        let n = self.reports.serialize(kind, self.protocol, &mut self.scratch);
        &self.scratch[..n]
    }

    /// SET_REPORT(Output): the host's LED byte.
    pub fn set_led_report(&mut self, host: u8) {
        self.host_leds = led::from_host(host);
        self.send_leds();
    }

    pub fn get_protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn set_protocol(&mut self, protocol: Protocol) {
        debug!("Protocol {}", protocol);
        if protocol == Protocol::Report {
            self.reports.clear();
        }
        self.protocol = protocol;
    }

    fn send_leds(&mut self) {
        let leds = self.leds();
        if let Err(e) = self.link.command_with(Command::LedStatus, leds) {
            warn!("LED update dropped: {}", e);
        }
    }

    fn reset_leds(&mut self) {
        self.led_overlay = 0;
        self.send_leds();
    }

    fn command(&mut self, command: Command) {
        if let Err(e) = self.link.command(command) {
            warn!("Scanner command {} dropped: {}", command, e);
        }
    }

    fn beep(&mut self, ms: u32) {
        self.command(Command::BellOn);
        self.board.delay_ms(ms);
        self.command(Command::BellOff);
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!("Mode {} -> {}", self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// LED bits currently shown on the scanner.
    pub fn leds(&self) -> u8 {
        self.host_leds ^ self.led_overlay
    }

    pub fn reports(&self) -> &Reports {
        &self.reports
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn macro_buffer(&self) -> &[u8] {
        &self.macro_buffer
    }

    pub fn storage(&self) -> &E {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut E {
        &mut self.storage
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }
}
