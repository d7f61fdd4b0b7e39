//! Engine behaviour tests.
//!
//! The engine runs against a scripted link and a board that log every
//! byte sent to the scanner and every delay, in order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::keymap::{default_usage, KeyMap};
use super::macros::{MacroBuffer, MacroSlot};
use super::{scancode, Board, Keyboard, Mode, StackProbe};
use crate::config::KEYMAP_VERSION;
use crate::error::Error;
use crate::hid::usage::KeyUsage;
use crate::hid::{KeyState, Protocol, ReportKind};
use crate::link::{response, Command, ScannerLink};
use crate::storage::layout::{KEYMAP_ADDR, MACRO1_ADDR, VERSION_ADDR};
use crate::storage::{ConfigImage, Eeprom};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Event {
    Tx(u8),
    Delay(u32),
    Power(bool),
}

type Log = Rc<RefCell<Vec<Event>>>;

struct ScriptLink {
    rx: VecDeque<u8>,
    log: Log,
}

impl ScannerLink for ScriptLink {
    fn byte_available(&self) -> bool {
        !self.rx.is_empty()
    }

    fn recv_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.log.borrow_mut().push(Event::Tx(byte));
        Ok(())
    }

    fn send_pair(&mut self, first: u8, second: u8) -> Result<(), Error> {
        self.send_byte(first)?;
        self.send_byte(second)
    }
}

struct TestBoard {
    log: Log,
}

impl Board for TestBoard {
    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Event::Delay(ms));
    }

    fn scanner_power(&mut self, on: bool) {
        self.log.borrow_mut().push(Event::Power(on));
    }

    fn stack_probe(&mut self) -> StackProbe {
        StackProbe {
            unused: 0x0312,
            stack_pointer: 0xFF80,
        }
    }
}

struct Rig {
    kb: Keyboard<ScriptLink, ConfigImage, TestBoard>,
    log: Log,
}

impl Rig {
    fn with_image(image: ConfigImage) -> Self {
        let log = Log::default();
        let link = ScriptLink {
            rx: VecDeque::new(),
            log: log.clone(),
        };
        let board = TestBoard { log: log.clone() };
        Self {
            kb: Keyboard::new(link, image, board),
            log,
        }
    }

    /// Engine past the scanner handshake, with logs and outbox empty.
    fn booted() -> Self {
        let mut rig = Self::with_image(ConfigImage::new());
        rig.kb.init();
        rig.feed(&[response::RESET, response::RESET_OK]);
        assert_eq!(rig.kb.mode(), Mode::Normal);
        rig.take_log();
        rig.take_reports();
        rig
    }

    /// Push `bytes` and poll once per byte.
    fn feed(&mut self, bytes: &[u8]) -> Vec<Option<ReportKind>> {
        self.kb.link_mut().rx.extend(bytes.iter().copied());
        bytes.iter().map(|_| self.kb.poll_event()).collect()
    }

    fn take_log(&mut self) -> Vec<Event> {
        self.log.take()
    }

    fn take_reports(&mut self) -> Vec<Vec<u8>> {
        core::iter::from_fn(|| self.kb.next_report())
            .map(|r| r.as_bytes().to_vec())
            .collect()
    }

    fn sent(&mut self) -> Vec<u8> {
        self.take_log()
            .into_iter()
            .filter_map(|e| match e {
                Event::Tx(b) => Some(b),
                _ => None,
            })
            .collect()
    }
}

const A: u8 = 0x4D;
const C: u8 = 0x66;
const LEFT_CTRL: u8 = 0x4C;
const RIGHT_SHIFT: u8 = 0x6E;
const POWER: u8 = 0x30;
const VOLUME_UP: u8 = 0x04;
const E: u8 = 0x38;
const ROW: [u8; 7] = [0x4D, 0x4E, 0x4F, 0x50, 0x51, 0x52, 0x53];

const fn brk(scancode: u8) -> u8 {
    scancode | 0x80
}

const BELL_ON: u8 = Command::BellOn as u8;
const BELL_OFF: u8 = Command::BellOff as u8;
const CLICK_ON: u8 = Command::ClickOn as u8;
const CLICK_OFF: u8 = Command::ClickOff as u8;
const LED_STATUS: u8 = Command::LedStatus as u8;

fn beep(ms: u32) -> [Event; 3] {
    [Event::Tx(BELL_ON), Event::Delay(ms), Event::Tx(BELL_OFF)]
}

fn key(modifier: u8, keys: &[u8]) -> Vec<u8> {
    let mut report = vec![0x01, modifier, 0, 0, 0, 0, 0, 0];
    report[2..2 + keys.len()].copy_from_slice(keys);
    report
}

/// Record `bytes` as a macro and leave record mode.
fn record(rig: &mut Rig, bytes: &[u8]) {
    rig.feed(&[scancode::FN, scancode::COPY, brk(scancode::COPY), brk(scancode::FN)]);
    rig.feed(&[response::IDLE]);
    rig.feed(bytes);
    rig.feed(&[response::IDLE, scancode::FN, brk(scancode::FN), response::IDLE]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

// ═══════════════════════════════════════════════════════════════════════════
// Scanner handshake
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn init_powers_scanner_and_requests_reset() {
    let mut rig = Rig::with_image(ConfigImage::new());
    rig.kb.init();
    assert_eq!(
        rig.take_log(),
        [Event::Power(true), Event::Tx(Command::Reset as u8)]
    );
    assert_eq!(rig.kb.mode(), Mode::Reset);
    // Blank storage counts as a version mismatch.
    assert_eq!(rig.kb.storage().image()[VERSION_ADDR], KEYMAP_VERSION);
}

#[test]
fn reset_ok_sends_led_state_and_goes_normal() {
    let mut rig = Rig::with_image(ConfigImage::new());
    rig.kb.init();
    rig.take_log();
    rig.kb.set_led_report(0x01);
    rig.take_log();

    assert_eq!(rig.feed(&[response::RESET, response::RESET_OK]), [None, None]);
    assert_eq!(rig.sent(), [LED_STATUS, 0x01]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

#[test]
fn self_test_failure_reports_post_fail_then_halts() {
    let mut rig = Rig::with_image(ConfigImage::new());
    rig.kb.init();

    assert_eq!(rig.feed(&[response::RESET_FAIL1]), [Some(ReportKind::Key)]);
    assert_eq!(rig.take_reports(), [vec![0x01, 0, 2, 2, 2, 2, 2, 2]]);
    assert_eq!(rig.kb.mode(), Mode::Reset);

    rig.feed(&[response::RESET_FAIL2]);
    assert_eq!(rig.kb.mode(), Mode::Error);

    assert_eq!(
        rig.feed(&[response::RESET, response::RESET_OK, A]),
        [None, None, None]
    );
    assert_eq!(rig.kb.mode(), Mode::Error);
    assert!(rig.take_reports().is_empty());
}

#[test]
fn reset_mid_mode_abandons_it() {
    let mut rig = Rig::booted();
    rig.feed(&[scancode::FN, scancode::HELP]);
    assert_eq!(rig.kb.mode(), Mode::Morse);

    rig.feed(&[response::RESET]);
    assert_eq!(rig.kb.mode(), Mode::Reset);
    assert_eq!(rig.feed(&[A]), [None]);
    rig.feed(&[response::RESET_OK]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

#[test]
fn layout_byte_is_swallowed() {
    let mut rig = Rig::booted();
    assert_eq!(rig.feed(&[response::LAYOUT, A]), [None, None]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert_eq!(rig.feed(&[A]), [Some(ReportKind::Key)]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Normal typing
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn press_then_release_leaves_report_empty() {
    // The break byte of the last position is LAYOUT; covered separately.
    for code in 0..scancode::LAYOUT_ALIAS {
        if code == scancode::FN {
            continue;
        }
        let mut rig = Rig::booted();
        rig.feed(&[code, brk(code)]);
        assert!(rig.kb.reports().is_empty(), "scancode {code:#04x}");
        assert_eq!(rig.kb.reports().state(), KeyState::Clear);
        assert_eq!(rig.kb.reports().media().mask, 0);
        assert_eq!(rig.kb.reports().system().mask, 0);
        assert_eq!(rig.kb.mode(), Mode::Normal);
    }
}

#[test]
fn last_position_break_reads_as_layout() {
    let mut rig = Rig::booted();
    rig.feed(&[scancode::LAYOUT_ALIAS, brk(scancode::LAYOUT_ALIAS)]);
    assert_eq!(rig.kb.mode(), Mode::Layout);
    rig.feed(&[0x00]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

#[test]
fn typing_emits_key_reports() {
    let mut rig = Rig::booted();
    assert_eq!(
        rig.feed(&[LEFT_CTRL, C, brk(C), brk(LEFT_CTRL)]),
        [Some(ReportKind::Key); 4]
    );
    assert_eq!(
        rig.take_reports(),
        [key(0x01, &[]), key(0x01, &[0x06]), key(0x01, &[]), key(0, &[])]
    );
}

#[test]
fn idle_never_sends_duplicate_empty_reports() {
    let mut rig = Rig::booted();
    assert_eq!(rig.feed(&[response::IDLE]), [None]);

    rig.feed(&[A, brk(A)]);
    rig.take_reports();
    assert_eq!(rig.feed(&[response::IDLE]), [None]);

    rig.feed(&[A]);
    rig.take_reports();
    assert_eq!(rig.feed(&[response::IDLE]), [Some(ReportKind::Key)]);
    assert_eq!(rig.take_reports(), [key(0, &[])]);
    assert_eq!(rig.feed(&[response::IDLE]), [None]);
    assert!(rig.sent().is_empty());
}

#[test]
fn rollover_clicks_once_and_clears_on_idle() {
    let mut rig = Rig::booted();
    rig.feed(&ROW[..6]);
    assert_eq!(rig.kb.reports().key().keys.len(), 6);
    assert!(!rig.kb.reports().key().contains(KeyUsage::Reserved));
    assert!(rig.sent().is_empty());

    assert_eq!(rig.feed(&[ROW[6]]), [Some(ReportKind::Key)]);
    assert_eq!(rig.kb.reports().key().keys, [KeyUsage::ErrorRollOver; 6]);
    assert_eq!(rig.feed(&[0x54, brk(ROW[0])]), [None, None]);
    assert_eq!(rig.sent(), [CLICK_ON]);

    rig.take_reports();
    assert_eq!(rig.feed(&[response::IDLE]), [Some(ReportKind::Key)]);
    assert_eq!(rig.sent(), [CLICK_OFF]);
    assert_eq!(rig.take_reports(), [key(0, &[])]);
    assert_eq!(rig.kb.reports().state(), KeyState::Clear);
}

#[test]
fn media_and_power_keys() {
    let mut rig = Rig::booted();
    assert_eq!(rig.feed(&[VOLUME_UP]), [Some(ReportKind::Media)]);
    assert_eq!(rig.feed(&[brk(VOLUME_UP)]), [Some(ReportKind::Media)]);
    assert_eq!(rig.take_reports(), [vec![0x02, 0x02], vec![0x02, 0x00]]);

    rig.feed(&[RIGHT_SHIFT]);
    rig.take_reports();
    assert_eq!(rig.feed(&[POWER]), [Some(ReportKind::System)]);
    rig.feed(&[brk(RIGHT_SHIFT)]);
    assert_eq!(rig.feed(&[brk(POWER)]), [Some(ReportKind::System)]);
    assert_eq!(
        rig.take_reports(),
        [vec![0x03, 0x01], key(0, &[]), vec![0x03, 0x00]]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// LEDs and the Fn layer
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn host_leds_are_translated() {
    let mut rig = Rig::booted();
    rig.kb.set_led_report(0b1111);
    assert_eq!(rig.sent(), [LED_STATUS, 0x0F]);
    rig.kb.set_led_report(0b0010);
    assert_eq!(rig.sent(), [LED_STATUS, 0x08]);
    rig.kb.set_led_report(0b0100);
    assert_eq!(rig.sent(), [LED_STATUS, 0x04]);
}

#[test]
fn fn_layer_shows_compose_until_idle() {
    let mut rig = Rig::booted();
    rig.kb.set_led_report(0b0010);
    rig.take_log();

    assert_eq!(rig.feed(&[scancode::FN]), [None]);
    assert_eq!(rig.kb.mode(), Mode::Fn);
    assert_eq!(rig.sent(), [LED_STATUS, 0x0A]);

    // Breaks and unknown makes are swallowed.
    assert_eq!(rig.feed(&[brk(scancode::FN), A]), [None, None]);
    assert_eq!(rig.kb.mode(), Mode::Fn);

    rig.feed(&[response::IDLE]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert_eq!(rig.sent(), [LED_STATUS, 0x08]);
    assert!(rig.take_reports().is_empty());
}

#[test]
fn fn_is_ignored_while_keys_are_down() {
    let mut rig = Rig::booted();
    rig.feed(&[A]);
    assert_eq!(rig.feed(&[scancode::FN]), [None]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert!(rig.sent().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Macros
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn record_save_and_play_back() {
    let mut rig = Rig::booted();

    rig.feed(&[scancode::FN, scancode::COPY]);
    assert_eq!(rig.kb.mode(), Mode::MacroRecord);
    assert_eq!(rig.sent(), [LED_STATUS, 0x02, CLICK_ON]);

    rig.feed(&[brk(scancode::COPY), brk(scancode::FN), response::IDLE]);
    rig.feed(&[A, brk(A), response::IDLE]);
    assert_eq!(rig.kb.macro_buffer(), &[A, brk(A)]);

    rig.feed(&[scancode::FN]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert_eq!(rig.sent(), [CLICK_OFF, LED_STATUS, 0x00]);
    rig.feed(&[brk(scancode::FN), response::IDLE]);

    rig.feed(&[scancode::FN, scancode::PASTE]);
    assert_eq!(rig.kb.mode(), Mode::MacroSave);
    rig.take_log();
    rig.feed(&[scancode::N1]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    let mut expected = beep(50).to_vec();
    expected.extend([Event::Tx(LED_STATUS), Event::Tx(0x00)]);
    assert_eq!(rig.take_log(), expected);
    rig.feed(&[brk(scancode::N1), brk(scancode::PASTE), brk(scancode::FN)]);
    rig.feed(&[response::IDLE]);
    rig.take_reports();

    assert_eq!(
        rig.feed(&[scancode::FN, scancode::N1]),
        [None, Some(ReportKind::Key)]
    );
    assert_eq!(rig.take_reports(), [key(0, &[0x04]), key(0, &[])]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

#[test]
fn f9_to_f12_select_slots_too() {
    let mut rig = Rig::booted();
    record(&mut rig, &[E, brk(E)]);
    rig.feed(&[scancode::FN, scancode::PASTE, scancode::F12]);
    rig.feed(&[response::IDLE]);
    rig.take_reports();

    rig.feed(&[scancode::FN, scancode::N4]);
    assert_eq!(rig.take_reports(), [key(0, &[0x08]), key(0, &[])]);
}

#[test]
fn oversize_macro_is_rejected_and_slot_kept() {
    let mut rig = Rig::booted();
    MacroSlot::Slot3
        .save(rig.kb.storage_mut(), &[A, brk(A)])
        .unwrap();

    let long: Vec<u8> = (0..32).flat_map(|_| [A, brk(A)]).collect();
    record(&mut rig, &long);
    assert_eq!(rig.kb.macro_buffer().len(), 64);

    rig.feed(&[scancode::FN, scancode::PASTE]);
    rig.take_log();
    rig.feed(&[scancode::N3]);
    let mut expected = beep(50).to_vec();
    expected.push(Event::Delay(50));
    expected.extend(beep(50));
    expected.extend([Event::Tx(LED_STATUS), Event::Tx(0x00)]);
    assert_eq!(rig.take_log(), expected);
    assert_eq!(rig.kb.mode(), Mode::Normal);

    let mut buf = MacroBuffer::new();
    MacroSlot::Slot3.load(rig.kb.storage_mut(), &mut buf).unwrap();
    assert_eq!(buf.as_slice(), &[A, brk(A)]);

    // The same recording fits a large slot.
    rig.feed(&[scancode::FN, scancode::PASTE, scancode::N2]);
    MacroSlot::Slot2.load(rig.kb.storage_mut(), &mut buf).unwrap();
    assert_eq!(buf.len(), 64);
}

#[test]
fn macro_save_ignores_other_keys_and_fn_cancels() {
    let mut rig = Rig::booted();
    record(&mut rig, &[A, brk(A)]);
    rig.feed(&[scancode::FN, scancode::PASTE, A, response::IDLE, brk(A)]);
    assert_eq!(rig.kb.mode(), Mode::MacroSave);

    rig.take_log();
    rig.feed(&[scancode::FN]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert_eq!(rig.sent(), [LED_STATUS, 0x00]);

    let mut buf = MacroBuffer::new();
    for slot in MacroSlot::ALL {
        slot.load(rig.kb.storage_mut(), &mut buf).unwrap();
        assert!(buf.is_empty());
    }
}

#[test]
fn full_recording_stops_itself() {
    let mut rig = Rig::booted();
    rig.feed(&[scancode::FN, scancode::COPY, brk(scancode::COPY), brk(scancode::FN)]);
    rig.feed(&[response::IDLE]);
    rig.take_log();

    let mut bytes: Vec<u8> = (0..63).flat_map(|_| [A, brk(A)]).collect();
    bytes.push(A);
    rig.feed(&bytes);

    assert_eq!(rig.kb.macro_buffer().len(), 127);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    let mut expected = vec![Event::Tx(CLICK_OFF), Event::Tx(LED_STATUS), Event::Tx(0x00)];
    expected.extend(beep(150));
    assert_eq!(rig.take_log(), expected);

    // Nothing past the limit is recorded.
    rig.feed(&[brk(A)]);
    assert_eq!(rig.kb.macro_buffer().len(), 127);
}

#[test]
fn again_replays_and_releases_held_keys() {
    let mut rig = Rig::booted();
    record(&mut rig, &[LEFT_CTRL, C]);
    rig.take_reports();

    assert_eq!(
        rig.feed(&[scancode::FN, scancode::AGAIN]),
        [None, Some(ReportKind::Key)]
    );
    assert_eq!(
        rig.take_reports(),
        [key(0x01, &[]), key(0x01, &[0x06]), key(0, &[])]
    );
    assert_eq!(rig.kb.reports().state(), KeyState::Clear);

    rig.feed(&[response::IDLE, scancode::FN, scancode::INSERT]);
    assert_eq!(rig.take_reports().len(), 3);
}

#[test]
fn replayed_rollover_turns_the_click_off() {
    let mut rig = Rig::booted();
    record(&mut rig, &ROW);
    assert_eq!(rig.kb.macro_buffer(), &ROW);
    rig.take_reports();
    rig.take_log();

    rig.feed(&[scancode::FN, scancode::AGAIN]);
    assert_eq!(
        rig.sent(),
        [LED_STATUS, 0x02, LED_STATUS, 0x00, CLICK_ON, CLICK_OFF]
    );
    assert_eq!(rig.kb.reports().state(), KeyState::Clear);
    assert_eq!(rig.take_reports().last(), Some(&key(0, &[])));

    rig.feed(&[response::IDLE]);
    assert!(rig.sent().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Remapping and configuration
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn key_swap_copies_factory_usage() {
    let mut rig = Rig::booted();
    rig.feed(&[scancode::FN]);
    rig.take_log();
    rig.feed(&[scancode::CUT]);
    assert_eq!(rig.kb.mode(), Mode::KeySwapCapture1);
    assert_eq!(rig.take_log(), beep(150));

    // Source is A, target is the E key.
    rig.feed(&[brk(scancode::CUT), brk(scancode::FN), response::IDLE, A]);
    assert_eq!(rig.kb.mode(), Mode::KeySwapCapture2);
    rig.feed(&[brk(A), response::IDLE]);
    rig.take_log();
    rig.feed(&[E]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    let mut expected = vec![Event::Tx(LED_STATUS), Event::Tx(0x00)];
    expected.extend(beep(50));
    assert_eq!(rig.take_log(), expected);

    assert_eq!(rig.kb.keymap().lookup(E), KeyUsage::A);
    assert_eq!(
        rig.kb.storage().image()[KEYMAP_ADDR + usize::from(E)],
        KeyUsage::A.as_byte()
    );
    rig.feed(&[brk(E), response::IDLE]);
    rig.take_reports();
    rig.feed(&[E]);
    assert_eq!(rig.take_reports(), [key(0, &[0x04])]);
}

#[test]
fn key_swap_onto_fn_is_cancelled() {
    let mut rig = Rig::booted();
    rig.feed(&[scancode::FN, scancode::CUT, A, scancode::FN]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert_eq!(*rig.kb.keymap(), KeyMap::new());

    rig.feed(&[scancode::FN, scancode::CUT, scancode::FN]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

#[test]
fn key_swap_skips_the_last_position() {
    let mut rig = Rig::booted();
    rig.feed(&[scancode::FN, scancode::CUT, scancode::LAYOUT_ALIAS]);
    assert_eq!(rig.kb.mode(), Mode::KeySwapCapture1);

    rig.feed(&[A, scancode::LAYOUT_ALIAS]);
    assert_eq!(rig.kb.mode(), Mode::KeySwapCapture2);
    assert_eq!(*rig.kb.keymap(), KeyMap::new());

    rig.feed(&[E]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert_eq!(rig.kb.keymap().lookup(E), KeyUsage::A);
}

#[test]
fn escape_restores_factory_config() {
    let mut rig = Rig::booted();
    record(&mut rig, &[A, brk(A)]);
    rig.feed(&[scancode::FN, scancode::PASTE, scancode::N1, response::IDLE]);
    rig.feed(&[scancode::FN, scancode::CUT, A, E, response::IDLE]);
    assert_eq!(rig.kb.keymap().lookup(E), KeyUsage::A);

    rig.feed(&[scancode::FN]);
    rig.take_log();
    rig.feed(&[scancode::ESCAPE]);
    let mut expected = beep(150).to_vec();
    expected.extend([Event::Tx(LED_STATUS), Event::Tx(0x00)]);
    assert_eq!(rig.take_log(), expected);
    assert_eq!(rig.kb.mode(), Mode::Normal);
    assert_eq!(rig.kb.keymap().lookup(E), KeyUsage::E);
    assert_eq!(rig.kb.storage().image()[MACRO1_ADDR], 0);
}

#[test]
fn version_mismatch_restores_defaults_and_clears_macros() {
    let mut image = ConfigImage::new();
    let mut map = KeyMap::new();
    map.check_and_load(&mut image).unwrap();
    map.remap(&mut image, A, KeyUsage::Z).unwrap();
    for slot in MacroSlot::ALL {
        slot.save(&mut image, &[1, 2, 3, 4, 5]).unwrap();
    }
    image.update_byte(VERSION_ADDR, KEYMAP_VERSION - 1).unwrap();

    let mut rig = Rig::with_image(image);
    rig.kb.init();
    for code in 0..=0x7F {
        assert_eq!(rig.kb.keymap().lookup(code), default_usage(code));
    }
    let mut buf = MacroBuffer::new();
    for slot in MacroSlot::ALL {
        slot.load(rig.kb.storage_mut(), &mut buf).unwrap();
        assert!(buf.is_empty());
    }
}

/// Image that loses power after a number of writes.
struct FailingEeprom {
    image: ConfigImage,
    writes_left: usize,
}

impl Eeprom for FailingEeprom {
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), Error> {
        self.image.read(addr, buf)
    }

    fn update(&mut self, addr: usize, data: &[u8]) -> Result<(), Error> {
        if self.writes_left == 0 {
            return Err(Error::Storage);
        }
        self.writes_left -= 1;
        self.image.update(addr, data)
    }
}

#[test]
fn interrupted_reset_is_redone_on_next_boot() {
    let mut image = ConfigImage::new();
    let mut map = KeyMap::new();
    map.check_and_load(&mut image).unwrap();
    map.remap(&mut image, A, KeyUsage::Z).unwrap();

    // Power is lost after the version byte was invalidated.
    let mut failing = FailingEeprom {
        image,
        writes_left: 1,
    };
    assert_eq!(map.reset_to_default(&mut failing), Err(Error::Storage));

    let mut image = failing.image;
    assert_ne!(image.read_byte(VERSION_ADDR).unwrap(), KEYMAP_VERSION);
    let mut fresh = KeyMap::new();
    assert!(fresh.check_and_load(&mut image).unwrap());
    assert_eq!(fresh.lookup(A), KeyUsage::A);
    assert_eq!(image.read_byte(VERSION_ADDR).unwrap(), KEYMAP_VERSION);
}

// ═══════════════════════════════════════════════════════════════════════════
// Morse and diagnostics
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn morse_plays_factory_letter() {
    let mut rig = Rig::booted();
    rig.feed(&[scancode::FN]);
    rig.take_log();
    rig.feed(&[scancode::HELP]);
    assert_eq!(rig.kb.mode(), Mode::Morse);
    assert_eq!(rig.take_log(), beep(150));

    // 'A' is dit dah.
    rig.feed(&[A]);
    let mut expected = beep(75).to_vec();
    expected.push(Event::Delay(75));
    expected.extend(beep(150));
    expected.extend([Event::Delay(75), Event::Delay(150)]);
    assert_eq!(rig.take_log(), expected);

    // Releases and keys without a code are silent.
    rig.feed(&[brk(A), 0x59, response::IDLE]);
    assert!(rig.take_log().is_empty());
    assert!(rig.take_reports().is_empty());

    rig.feed(&[scancode::FN]);
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

#[test]
fn stop_reports_stack_usage_in_modifier_byte() {
    let mut rig = Rig::booted();
    assert_eq!(
        rig.feed(&[scancode::FN, scancode::STOP]),
        [None, Some(ReportKind::Key)]
    );
    assert_eq!(
        rig.take_reports(),
        [
            key(0x12, &[]),
            key(0x03, &[]),
            key(0x80, &[]),
            key(0xFF, &[]),
            key(0x00, &[])
        ]
    );
    assert_eq!(rig.kb.mode(), Mode::Normal);
}

// ═══════════════════════════════════════════════════════════════════════════
// Protocol
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn boot_protocol_mirrors_the_key_report() {
    let mut rig = Rig::booted();
    rig.kb.set_protocol(Protocol::Boot);
    assert_eq!(rig.kb.get_protocol(), Protocol::Boot);
    rig.feed(&[LEFT_CTRL, C]);

    let report = rig.kb.next_report().unwrap();
    assert_eq!(report.kind, ReportKind::Boot);
    assert_eq!(report.as_bytes(), &[0x01, 0x00, 0, 0, 0, 0, 0, 0]);
    assert_eq!(
        rig.kb.pending_report_bytes(ReportKind::Key),
        &[0x01, 0x00, 0x06, 0, 0, 0, 0, 0]
    );

    rig.kb.set_protocol(Protocol::Report);
    assert!(rig.kb.reports().is_empty());
    assert_eq!(
        rig.kb.pending_report_bytes(ReportKind::Key),
        key(0, &[]).as_slice()
    );
}

#[test]
fn boot_protocol_sends_no_media_or_system_reports() {
    let mut rig = Rig::booted();
    rig.kb.set_protocol(Protocol::Boot);
    assert_eq!(
        rig.feed(&[VOLUME_UP, brk(VOLUME_UP), POWER]),
        [None, None, None]
    );
    rig.kb.resend(ReportKind::Media);
    assert!(rig.take_reports().is_empty());
    assert_ne!(rig.kb.reports().system().mask, 0);

    assert_eq!(rig.feed(&[A]), [Some(ReportKind::Key)]);
    let report = rig.kb.next_report().unwrap();
    assert_eq!(report.kind, ReportKind::Boot);
    assert_eq!(report.as_bytes(), &[0x00, 0x00, 0x04, 0, 0, 0, 0, 0]);
}

#[test]
fn resend_queues_the_current_state() {
    let mut rig = Rig::booted();
    rig.feed(&[A]);
    rig.take_reports();
    rig.kb.resend(ReportKind::Key);
    rig.kb.resend(ReportKind::System);
    assert_eq!(rig.take_reports(), [key(0, &[0x04]), vec![0x03, 0x00]]);
}
