use std::cell::{Cell, RefCell, RefMut};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::clock::Error;
use embedded_time::duration::Duration;
use embedded_time::fixed_point::FixedPoint;
use embedded_time::fraction::Fraction;
use embedded_time::timer::param::{Armed, OneShot};
use embedded_time::{Clock, Instant, Timer};
use mockall::mock;
use void::Void;

use crate::regs::Register;

/// Microsecond clock that advances by `step` every time it is read.
#[derive(Debug)]
pub struct TestClock {
    now: Cell<u64>,
    step: u64,
}

impl TestClock {
    pub fn new(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }
}

impl Default for TestClock {
    /// One millisecond per read.
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl Clock for TestClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        let now = self.now.get();
        self.now.set(now + self.step);
        Ok(Instant::new(now))
    }

    fn new_timer<Dur>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: Duration + FixedPoint,
    {
        Timer::new(self, duration)
    }
}

/// Clock whose reads always fail.
#[derive(Debug, Default)]
pub struct BrokenClock;

impl Clock for BrokenClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, Error> {
        Err(Error::Unspecified)
    }

    fn new_timer<Dur>(&self, duration: Dur) -> Timer<OneShot, Armed, Self, Dur>
    where
        Dur: Duration + FixedPoint,
    {
        Timer::new(self, duration)
    }
}

/// Delay that returns immediately and counts how often it was called.
#[derive(Debug, Default)]
pub struct NoopDelay {
    pub ms_calls: usize,
    pub us_calls: usize,
}

impl DelayMs<u8> for NoopDelay {
    fn delay_ms(&mut self, _ms: u8) {
        self.ms_calls += 1;
    }
}

impl DelayUs<u8> for NoopDelay {
    fn delay_us(&mut self, _us: u8) {
        self.us_calls += 1;
    }
}

/// Chip select pin that can't fail.
#[derive(Debug, Default)]
pub struct NoopPin;

impl OutputPin for NoopPin {
    type Error = Void;

    fn set_low(&mut self) -> Result<(), Void> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Void> {
        Ok(())
    }
}

mock! {
    pub SPIBus {}

    impl Transfer<u8> for SPIBus {
        type Error = u32;

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'static [u8], u32>;
    }
}

mock! {
    pub Pin {}

    impl OutputPin for Pin {
        type Error = u32;

        fn set_low(&mut self) -> Result<(), u32>;
        fn set_high(&mut self) -> Result<(), u32>;
    }
}

const REQOP_SHIFT: u8 = 5;
const OPMOD_MASK: u8 = 0b1110_0000;
const MODE_SLEEP: u8 = 0b001;
const MODE_CONFIG: u8 = 0b100;
const WAKIF: u8 = 0b0100_0000;
const TXREQ: u8 = 0b0000_1000;

/// Register file and behaviour of a simulated MCP2515.
#[derive(Debug)]
pub struct ChipState {
    pub regs: [u8; 128],
    /// Every transaction, as sent.
    pub log: Vec<Vec<u8>>,
    /// `CANSTAT` ignores mode requests.
    pub stuck: bool,
    /// Transmissions finish as soon as they are requested.
    pub complete_tx: bool,
    /// Transaction number that fails with an SPI error.
    pub fail_at: Option<usize>,
}

impl Default for ChipState {
    fn default() -> Self {
        let mut state = Self {
            regs: [0; 128],
            log: Vec::new(),
            stuck: false,
            complete_tx: true,
            fail_at: None,
        };
        state.reset();
        state
    }
}

impl ChipState {
    fn reset(&mut self) {
        self.regs = [0; 128];
        self.regs[Register::CANCTRL as usize] = 0x87;
        self.regs[Register::CANSTAT as usize] = MODE_CONFIG << REQOP_SHIFT;
    }

    pub fn reg(&self, reg: Register) -> u8 {
        self.regs[reg as usize]
    }

    pub fn set_reg(&mut self, reg: Register, value: u8) {
        self.regs[reg as usize] = value;
    }

    /// Current `OPMOD` bits.
    pub fn opmod(&self) -> u8 {
        self.reg(Register::CANSTAT) >> REQOP_SHIFT
    }

    /// Places a received frame in Rx buffer `index` and raises its flag.
    pub fn receive(&mut self, index: usize, registers: &[u8]) {
        let base = Register::RXB0SIDH as usize + 0x10 * index;
        self.regs[base..base + registers.len()].copy_from_slice(registers);
        self.regs[Register::CANINTF as usize] |= 1 << index;
    }

    /// Transactions starting with `instruction`.
    pub fn sent(&self, instruction: u8) -> Vec<&Vec<u8>> {
        self.log.iter().filter(|t| t.first() == Some(&instruction)).collect()
    }

    /// Register writes (`WRITE` instruction) to `reg`, in order.
    pub fn writes_to(&self, reg: Register) -> Vec<u8> {
        self.log
            .iter()
            .filter(|t| t.len() == 3 && t[0] == 0x02 && t[1] == reg as u8)
            .map(|t| t[2])
            .collect()
    }

    fn status(&self) -> u8 {
        let intf = self.reg(Register::CANINTF);
        let req = |reg: Register| self.reg(reg) & TXREQ != 0;
        (intf & 0b11)
            | ((req(Register::TXB0CTRL) as u8) << 2)
            | ((intf & 0b0000_0100) << 1)
            | ((req(Register::TXB1CTRL) as u8) << 4)
            | ((intf & 0b0000_1000) << 2)
            | ((req(Register::TXB2CTRL) as u8) << 6)
            | ((intf & 0b0001_0000) << 3)
    }

    fn update_mode(&mut self) {
        if self.stuck {
            return;
        }
        // A sleeping chip only reacts once woken.
        if self.opmod() == MODE_SLEEP && self.reg(Register::CANINTF) & WAKIF == 0 {
            return;
        }
        let reqop = self.reg(Register::CANCTRL) >> REQOP_SHIFT;
        let canstat = self.reg(Register::CANSTAT) & !OPMOD_MASK;
        self.set_reg(Register::CANSTAT, canstat | (reqop << REQOP_SHIFT));
    }

    fn request_to_send(&mut self, index: usize) {
        let ctrl = Register::TXB0CTRL as usize + 0x10 * index;
        if self.complete_tx {
            self.regs[ctrl] &= !TXREQ;
            self.regs[Register::CANINTF as usize] |= 0b0000_0100 << index;
        } else {
            self.regs[ctrl] |= TXREQ;
        }
    }

    fn execute(&mut self, words: &mut [u8]) {
        let start = words.get(1).copied().unwrap_or(0) as usize & 0x7F;
        match words[0] {
            0xC0 => self.reset(),
            0x03 => {
                for (i, w) in words[2..].iter_mut().enumerate() {
                    *w = self.regs[(start + i) & 0x7F];
                }
            }
            0x02 => {
                for (i, w) in words[2..].iter().enumerate() {
                    self.regs[(start + i) & 0x7F] = *w;
                }
                self.update_mode();
            }
            0x05 => {
                let (mask, data) = (words[2], words[3]);
                self.regs[start] = (self.regs[start] & !mask) | (data & mask);
                self.update_mode();
            }
            0xA0 => words[1] = self.status(),
            0x40 | 0x42 | 0x44 => {
                let index = ((words[0] - 0x40) / 2) as usize;
                let sidh = Register::TXB0SIDH as usize + 0x10 * index;
                for (i, w) in words[1..].iter().enumerate() {
                    self.regs[sidh + i] = *w;
                }
            }
            0x81 => self.request_to_send(0),
            0x82 => self.request_to_send(1),
            0x84 => self.request_to_send(2),
            0x90 | 0x94 => {
                let index = ((words[0] - 0x90) / 4) as usize;
                let sidh = Register::RXB0SIDH as usize + 0x10 * index;
                for (i, w) in words[1..].iter_mut().enumerate() {
                    *w = self.regs[sidh + i];
                }
                self.regs[Register::CANINTF as usize] &= !(1 << index);
            }
            _ => {}
        }
    }
}

/// SPI bus with a simulated MCP2515 behind it. Clones share the same chip.
#[derive(Debug, Clone, Default)]
pub struct SimChip(Rc<RefCell<ChipState>>);

impl SimChip {
    pub fn state(&self) -> RefMut<'_, ChipState> {
        self.0.borrow_mut()
    }
}

impl Transfer<u8> for SimChip {
    type Error = u32;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], u32> {
        let mut state = self.state();
        let index = state.log.len();
        state.log.push(words.to_vec());
        if state.fail_at == Some(index) {
            return Err(7);
        }
        state.execute(words);
        Ok(words)
    }
}
