//! `#![no_std]` register-level driver for the MCP2515 stand-alone CAN
//! controller.
//!
//! The driver owns an SPI bus, a chip select pin, a delay provider and a
//! monotonic [`Clock`], and exposes the controller's operations on top of
//! them: initialization, operation modes and sleep, frame transmission and
//! reception, acceptance filters and masks, status and error flags, and the
//! auxiliary `RXnBF`/`TXnRTS` pins.
//!
//! Every wait is a bounded poll, see [`retry::Retry`]. Diagnostics go through
//! the [`log`] facade.
#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod error;
pub mod filter;
pub mod frame;
pub(crate) mod macros;
pub mod pin;
pub mod regs;
pub mod retry;
pub mod stat;
pub mod timing;

#[cfg(test)]
mod mocks;
#[cfg(test)]
mod tests;

use core::fmt::Debug;

use embedded_hal::{
    blocking::{
        can::Can,
        delay::{DelayMs, DelayUs},
        spi::Transfer,
    },
    can::Id,
    digital::v2::OutputPin,
};
use embedded_time::{duration::Milliseconds, Clock};
use log::{debug, trace, warn};

use crate::{
    buffer::{RxBuf, TxBuf, TX_BUFFERS},
    error::{Error, Result},
    filter::{RxFilter, RxMask},
    frame::{CanFrame, IdRegs, TxPayload, MAX_DATA_LEN},
    pin::{Pin, PinConfig, PinMode},
    regs::{
        BfpCtrl, BitModifiable, CanCtrl, CanInte, CanIntf, CanStat, OpMode, RecvBufOpMode, Reg,
        Register, Rxb0Ctrl, Rxb1Ctrl, TxbCtrl,
    },
    retry::{Budget, Interval, Retry},
    stat::{ErrorFlags, Interrupts, Status},
};
pub use crate::timing::{BitTiming, CanSpeed, McpSpeed};

/// SPI instruction set.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Instruction {
    Write = 0x02,
    Read = 0x03,
    Bitmod = 0x05,
    LoadTx0 = 0x40,
    LoadTx1 = 0x42,
    LoadTx2 = 0x44,
    RtsTx0 = 0x81,
    RtsTx1 = 0x82,
    RtsTx2 = 0x84,
    ReadRx0 = 0x90,
    ReadRx1 = 0x94,
    ReadStatus = 0xA0,
    Reset = 0xC0,
}

/// Longest single SPI transaction: instruction, address and the 14 registers
/// of a Tx buffer.
const MAX_TRANSFER: usize = 16;

/// Most registers read or written by one sequential access.
pub const MAX_SEQUENTIAL: usize = MAX_TRANSFER - 2;

/// Header registers of an Rx buffer: `SIDH`, `SIDL`, `EID8`, `EID0` and `DLC`.
const RX_HEADER_LEN: usize = 5;

/// Settings used to initialize the MCP2515.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub struct Settings {
    /// Device operation mode.
    pub mode: OpMode,
    /// Device CAN speed.
    pub can_speed: CanSpeed,
    /// Device oscillator speed. Should match the clock speed of the oscillator
    /// attached to the MCP2515.
    pub mcp_speed: McpSpeed,
    /// Whether to enable the CLKOUT pin.
    pub clkout_en: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: OpMode::Normal,
            can_speed: CanSpeed::Kbps100,
            mcp_speed: McpSpeed::MHz16,
            clkout_en: false,
        }
    }
}

/// MCP2515 driver.
pub struct MCP2515<SPI, CS, D, CLK> {
    /// SPI interface to interact with the MCP2515.
    spi: SPI,
    /// Chip select pin to select the MCP2515.
    cs: CS,
    delay: D,
    /// Time source for the mode change timeout.
    clock: CLK,
    /// Mode restored after sleep and after configuration-only changes.
    mode: OpMode,
    /// Number of Tx buffers, counted down from `B2`, left out of automatic
    /// buffer selection.
    reserved_tx: u8,
}

impl<SPI, CS, D, CLK, SPIE, CSE> MCP2515<SPI, CS, D, CLK>
where
    SPI: Transfer<u8, Error = SPIE>,
    CS: OutputPin<Error = CSE>,
    D: DelayMs<u8> + DelayUs<u8>,
    CLK: Clock,
    SPIE: Debug,
    CSE: Debug,
{
    /// Creates a new MCP2515 driver. Nothing is sent to the chip until
    /// [`MCP2515::init`] or another operation is called.
    ///
    /// # Configuration
    ///
    /// As this driver only takes ownership of the SPI interface, it is up to
    /// the user to create and configure the SPI interface. Namely, the MCP2515
    /// requires the following options:
    ///
    /// * **Data Order**: MSB first.
    /// * **Clock**: At most 10 MHz.
    /// * **Mode**: Mode 0.
    ///
    /// # Parameters
    ///
    /// * `spi` - SPI interface.
    /// * `cs` - Chip-select pin for the MCP2515.
    /// * `delay` - Delay provider used between polls and after reset.
    /// * `clock` - Monotonic clock used to time out mode changes.
    pub fn new(spi: SPI, cs: CS, delay: D, clock: CLK) -> Self {
        Self {
            spi,
            cs,
            delay,
            clock,
            mode: OpMode::Configuration,
            reserved_tx: 0,
        }
    }

    /// Releases the bus, pin, delay and clock.
    pub fn release(self) -> (SPI, CS, D, CLK) {
        (self.spi, self.cs, self.delay, self.clock)
    }

    /// Initializes the MCP2515. This should be called once at the start of
    /// the program.
    ///
    /// Resets the chip, programs the bit timing, clears the Tx and Rx buffer
    /// control registers, enables the Rx interrupts with all filtering on and
    /// rollover from buffer 0 to buffer 1, and finally enters
    /// `settings.mode`.
    pub fn init(&mut self, settings: Settings) -> Result<(), SPIE, CSE> {
        self.cs.set_high().map_err(Error::Hal)?;
        self.reset()?;

        if let Err(e) = self.change_mode(OpMode::Configuration) {
            warn!("Entering configuration mode failed");
            return Err(e);
        }
        debug!("Entered configuration mode");

        self.set_bitrate(settings.can_speed, settings.mcp_speed, settings.clkout_en)?;
        self.set_clken(settings.clkout_en)?;
        self.init_buffers()?;

        self.write_register(CanInte::new().with_rx0ie(true).with_rx1ie(true))?;

        // Filters and masks on for both buffers, messages roll over from
        // buffer 0 into buffer 1.
        self.modify_register(
            Rxb0Ctrl::new()
                .with_rxm(RecvBufOpMode::FilterOn)
                .with_bukt(true),
            Rxb0Ctrl::MASK_RXM | Rxb0Ctrl::MASK_BUKT,
        )?;
        self.modify_register(
            Rxb1Ctrl::new().with_rxm(RecvBufOpMode::FilterOn),
            Rxb1Ctrl::MASK_RXM,
        )?;

        if let Err(e) = self.set_mode(settings.mode) {
            warn!("Entering {:?} mode failed", settings.mode);
            return Err(e);
        }
        debug!("Initialized in {:?} mode", settings.mode);
        Ok(())
    }

    /// Clears the control, identifier, DLC and data registers of every Tx
    /// buffer, and both Rx buffer control registers.
    fn init_buffers(&mut self) -> Result<(), SPIE, CSE> {
        let zeros = [0u8; MAX_SEQUENTIAL];
        for buf in TxBuf::ALL {
            self.write_registers(buf.ctrl(), &zeros)?;
        }
        for buf in RxBuf::ALL {
            self.write_register_addr(buf.base(), 0)?;
        }
        Ok(())
    }

    /// Configures the MCP2515 to operate at a certain CAN bitrate. Only has an
    /// effect in configuration mode.
    ///
    /// # Parameters
    ///
    /// * `can_speed` - CAN speed to operate at.
    /// * `mcp_speed` - Clock speed of the MCP2515.
    /// * `clkout_en` - Whether to enable the `CLKOUT` pin.
    pub fn set_bitrate(
        &mut self,
        can_speed: CanSpeed,
        mcp_speed: McpSpeed,
        clkout_en: bool,
    ) -> Result<(), SPIE, CSE> {
        let timing = match BitTiming::lookup(can_speed, mcp_speed) {
            Some(timing) if clkout_en => timing.with_clkout(),
            Some(timing) => timing,
            None => {
                warn!("No bit timing for {:?} at {:?}", can_speed, mcp_speed);
                return Err(Error::InvalidConfiguration(can_speed, mcp_speed));
            }
        };
        self.write_register(timing.cnf1)?;
        self.write_register(timing.cnf2)?;
        self.write_register(timing.cnf3)?;
        debug!("Bit timing set for {:?} at {:?}", can_speed, mcp_speed);
        Ok(())
    }

    /// Enables/disables the `CLKOUT` pin on the MCP2515.
    fn set_clken(&mut self, clken: bool) -> Result<(), SPIE, CSE> {
        self.modify_register(CanCtrl::new().with_clken(clken), CanCtrl::MASK_CLKEN)
    }

    /// Sets the operation mode of the device, waking it if necessary.
    ///
    /// Any mode other than [`OpMode::Sleep`] also becomes the mode restored by
    /// [`MCP2515::wake`] and after filter, mask and pin changes.
    /// [`OpMode::PowerUp`] can't be requested.
    pub fn set_mode(&mut self, mode: OpMode) -> Result<(), SPIE, CSE> {
        if mode == OpMode::PowerUp {
            return Err(Error::InvalidMode(mode as u8));
        }
        if mode != OpMode::Sleep {
            self.mode = mode;
        }
        self.change_mode(mode)
    }

    /// Mode restored after sleep and configuration changes.
    #[inline]
    pub fn active_mode(&self) -> OpMode {
        self.mode
    }

    /// Reads the current operation mode from `CANSTAT`.
    pub fn get_mode(&mut self) -> Result<OpMode, SPIE, CSE> {
        let canstat: CanStat = self.read_register()?;
        canstat
            .opmod_or_err()
            .map_err(|_| Error::InvalidMode(canstat.into_bytes()[0] >> 5))
    }

    /// Puts the device to sleep. Does nothing if it already sleeps.
    pub fn sleep(&mut self) -> Result<(), SPIE, CSE> {
        if self.get_mode()? == OpMode::Sleep {
            return Ok(());
        }
        self.change_mode(OpMode::Sleep)
    }

    /// Returns the device to the last mode set with [`MCP2515::set_mode`].
    /// Does nothing if it is already in that mode.
    pub fn wake(&mut self) -> Result<(), SPIE, CSE> {
        if self.get_mode()? == self.mode {
            return Ok(());
        }
        self.change_mode(self.mode)
    }

    /// Changes the operation mode without touching the remembered mode,
    /// waking the device first if it sleeps.
    fn change_mode(&mut self, mode: OpMode) -> Result<(), SPIE, CSE> {
        let status: CanStat = self.read_register()?;

        // If the device is currently in sleep mode, we need to wake it
        if status.opmod_or_err() == Ok(OpMode::Sleep) && mode != OpMode::Sleep {
            self.wake_up()?;
        }

        // Clear wake flag and actually set the new mode
        self.modify_register(CanIntf::new().with_wakif(false), CanIntf::MASK_WAKIF)?;
        self.request_mode(mode)
    }

    /// Brings a sleeping device to listen-only mode.
    ///
    /// A sleeping device ignores mode requests until it sees bus activity or
    /// `WAKIF` is raised, so the flag is set by hand with the wake-up
    /// interrupt enabled.
    fn wake_up(&mut self) -> Result<(), SPIE, CSE> {
        let caninte: CanInte = self.read_register()?;
        let int_enabled = caninte.wakie();
        if !int_enabled {
            self.modify_register(CanInte::new().with_wakie(true), CanInte::MASK_WAKIE)?;
        }

        // Actually wake the device
        self.modify_register(CanIntf::new().with_wakif(true), CanIntf::MASK_WAKIF)?;

        if let Err(e) = self.request_mode(OpMode::ListenOnly) {
            warn!("Device did not wake up");
            return Err(e);
        }

        // Disable the interrupt if it was originally disabled
        if !int_enabled {
            self.modify_register(CanInte::new().with_wakie(false), CanInte::MASK_WAKIE)?;
        }
        Ok(())
    }

    /// Writes `REQOP` until `CANSTAT` reports `mode`, for at most
    /// [`Retry::MODE_CHANGE`].
    fn request_mode(&mut self, mode: OpMode) -> Result<(), SPIE, CSE> {
        trace!("Requesting {:?} mode", mode);
        let result = self.poll(Retry::MODE_CHANGE, Error::NewModeTimeout, |mcp| {
            mcp.modify_register(CanCtrl::new().with_reqop(mode), CanCtrl::MASK_REQOP)?;
            let canstat: CanStat = mcp.read_register()?;
            Ok((canstat.opmod_or_err() == Ok(mode)).then_some(()))
        });
        if result.is_err() {
            debug!("Device did not enter {:?} mode", mode);
        }
        result
    }

    /// Runs `f` in configuration mode, restoring the active mode afterwards
    /// even if `f` fails.
    ///
    /// An error from `f` takes precedence over an error restoring the mode.
    fn with_config_mode<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SPIE, CSE>,
    ) -> Result<T, SPIE, CSE> {
        if let Err(e) = self.change_mode(OpMode::Configuration) {
            warn!("Entering configuration mode failed");
            return Err(e);
        }
        let result = f(self);
        let restored = self.change_mode(self.mode);
        if restored.is_err() {
            warn!("Restoring {:?} mode failed", self.mode);
        }
        let value = result?;
        restored?;
        Ok(value)
    }

    /// Polls `attempt` until it yields a value, pausing between attempts.
    /// Fails with `timeout` once the budget of `retry` is spent.
    fn poll<T>(
        &mut self,
        retry: Retry,
        timeout: Error<SPIE, CSE>,
        mut attempt: impl FnMut(&mut Self) -> Result<Option<T>, SPIE, CSE>,
    ) -> Result<T, SPIE, CSE> {
        let deadline = match retry.budget {
            Budget::Millis(ms) => Some(
                self.clock
                    .try_now()?
                    .checked_add(Milliseconds::<u32>::new(ms))
                    .ok_or(Error::Clock)?,
            ),
            Budget::Attempts(_) => None,
        };

        let mut attempts: u16 = 0;
        loop {
            if let Some(value) = attempt(self)? {
                return Ok(value);
            }
            attempts = attempts.saturating_add(1);

            let expired = match &deadline {
                Some(deadline) => self.clock.try_now()? > *deadline,
                None => retry.attempts_exhausted(attempts),
            };
            if expired {
                return Err(timeout);
            }

            match retry.interval {
                Interval::Millis(ms) => self.delay.delay_ms(ms),
                Interval::Micros(us) => self.delay.delay_us(us),
            }
        }
    }

    /// Excludes the last `count` Tx buffers from automatic buffer selection,
    /// so they can be driven through [`MCP2515::send_message_via_buffer`]
    /// only. `count = 1` reserves `B2`, `count = 2` reserves `B1` and `B2`.
    pub fn reserve_tx_buffers(&mut self, count: u8) -> Result<(), SPIE, CSE> {
        if count > TX_BUFFERS {
            return Err(Error::InvalidIndex(count));
        }
        self.reserved_tx = count;
        Ok(())
    }

    /// Number of reserved Tx buffers.
    #[inline]
    pub fn reserved_tx_buffers(&self) -> u8 {
        self.reserved_tx
    }

    /// Sends a CAN frame over the CAN bus via any available Tx buffer, and
    /// waits for the transmission to complete.
    ///
    /// Waits up to [`Retry::TX_BUFFER`] for a free unreserved buffer and up to
    /// [`Retry::TX_COMPLETE`] for `TXREQ` to clear. A [`Error::TxTimeout`]
    /// means the frame is still queued in hardware.
    pub fn send_message(&mut self, frame: CanFrame) -> Result<(), SPIE, CSE> {
        let buf = self.poll(Retry::TX_BUFFER, Error::TxBufferTimeout, |mcp| {
            match mcp.find_free_tx_buf() {
                Ok(buf) => Ok(Some(buf)),
                Err(Error::TxBusy) => Ok(None),
                Err(e) => Err(e),
            }
        });
        let buf = match buf {
            Ok(buf) => buf,
            Err(e) => {
                debug!("No free Tx buffer");
                return Err(e);
            }
        };

        self.load_and_transmit(buf, &frame)?;

        let sent = self.poll(Retry::TX_COMPLETE, Error::TxTimeout, |mcp| {
            Ok((!mcp.read_txb_ctrl(buf)?.txreq()).then_some(()))
        });
        if sent.is_err() {
            debug!("Transmission from {:?} did not complete", buf);
        }
        sent
    }

    /// Queues a CAN frame for transmission without waiting for it to be sent.
    ///
    /// With `Some(buf)` that exact buffer is used, reserved or not, and
    /// [`Error::TxBusy`] is returned if it has a transmission pending. With
    /// `None` the first free unreserved buffer is used.
    ///
    /// # Returns
    ///
    /// The buffer the frame was loaded into. Use [`MCP2515::tx_pending`] to
    /// follow its transmission.
    pub fn send_message_via_buffer(
        &mut self,
        frame: CanFrame,
        buf: Option<TxBuf>,
    ) -> Result<TxBuf, SPIE, CSE> {
        let buf = match buf {
            Some(buf) => {
                if self.read_status()?.tx_pending(buf) {
                    return Err(Error::TxBusy);
                }
                buf
            }
            None => self.find_free_tx_buf()?,
        };
        self.load_and_transmit(buf, &frame)?;
        Ok(buf)
    }

    /// Attempts to find a free Tx buffer among the unreserved ones, using a
    /// single `READ STATUS`. The chip is not modified.
    ///
    /// # Returns
    ///
    /// An available Tx buffer on success, [`Error::TxBusy`] if all unreserved
    /// Tx buffers were busy.
    pub fn find_free_tx_buf(&mut self) -> Result<TxBuf, SPIE, CSE> {
        let status = self.read_status()?;
        let eligible = (TX_BUFFERS - self.reserved_tx) as usize;
        TxBuf::ALL[..eligible]
            .iter()
            .copied()
            .find(|buf| !status.tx_pending(*buf))
            .ok_or(Error::TxBusy)
    }

    /// Whether `buf` still has a transmission pending (`TXREQ` set).
    pub fn tx_pending(&mut self, buf: TxBuf) -> Result<bool, SPIE, CSE> {
        Ok(self.read_txb_ctrl(buf)?.txreq())
    }

    /// Clears the buffer's transmit complete flag, loads the frame and
    /// requests transmission.
    fn load_and_transmit(&mut self, buf: TxBuf, frame: &CanFrame) -> Result<(), SPIE, CSE> {
        self.modify_register_addr(Register::CANINTF, buf.interrupt().bits(), 0)?;

        let payload = TxPayload::from_frame(frame);
        let payload = payload.as_bytes();
        let mut data = [0u8; 1 + 5 + MAX_DATA_LEN];
        data[0] = buf.load_instruction() as u8;
        data[1..=payload.len()].copy_from_slice(payload);
        self.transfer(&mut data[..=payload.len()])?;

        let mut rts = [buf.rts_instruction() as u8];
        self.transfer(&mut rts)?;
        trace!("Requested transmission from {:?}", buf);
        Ok(())
    }

    /// Read the `CTRL` register of a Tx buffer.
    fn read_txb_ctrl(&mut self, buf: TxBuf) -> Result<TxbCtrl, SPIE, CSE> {
        Ok(TxbCtrl::from_bytes([self.read_register_addr(buf.ctrl())?]))
    }

    /// Reads a message from the MCP2515 Rx buffers. Buffer 0 is read first
    /// when both hold a message.
    ///
    /// Returns [`Error::NoMessage`] if neither buffer holds one.
    pub fn read_message(&mut self) -> Result<CanFrame, SPIE, CSE> {
        let status = self.read_rx_tx_status()?;
        match RxBuf::ALL.into_iter().find(|buf| status.contains(buf.interrupt())) {
            Some(buf) => self.read_message_from_buf(buf),
            None => Err(Error::NoMessage),
        }
    }

    /// Reads a message from a specific Rx buffer in one transaction. The
    /// buffer's receive flag is cleared by the chip as chip select rises.
    pub fn read_message_from_buf(&mut self, buf: RxBuf) -> Result<CanFrame, SPIE, CSE> {
        let mut data = [0u8; 1 + RX_HEADER_LEN + MAX_DATA_LEN];
        data[0] = buf.read_instruction() as u8;
        let resp = self.transfer(&mut data)?;

        let (header, body) = resp[1..].split_at(RX_HEADER_LEN);
        let header = [header[0], header[1], header[2], header[3], header[4]];
        let frame = CanFrame::from_registers(header, body).ok_or(Error::InvalidFrameId)?;
        trace!("Read frame from {:?}", buf);
        Ok(frame)
    }

    /// Whether either Rx buffer holds a message.
    pub fn check_receive(&mut self) -> Result<bool, SPIE, CSE> {
        Ok(self.read_status()?.rx_pending())
    }

    /// Rx and Tx interrupt flags, from a single `READ STATUS`.
    pub fn read_rx_tx_status(&mut self) -> Result<Interrupts, SPIE, CSE> {
        Ok(self.read_status()?.interrupts())
    }

    /// All interrupt flags, from `CANINTF`.
    pub fn read_interrupts(&mut self) -> Result<Interrupts, SPIE, CSE> {
        let intf: CanIntf = self.read_register()?;
        Ok(Interrupts::from_bits_truncate(intf.into_bytes()[0]))
    }

    /// Error flags, from `EFLG`.
    pub fn read_error_flags(&mut self) -> Result<ErrorFlags, SPIE, CSE> {
        Ok(ErrorFlags::from_bits_truncate(
            self.read_register_addr(Register::EFLG)?,
        ))
    }

    /// Sets a receive filter. The device is switched to configuration mode
    /// for the write and back to the active mode afterwards.
    ///
    /// # Parameters
    ///
    /// * `filter` - The filter to action on.
    /// * `id` - The actual ID filter to apply to `filter`.
    pub fn set_filter(&mut self, filter: RxFilter, id: Id) -> Result<(), SPIE, CSE> {
        self.with_config_mode(|mcp| mcp.write_id(filter.base(), id))
    }

    /// Sets a receive mask, like [`MCP2515::set_filter`].
    ///
    /// # Parameters
    ///
    /// * `mask` - The mask to action on.
    /// * `id` - The actual ID mask to apply to `mask`.
    pub fn set_mask(&mut self, mask: RxMask, id: Id) -> Result<(), SPIE, CSE> {
        self.with_config_mode(|mcp| mcp.write_id(mask.base(), id))
    }

    /// Reads back a receive filter. Filters can only be read in configuration
    /// mode, so the active mode is left and restored like for
    /// [`MCP2515::set_filter`].
    pub fn read_filter(&mut self, filter: RxFilter) -> Result<Id, SPIE, CSE> {
        self.with_config_mode(|mcp| mcp.read_id(filter.base()))
    }

    /// Reads back a receive mask.
    pub fn read_mask(&mut self, mask: RxMask) -> Result<Id, SPIE, CSE> {
        self.with_config_mode(|mcp| mcp.read_id(mask.base()))
    }

    fn write_id(&mut self, reg: Register, id: Id) -> Result<(), SPIE, CSE> {
        self.write_registers(reg, &IdRegs::from_id(id).into_registers())
    }

    fn read_id(&mut self, reg: Register) -> Result<Id, SPIE, CSE> {
        let mut regs = [0u8; 4];
        self.read_registers(reg, &mut regs)?;
        IdRegs::from_registers(regs)
            .id()
            .ok_or(Error::InvalidFrameId)
    }

    /// Configures an auxiliary pin.
    ///
    /// `RXnBF` pins support [`PinMode::HighImpedance`],
    /// [`PinMode::Interrupt`] and [`PinMode::Output`]. `TXnRTS` pins support
    /// [`PinMode::Interrupt`] and [`PinMode::Input`], and are only writable in
    /// configuration mode, so the active mode is left and restored for them.
    pub fn pin_mode(&mut self, pin: Pin, mode: PinMode) -> Result<(), SPIE, CSE> {
        match pin.config(mode) {
            Some(PinConfig::Buffer { data, mask }) => self.modify_register(data, mask),
            Some(PinConfig::Rts { data, mask }) => {
                self.with_config_mode(|mcp| mcp.modify_register(data, mask))
            }
            None => {
                debug!("{:?} can't be used as {:?}", pin, mode);
                Err(Error::UnsupportedPinMode(pin, mode))
            }
        }
    }

    /// Drives an `RXnBF` pin configured as [`PinMode::Output`].
    pub fn digital_write(&mut self, pin: Pin, high: bool) -> Result<(), SPIE, CSE> {
        let mask = pin
            .output_mask()
            .ok_or(Error::UnsupportedPinMode(pin, PinMode::Output))?;
        let data = if high { mask } else { BfpCtrl::new() };
        self.modify_register(data, mask)
    }

    /// Reads the level of a pin: the output latch of an `RXnBF` pin, or the
    /// input of a `TXnRTS` pin.
    pub fn digital_read(&mut self, pin: Pin) -> Result<bool, SPIE, CSE> {
        let state = self.read_register_addr(pin.state_register())?;
        Ok(pin.level(state))
    }

    /// Queues a frame in the first free unreserved Tx buffer without waiting.
    ///
    /// Returns [`nb::Error::WouldBlock`] while every unreserved buffer is
    /// busy.
    pub fn try_transmit(&mut self, frame: &CanFrame) -> nb::Result<TxBuf, Error<SPIE, CSE>> {
        match self.send_message_via_buffer(*frame, None) {
            Err(Error::TxBusy) => Err(nb::Error::WouldBlock),
            other => other.map_err(nb::Error::Other),
        }
    }

    /// Reads a frame if one is available.
    ///
    /// Returns [`nb::Error::WouldBlock`] while both Rx buffers are empty.
    pub fn try_receive(&mut self) -> nb::Result<CanFrame, Error<SPIE, CSE>> {
        match self.read_message() {
            Err(Error::NoMessage) => Err(nb::Error::WouldBlock),
            other => other.map_err(nb::Error::Other),
        }
    }

    /// Resets the MCP2515. The device enters configuration mode.
    pub fn reset(&mut self) -> Result<(), SPIE, CSE> {
        let mut data = [Instruction::Reset as u8];
        self.transfer(&mut data)?;
        // Sleep for 5ms after reset - if the device is in sleep mode it won't respond
        // immediately
        self.delay.delay_ms(5);
        Ok(())
    }

    /// Reads the status register with the `READ STATUS` instruction.
    pub fn read_status(&mut self) -> Result<Status, SPIE, CSE> {
        let mut data = [Instruction::ReadStatus as u8, 0];
        let resp = self.transfer(&mut data)?;
        Ok(Status::from_bytes([resp[1]]))
    }

    /// Read a register via a register object.
    #[inline]
    pub fn read_register<R: Reg>(&mut self) -> Result<R, SPIE, CSE> {
        Ok(R::read(self.read_register_addr(R::ADDRESS)?))
    }

    /// Reads a single register.
    pub fn read_register_addr(&mut self, reg: Register) -> Result<u8, SPIE, CSE> {
        let mut data = [Instruction::Read as u8, reg as u8, 0];
        let resp = self.transfer(&mut data)?;
        Ok(resp[2])
    }

    /// Reads registers starting from `reg` sequentially, moving on to the next
    /// register until `ret` is full.
    ///
    /// # Parameters
    ///
    /// * `reg` - Register to start reading from.
    /// * `ret` - Return slice to write into. At most [`MAX_SEQUENTIAL`]
    ///   registers, otherwise [`Error::InvalidLength`] is returned and nothing
    ///   is sent.
    pub fn read_registers(&mut self, reg: Register, ret: &mut [u8]) -> Result<(), SPIE, CSE> {
        let n = ret.len();
        if n > MAX_SEQUENTIAL {
            return Err(Error::InvalidLength(n));
        }
        let mut data = [0u8; MAX_TRANSFER];
        data[0] = Instruction::Read as u8;
        data[1] = reg as u8;
        let resp = self.transfer(&mut data[..n + 2])?;
        ret[..n].copy_from_slice(&resp[2..n + 2]);
        Ok(())
    }

    /// Write to a register using a register object.
    #[inline]
    pub fn write_register<R: Reg>(&mut self, reg: R) -> Result<(), SPIE, CSE> {
        self.write_register_addr(R::ADDRESS, reg.write())
    }

    /// Writes a single register.
    pub fn write_register_addr(&mut self, reg: Register, value: u8) -> Result<(), SPIE, CSE> {
        let mut data = [Instruction::Write as u8, reg as u8, value];
        self.transfer(&mut data)?;
        Ok(())
    }

    /// Writes to sequential registers. Writing will start at `reg` and continue
    /// sequentially until `data` is empty. Fails with
    /// [`Error::InvalidLength`] before sending anything if `data` is longer
    /// than [`MAX_SEQUENTIAL`].
    pub fn write_registers(&mut self, reg: Register, data: &[u8]) -> Result<(), SPIE, CSE> {
        let n = data.len();
        if n > MAX_SEQUENTIAL {
            return Err(Error::InvalidLength(n));
        }
        let mut buf = [0u8; MAX_TRANSFER];
        buf[0] = Instruction::Write as u8;
        buf[1] = reg as u8;
        buf[2..n + 2].copy_from_slice(&data[..n]);
        self.transfer(&mut buf[..n + 2])?;
        Ok(())
    }

    /// Modifies a register.
    ///
    /// # Parameters
    ///
    /// * `reg` - New register content.
    /// * `mask` - Mask register. The bits must be 1 in the positions you want
    ///   to modify.
    #[inline]
    pub fn modify_register<R: BitModifiable>(&mut self, reg: R, mask: R) -> Result<(), SPIE, CSE> {
        self.modify_register_addr(R::ADDRESS, mask.write(), reg.write())
    }

    /// Modifies the bits of `reg` selected by `mask` with the `BIT MODIFY`
    /// instruction. Only registers the chip supports bit modification on are
    /// affected.
    pub fn modify_register_addr(
        &mut self,
        reg: Register,
        mask: u8,
        data: u8,
    ) -> Result<(), SPIE, CSE> {
        let mut buf = [
            Instruction::Bitmod as u8, // BIT MODIFY
            reg as u8,                 // Register address
            mask,                      // Modify mask byte
            data,                      // Data byte
        ];
        self.transfer(&mut buf)?;
        Ok(())
    }

    /// Transfers an array of bytes via SPI in one chip select cycle.
    ///
    /// # Returns
    ///
    /// The bytes clocked in from the device, one per byte sent.
    fn transfer<'b>(&mut self, bytes: &'b mut [u8]) -> Result<&'b [u8], SPIE, CSE> {
        let len = bytes.len();
        let resp = self
            .with_cs(move |spi| spi.transfer(bytes))?
            .map_err(Error::Spi)?;
        if resp.len() < len {
            return Err(Error::InvalidResponse);
        }
        Ok(resp)
    }

    /// Calls a function `f` after bringing the chip select pin low, restoring
    /// it to high after the function has finished.
    fn with_cs<T>(&mut self, f: impl FnOnce(&mut SPI) -> T) -> Result<T, SPIE, CSE> {
        self.cs.set_low().map_err(Error::Hal)?;
        let result = f(&mut self.spi);
        self.cs.set_high().map_err(Error::Hal)?;
        Ok(result)
    }
}

impl<SPI, CS, D, CLK, SPIE, CSE> Can for MCP2515<SPI, CS, D, CLK>
where
    SPI: Transfer<u8, Error = SPIE>,
    CS: OutputPin<Error = CSE>,
    D: DelayMs<u8> + DelayUs<u8>,
    CLK: Clock,
    SPIE: Debug,
    CSE: Debug,
{
    type Frame = CanFrame;
    type Error = Error<SPIE, CSE>;

    #[inline]
    fn transmit(&mut self, frame: &Self::Frame) -> Result<(), SPIE, CSE> {
        self.send_message(*frame)
    }

    #[inline]
    fn receive(&mut self) -> Result<Self::Frame, SPIE, CSE> {
        self.read_message()
    }
}
