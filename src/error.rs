use core::fmt::Debug;

use embedded_hal::can::{Error as CanError, ErrorKind};

use crate::{
    pin::{Pin, PinMode},
    timing::{CanSpeed, McpSpeed},
};

pub type Result<T, SPIE, CSE> = core::result::Result<T, Error<SPIE, CSE>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum Error<SPIE, CSE> {
    /// MCP2515 did not confirm a mode change within 200 ms.
    NewModeTimeout,
    /// Every unreserved Tx buffer has a transmission pending.
    TxBusy,
    /// No Tx buffer became free within the retry budget.
    TxBufferTimeout,
    /// A frame was queued but `TXREQ` did not clear within the retry budget.
    /// The frame may still be sent.
    TxTimeout,
    /// There was no message to be received in the Rx buffers.
    NoMessage,
    /// Bit timing not available for this combination.
    InvalidConfiguration(CanSpeed, McpSpeed),
    /// Slot index or count out of range.
    InvalidIndex(u8),
    /// More sequential registers than fit in one transaction.
    InvalidLength(usize),
    /// Pin can't be used in this mode.
    UnsupportedPinMode(Pin, PinMode),
    /// Registers held an identifier that is not a valid CAN ID.
    InvalidFrameId,
    /// Operation mode can't be requested, or `CANSTAT` reported an
    /// undefined one.
    InvalidMode(u8),
    /// SPI response shorter than the request.
    InvalidResponse,
    /// Clock failed to report the current time.
    Clock,
    /// SPI error.
    Spi(SPIE),
    /// Chip select pin error.
    Hal(CSE),
}

impl<SPIE, CSE> From<embedded_time::clock::Error> for Error<SPIE, CSE> {
    fn from(_: embedded_time::clock::Error) -> Self {
        Error::Clock
    }
}

impl<SPIE: Debug, CSE: Debug> CanError for Error<SPIE, CSE> {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}
