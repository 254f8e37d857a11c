use bitflags::bitflags;
use modular_bitfield::prelude::*;

use crate::buffer::TxBuf;

/// Response of the `READ STATUS` instruction.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    #[skip(setters)]
    pub rx0if: bool,
    #[skip(setters)]
    pub rx1if: bool,
    #[skip(setters)]
    pub tx0req: bool,
    #[skip(setters)]
    pub tx0if: bool,
    #[skip(setters)]
    pub tx1req: bool,
    #[skip(setters)]
    pub tx1if: bool,
    #[skip(setters)]
    pub tx2req: bool,
    #[skip(setters)]
    pub tx2if: bool,
}

impl Status {
    /// Whether `buf` has a transmission pending.
    #[inline]
    pub fn tx_pending(&self, buf: TxBuf) -> bool {
        match buf {
            TxBuf::B0 => self.tx0req(),
            TxBuf::B1 => self.tx1req(),
            TxBuf::B2 => self.tx2req(),
        }
    }

    /// Whether either Rx buffer holds a message.
    #[inline]
    pub fn rx_pending(&self) -> bool {
        self.rx0if() || self.rx1if()
    }

    /// Maps the status onto `CANINTF` bit positions. Rx flags already share
    /// positions, Tx complete flags are moved, `TXnREQ` bits are dropped.
    pub fn interrupts(&self) -> Interrupts {
        let mut ints = Interrupts::empty();
        ints.set(Interrupts::RX0IF, self.rx0if());
        ints.set(Interrupts::RX1IF, self.rx1if());
        ints.set(Interrupts::TX0IF, self.tx0if());
        ints.set(Interrupts::TX1IF, self.tx1if());
        ints.set(Interrupts::TX2IF, self.tx2if());
        ints
    }
}

bitflags! {
    /// Interrupt flags, laid out as in `CANINTF`.
    ///
    /// Both the `READ STATUS` fast path and a full `CANINTF` read produce this
    /// type, so Tx and Rx polling share one representation.
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Interrupts: u8 {
        const RX0IF = 0b0000_0001;
        const RX1IF = 0b0000_0010;
        const TX0IF = 0b0000_0100;
        const TX1IF = 0b0000_1000;
        const TX2IF = 0b0001_0000;
        const ERRIF = 0b0010_0000;
        const WAKIF = 0b0100_0000;
        const MERRF = 0b1000_0000;
    }
}

bitflags! {
    /// Error flags (`EFLG`).
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct ErrorFlags: u8 {
        /// Error warning (`TEC` or `REC` >= 96).
        const EWARN = 0b0000_0001;
        /// Receive error warning (`REC` >= 96).
        const RXWAR = 0b0000_0010;
        /// Transmit error warning (`TEC` >= 96).
        const TXWAR = 0b0000_0100;
        /// Receive error-passive (`REC` >= 128).
        const RXEP = 0b0000_1000;
        /// Transmit error-passive (`TEC` >= 128).
        const TXEP = 0b0001_0000;
        /// Bus-off (`TEC` reached 255).
        const TXBO = 0b0010_0000;
        /// Rx buffer 0 overflow.
        const RX0OVR = 0b0100_0000;
        /// Rx buffer 1 overflow.
        const RX1OVR = 0b1000_0000;
    }
}

impl ErrorFlags {
    /// Flags that indicate an actual error rather than a warning.
    pub const ERROR_MASK: Self = Self::from_bits_truncate(0b1111_1000);
}
