//! General purpose use of the `RXnBF` and `TXnRTS` pins.

use crate::regs::{BfpCtrl, Register, TxRtsCtrl};

/// Auxiliary pins of the MCP2515.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum Pin {
    /// `RX0BF`, Rx buffer 0 full.
    Rx0Bf,
    /// `RX1BF`, Rx buffer 1 full.
    Rx1Bf,
    /// `TX0RTS`, request-to-send for Tx buffer 0.
    Tx0Rts,
    /// `TX1RTS`, request-to-send for Tx buffer 1.
    Tx1Rts,
    /// `TX2RTS`, request-to-send for Tx buffer 2.
    Tx2Rts,
}

/// Pin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum PinMode {
    /// Pin disabled, high impedance. `RXnBF` only.
    HighImpedance,
    /// Hardware function: buffer-full interrupt for `RXnBF`, request-to-send
    /// for `TXnRTS`.
    Interrupt,
    /// Digital output. `RXnBF` only.
    Output,
    /// Digital input. `TXnRTS` only.
    Input,
}

/// Where and how a pin mode is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PinConfig {
    /// `BFPCTRL` change, no mode switch required.
    Buffer { data: BfpCtrl, mask: BfpCtrl },
    /// `TXRTSCTRL` change, only writable in configuration mode.
    Rts { data: TxRtsCtrl, mask: TxRtsCtrl },
}

impl Pin {
    pub const ALL: [Self; 5] = [
        Self::Rx0Bf,
        Self::Rx1Bf,
        Self::Tx0Rts,
        Self::Tx1Rts,
        Self::Tx2Rts,
    ];

    /// Register change that puts this pin in `mode`, if the pin supports it.
    pub(crate) fn config(self, mode: PinMode) -> Option<PinConfig> {
        match self {
            Pin::Rx0Bf | Pin::Rx1Bf => {
                let (bfm, bfe) = match self {
                    Pin::Rx0Bf => (BfpCtrl::MASK_B0BFM, BfpCtrl::MASK_B0BFE),
                    _ => (BfpCtrl::MASK_B1BFM, BfpCtrl::MASK_B1BFE),
                };
                let (data, mask) = match mode {
                    PinMode::HighImpedance => (BfpCtrl::new(), bfe),
                    PinMode::Interrupt => (bfm | bfe, bfm | bfe),
                    PinMode::Output => (bfe, bfm | bfe),
                    PinMode::Input => return None,
                };
                Some(PinConfig::Buffer { data, mask })
            }
            Pin::Tx0Rts | Pin::Tx1Rts | Pin::Tx2Rts => {
                let rtsm = match self {
                    Pin::Tx0Rts => TxRtsCtrl::MASK_B0RTSM,
                    Pin::Tx1Rts => TxRtsCtrl::MASK_B1RTSM,
                    _ => TxRtsCtrl::MASK_B2RTSM,
                };
                let data = match mode {
                    PinMode::Interrupt => rtsm,
                    PinMode::Input => TxRtsCtrl::new(),
                    PinMode::HighImpedance | PinMode::Output => return None,
                };
                Some(PinConfig::Rts { data, mask: rtsm })
            }
        }
    }

    /// `BnBFS` output latch bit, for pins that can be driven.
    pub(crate) fn output_mask(self) -> Option<BfpCtrl> {
        match self {
            Pin::Rx0Bf => Some(BfpCtrl::MASK_B0BFS),
            Pin::Rx1Bf => Some(BfpCtrl::MASK_B1BFS),
            _ => None,
        }
    }

    /// Register reporting the level of this pin.
    pub(crate) fn state_register(self) -> Register {
        match self {
            Pin::Rx0Bf | Pin::Rx1Bf => Register::BFPCTRL,
            Pin::Tx0Rts | Pin::Tx1Rts | Pin::Tx2Rts => Register::TXRTSCTRL,
        }
    }

    /// Level of this pin, given the content of [`Pin::state_register`].
    pub(crate) fn level(self, state: u8) -> bool {
        match self {
            Pin::Rx0Bf => BfpCtrl::from_bytes([state]).b0bfs(),
            Pin::Rx1Bf => BfpCtrl::from_bytes([state]).b1bfs(),
            Pin::Tx0Rts => TxRtsCtrl::from_bytes([state]).b0rts(),
            Pin::Tx1Rts => TxRtsCtrl::from_bytes([state]).b1rts(),
            Pin::Tx2Rts => TxRtsCtrl::from_bytes([state]).b2rts(),
        }
    }
}
