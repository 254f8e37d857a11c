//! Bit timing (`CNF1`, `CNF2`, `CNF3`) for the supported oscillator and bus
//! speed combinations.

use crate::regs::{Cnf1, Cnf2, Cnf3};

/// Speed the CAN bus is operating at.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum CanSpeed {
    Kbps5,
    Kbps10,
    Kbps20,
    Kbps25,
    Kbps31_25,
    Kbps33_3,
    Kbps40,
    Kbps50,
    Kbps80,
    Kbps83_3,
    Kbps95,
    Kbps100,
    Kbps125,
    Kbps200,
    Kbps250,
    Kbps500,
    Kbps666,
    Kbps1000,
}

impl CanSpeed {
    pub const ALL: [Self; 18] = [
        Self::Kbps5,
        Self::Kbps10,
        Self::Kbps20,
        Self::Kbps25,
        Self::Kbps31_25,
        Self::Kbps33_3,
        Self::Kbps40,
        Self::Kbps50,
        Self::Kbps80,
        Self::Kbps83_3,
        Self::Kbps95,
        Self::Kbps100,
        Self::Kbps125,
        Self::Kbps200,
        Self::Kbps250,
        Self::Kbps500,
        Self::Kbps666,
        Self::Kbps1000,
    ];
}

/// Speed the MCP2515 is operating at. Should match the crystal frequency
/// onboard.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
pub enum McpSpeed {
    MHz8,
    MHz16,
}

/// Content of the three bit timing registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTiming {
    pub cnf1: Cnf1,
    pub cnf2: Cnf2,
    pub cnf3: Cnf3,
}

impl BitTiming {
    const fn raw(cnf1: u8, cnf2: u8, cnf3: u8) -> Self {
        Self {
            cnf1: Cnf1::from_bytes([cnf1]),
            cnf2: Cnf2::from_bytes([cnf2]),
            cnf3: Cnf3::from_bytes([cnf3]),
        }
    }

    /// Looks up the register values for `can_speed` with a `mcp_speed`
    /// oscillator. Combinations missing from the table are not supported;
    /// nothing is approximated.
    pub const fn lookup(can_speed: CanSpeed, mcp_speed: McpSpeed) -> Option<Self> {
        use CanSpeed::*;
        use McpSpeed::*;

        let (cnf1, cnf2, cnf3) = match (mcp_speed, can_speed) {
            (MHz8, Kbps5) => (0x1F, 0xBF, 0x07),
            (MHz8, Kbps10) => (0x0F, 0xBF, 0x07),
            (MHz8, Kbps20) => (0x07, 0xBF, 0x07),
            (MHz8, Kbps31_25) => (0x07, 0xA4, 0x04),
            (MHz8, Kbps40) => (0x03, 0xBF, 0x07),
            (MHz8, Kbps50) => (0x03, 0xB4, 0x06),
            (MHz8, Kbps80) => (0x01, 0xBF, 0x07),
            (MHz8, Kbps100) => (0x01, 0xB4, 0x06),
            (MHz8, Kbps125) => (0x01, 0xB1, 0x05),
            (MHz8, Kbps200) => (0x00, 0xB4, 0x06),
            (MHz8, Kbps250) => (0x00, 0xB1, 0x05),
            (MHz8, Kbps500) => (0x00, 0x90, 0x02),
            (MHz8, Kbps1000) => (0x00, 0x80, 0x00),
            (MHz16, Kbps5) => (0x3F, 0xFF, 0x87),
            (MHz16, Kbps10) => (0x1F, 0xFF, 0x87),
            (MHz16, Kbps20) => (0x0F, 0xFF, 0x87),
            (MHz16, Kbps25) => (0x0F, 0xBA, 0x07),
            (MHz16, Kbps31_25) => (0x0F, 0xF1, 0x85),
            (MHz16, Kbps33_3) => (0x09, 0xBE, 0x07),
            (MHz16, Kbps40) => (0x07, 0xFF, 0x87),
            (MHz16, Kbps50) => (0x07, 0xFA, 0x87),
            (MHz16, Kbps80) => (0x03, 0xFF, 0x87),
            (MHz16, Kbps83_3) => (0x03, 0xBE, 0x07),
            (MHz16, Kbps95) => (0x03, 0xAD, 0x07),
            (MHz16, Kbps100) => (0x03, 0xFA, 0x87),
            (MHz16, Kbps125) => (0x03, 0xF0, 0x86),
            (MHz16, Kbps200) => (0x01, 0xFA, 0x87),
            (MHz16, Kbps250) => (0x41, 0xF1, 0x85),
            (MHz16, Kbps500) => (0x00, 0xF0, 0x86),
            (MHz16, Kbps666) => (0x00, 0xA0, 0x04),
            (MHz16, Kbps1000) => (0x00, 0xD0, 0x82),
            _ => return None,
        };
        Some(Self::raw(cnf1, cnf2, cnf3))
    }

    /// Clears `SOF` so the `CLKOUT` pin outputs the clock instead of a start
    /// of frame signal.
    pub fn with_clkout(self) -> Self {
        Self {
            cnf3: self.cnf3.with_sof(false),
            ..self
        }
    }
}
