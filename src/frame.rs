//! CAN frames and the MCP2515 identifier/DLC register layout.

use embedded_hal::can::{ExtendedId, Frame, Id, StandardId};
use modular_bitfield::prelude::*;

/// Maximum number of data bytes in a CAN frame.
pub const MAX_DATA_LEN: usize = 8;

/// Remote transmission request bit in `TXBnDLC`/`RXBnDLC`.
pub(crate) const DLC_RTR: u8 = 0x40;
/// Data length bits in `TXBnDLC`/`RXBnDLC`.
pub(crate) const DLC_LEN: u8 = 0x0F;

/// CAN frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// ID of CAN frame.
    pub(crate) id: Id,
    /// Whether the frame is an RTR frame.
    pub(crate) rtr: bool,
    /// Length of data in CAN frame.
    pub(crate) dlc: u8,
    /// Data, maximum 8 bytes.
    pub(crate) data: [u8; MAX_DATA_LEN],
}

impl CanFrame {
    /// Decodes a frame from the 5 header registers (`SIDH`, `SIDL`, `EID8`,
    /// `EID0`, `DLC`) followed by the data registers of an Rx buffer.
    ///
    /// Only the first `DLC` data bytes are kept. A DLC above 8 is treated
    /// as 8.
    pub fn from_registers(header: [u8; 5], data: &[u8]) -> Option<Self> {
        let id = IdRegs::from_registers([header[0], header[1], header[2], header[3]]).id()?;
        let rtr = header[4] & DLC_RTR != 0;
        let dlc = (header[4] & DLC_LEN).min(MAX_DATA_LEN as u8);

        let mut frame = CanFrame {
            id,
            rtr,
            dlc,
            data: [0; MAX_DATA_LEN],
        };
        if !rtr {
            let len = (dlc as usize).min(data.len());
            frame.data[..len].copy_from_slice(&data[..len]);
        }
        Some(frame)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CanFrame {
    fn format(&self, fmt: defmt::Formatter) {
        // [`Id`] does not implement `defmt::Format`
        #[derive(defmt::Format)]
        enum InnerId {
            Standard(u16),
            Extended(u32),
        }

        defmt::write!(
            fmt,
            "CanFrame {{ id: {:#X}, rtr: {}, dlc: {:#X}, data: {:#X} }}",
            match self.id {
                Id::Standard(id) => InnerId::Standard(id.as_raw()),
                Id::Extended(id) => InnerId::Extended(id.as_raw()),
            },
            self.rtr,
            self.dlc,
            self.data()
        );
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_DATA_LEN {
            return None;
        }
        let mut frame = CanFrame {
            id: id.into(),
            rtr: false,
            dlc: data.len() as u8, // Already asserted data.len() <= 8
            data: [0; MAX_DATA_LEN],
        };
        frame.data[..data.len()].copy_from_slice(data);
        Some(frame)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_DATA_LEN {
            return None;
        }
        Some(CanFrame {
            id: id.into(),
            rtr: true,
            dlc: dlc as u8, // Already asserted dlc <= 8
            data: [0; MAX_DATA_LEN],
        })
    }

    #[inline]
    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    #[inline]
    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    #[inline]
    fn id(&self) -> Id {
        self.id
    }

    #[inline]
    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    /// Remote frames carry no data, so this is empty for them regardless of
    /// the DLC.
    #[inline]
    fn data(&self) -> &[u8] {
        if self.rtr {
            &[]
        } else {
            &self.data[..self.dlc()]
        }
    }
}

/// Identifier registers (`SIDH`, `SIDL`, `EID8`, `EID0`).
///
/// Shared by the Tx/Rx buffers, the acceptance filters and the masks. The
/// bitfield is little-endian, so its bytes are `[EID0, EID8, SIDL, SIDH]`;
/// use [`IdRegs::into_registers`] and [`IdRegs::from_registers`] for
/// register order.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRegs {
    /// Extended identifier.
    pub eid: B18,
    #[skip]
    __: B1,
    /// Extended identifier enable.
    pub exide: bool,
    #[skip]
    __: B1,
    /// Standard identifier.
    pub sid: B11,
}

impl IdRegs {
    /// Builds the identifier registers for a CAN bus ID.
    pub fn from_id(id: Id) -> Self {
        // In standard mode: `exide == false` and `eid` is zero. The ID goes
        // into `sid`.
        // In extended mode: `exide == true` and the lower 18 bits of the ID go
        // into `eid`. The rest (upper 11 bits) go into `sid`.
        match id {
            Id::Standard(id) => IdRegs::new()
                .with_exide(false)
                .with_eid(0)
                .with_sid(id.as_raw()),
            Id::Extended(id) => IdRegs::new()
                .with_exide(true)
                .with_eid(id.as_raw() & 0x3FFFF)
                .with_sid((id.as_raw() >> 18) as u16),
        }
    }

    /// The CAN bus ID held by these registers. `EID8`/`EID0` are ignored
    /// unless `EXIDE` is set.
    pub fn id(&self) -> Option<Id> {
        if self.exide() {
            let raw = ((self.sid() as u32) << 18) | self.eid();
            ExtendedId::new(raw).map(Id::Extended)
        } else {
            StandardId::new(self.sid()).map(Id::Standard)
        }
    }

    /// Register content in `[SIDH, SIDL, EID8, EID0]` order.
    pub fn into_registers(self) -> [u8; 4] {
        let [eid0, eid8, sidl, sidh] = self.into_bytes();
        [sidh, sidl, eid8, eid0]
    }

    /// Reads the registers from `[SIDH, SIDL, EID8, EID0]` order.
    pub fn from_registers([sidh, sidl, eid8, eid0]: [u8; 4]) -> Self {
        Self::from_bytes([eid0, eid8, sidl, sidh])
    }
}

/// Builds a `TXBnDLC` byte. `len` is clamped to 8.
pub fn dlc_byte(len: usize, rtr: bool) -> u8 {
    let len = len.min(MAX_DATA_LEN) as u8;
    if rtr {
        len | DLC_RTR
    } else {
        len
    }
}

/// Tx buffer load sequence: `[SIDH, SIDL, EID8, EID0, DLC, data...]`.
///
/// Only the first DLC data bytes are included, never anything past them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxPayload {
    bytes: [u8; 5 + MAX_DATA_LEN],
    len: usize,
}

impl TxPayload {
    pub fn from_frame(frame: &CanFrame) -> Self {
        let mut bytes = [0u8; 5 + MAX_DATA_LEN];
        bytes[..4].copy_from_slice(&IdRegs::from_id(frame.id).into_registers());
        bytes[4] = dlc_byte(frame.dlc(), frame.rtr);

        let data = frame.data();
        bytes[5..5 + data.len()].copy_from_slice(data);
        Self {
            bytes,
            len: 5 + data.len(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}
