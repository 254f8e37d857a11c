//! Acceptance filters and masks.
//!
//! Each filter and mask occupies 4 registers (`SIDH`, `SIDL`, `EID8` and
//! `EID0`) with the same layout as a buffer identifier, see
//! [`crate::frame::IdRegs`]. They can only be written in configuration mode.

use crate::regs::Register;

crate::slot_def! {
    /// Receive filters.
    RxFilter => {
        /// RXF0
        F0 => Register::RXF0SIDH,
        /// RXF1
        F1 => Register::RXF1SIDH,
        /// RXF2
        F2 => Register::RXF2SIDH,
        /// RXF3
        F3 => Register::RXF3SIDH,
        /// RXF4
        F4 => Register::RXF4SIDH,
        /// RXF5
        F5 => Register::RXF5SIDH
    }
}

crate::slot_def! {
    /// Receive masks.
    RxMask => {
        /// Mask 0, applies to Rx buffer 0.
        Mask0 => Register::RXM0SIDH,
        /// Mask 1, applies to Rx buffer 1.
        Mask1 => Register::RXM1SIDH
    }
}
