use crate::{regs::Register, stat::Interrupts, Instruction};

/// Number of hardware Tx buffers.
pub const TX_BUFFERS: u8 = 3;

crate::slot_def! {
    /// Transmit buffer.
    TxBuf => {
        /// Tx buffer 0.
        B0 => Register::TXB0CTRL,
        /// Tx buffer 1.
        B1 => Register::TXB1CTRL,
        /// Tx buffer 2.
        B2 => Register::TXB2CTRL
    }
}

impl TxBuf {
    /// Returns the `CTRL` register for the selected Tx buffer.
    pub const fn ctrl(self) -> Register {
        self.base()
    }

    /// `LOAD TX BUFFER` instruction starting at `SIDH`.
    pub(crate) const fn load_instruction(self) -> Instruction {
        match self {
            TxBuf::B0 => Instruction::LoadTx0,
            TxBuf::B1 => Instruction::LoadTx1,
            TxBuf::B2 => Instruction::LoadTx2,
        }
    }

    /// `RTS` instruction for this buffer only.
    pub(crate) const fn rts_instruction(self) -> Instruction {
        match self {
            TxBuf::B0 => Instruction::RtsTx0,
            TxBuf::B1 => Instruction::RtsTx1,
            TxBuf::B2 => Instruction::RtsTx2,
        }
    }

    /// Transmit complete flag of this buffer in `CANINTF`.
    pub const fn interrupt(self) -> Interrupts {
        match self {
            TxBuf::B0 => Interrupts::TX0IF,
            TxBuf::B1 => Interrupts::TX1IF,
            TxBuf::B2 => Interrupts::TX2IF,
        }
    }
}

crate::slot_def! {
    /// Receive buffer.
    RxBuf => {
        /// Rx buffer 0. Higher priority.
        B0 => Register::RXB0CTRL,
        /// Rx buffer 1.
        B1 => Register::RXB1CTRL
    }
}

impl RxBuf {
    /// `READ RX BUFFER` instruction starting at `SIDH`. Reading through it
    /// clears the buffer's `RXnIF` flag once chip select is released.
    pub(crate) const fn read_instruction(self) -> Instruction {
        match self {
            RxBuf::B0 => Instruction::ReadRx0,
            RxBuf::B1 => Instruction::ReadRx1,
        }
    }

    /// Receive flag of this buffer in `CANINTF`.
    pub const fn interrupt(self) -> Interrupts {
        match self {
            RxBuf::B0 => Interrupts::RX0IF,
            RxBuf::B1 => Interrupts::RX1IF,
        }
    }
}
