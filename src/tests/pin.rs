use crate::error::Error;
use crate::pin::{Pin, PinMode};
use crate::regs::{OpMode, Register};
use crate::tests::initialized;
use crate::Settings;

#[test]
fn test_rx_pin_output() {
    let (mut mcp, chip) = initialized(Settings::default());

    mcp.pin_mode(Pin::Rx0Bf, PinMode::Output).unwrap();
    assert_eq!(0x04, chip.state().reg(Register::BFPCTRL));

    mcp.digital_write(Pin::Rx0Bf, true).unwrap();
    assert_eq!(0x14, chip.state().reg(Register::BFPCTRL));
    assert_eq!(Ok(true), mcp.digital_read(Pin::Rx0Bf));

    mcp.digital_write(Pin::Rx0Bf, false).unwrap();
    assert_eq!(0x04, chip.state().reg(Register::BFPCTRL));
    assert_eq!(Ok(false), mcp.digital_read(Pin::Rx0Bf));
}

#[test]
fn test_rx_pin_modes_are_independent() {
    let (mut mcp, chip) = initialized(Settings::default());

    mcp.pin_mode(Pin::Rx1Bf, PinMode::Interrupt).unwrap();
    assert_eq!(0x0A, chip.state().reg(Register::BFPCTRL));

    mcp.pin_mode(Pin::Rx0Bf, PinMode::Output).unwrap();
    mcp.digital_write(Pin::Rx0Bf, true).unwrap();
    assert_eq!(0x1E, chip.state().reg(Register::BFPCTRL));

    // Disabling leaves the mode bit as it was
    mcp.pin_mode(Pin::Rx1Bf, PinMode::HighImpedance).unwrap();
    assert_eq!(0x16, chip.state().reg(Register::BFPCTRL));
}

#[test]
fn test_rx_pin_without_mode_switch() {
    let (mut mcp, chip) = initialized(Settings::default());
    mcp.pin_mode(Pin::Rx0Bf, PinMode::Interrupt).unwrap();

    // A single BIT MODIFY of BFPCTRL
    assert_eq!(vec![vec![0x05, 0x0C, 0x05, 0x05]], chip.state().log);
}

#[test]
fn test_rts_pin_modes() {
    let (mut mcp, chip) = initialized(Settings::default());
    chip.state().set_reg(Register::TXRTSCTRL, 0x07);

    mcp.pin_mode(Pin::Tx1Rts, PinMode::Input).unwrap();
    assert_eq!(0x05, chip.state().reg(Register::TXRTSCTRL));

    mcp.pin_mode(Pin::Tx1Rts, PinMode::Interrupt).unwrap();
    assert_eq!(0x07, chip.state().reg(Register::TXRTSCTRL));

    // Written in configuration mode, back to normal afterwards
    let state = chip.state();
    assert!(state.log.contains(&vec![0x05, 0x0F, 0xE0, 0x80]));
    assert_eq!(0b000, state.opmod());
}

#[test]
fn test_rts_pin_restores_active_mode() {
    let (mut mcp, _chip) = initialized(Settings {
        mode: OpMode::Loopback,
        ..Settings::default()
    });
    mcp.pin_mode(Pin::Tx2Rts, PinMode::Input).unwrap();
    assert_eq!(Ok(OpMode::Loopback), mcp.get_mode());
}

#[test]
fn test_rts_pin_read() {
    let (mut mcp, chip) = initialized(Settings::default());
    chip.state().set_reg(Register::TXRTSCTRL, 0b0010_1000);

    assert_eq!(Ok(true), mcp.digital_read(Pin::Tx0Rts));
    assert_eq!(Ok(false), mcp.digital_read(Pin::Tx1Rts));
    assert_eq!(Ok(true), mcp.digital_read(Pin::Tx2Rts));
}

#[test]
fn test_unsupported_pin_modes() {
    let (mut mcp, chip) = initialized(Settings::default());

    for (pin, mode) in [
        (Pin::Rx0Bf, PinMode::Input),
        (Pin::Rx1Bf, PinMode::Input),
        (Pin::Tx0Rts, PinMode::Output),
        (Pin::Tx2Rts, PinMode::HighImpedance),
    ] {
        assert_eq!(Err(Error::UnsupportedPinMode(pin, mode)), mcp.pin_mode(pin, mode));
    }
    assert_eq!(
        Err(Error::UnsupportedPinMode(Pin::Tx1Rts, PinMode::Output)),
        mcp.digital_write(Pin::Tx1Rts, true)
    );
    assert!(chip.state().log.is_empty());
}

#[test]
fn test_every_pin_has_a_hardware_function() {
    let (mut mcp, _chip) = initialized(Settings::default());
    for pin in Pin::ALL {
        mcp.pin_mode(pin, PinMode::Interrupt).unwrap();
    }
}
