use embedded_hal::can::{ExtendedId, Frame, Id, StandardId};

use crate::frame::{dlc_byte, CanFrame, IdRegs, TxPayload};

fn standard(raw: u16) -> Id {
    Id::Standard(StandardId::new(raw).unwrap())
}

fn extended(raw: u32) -> Id {
    Id::Extended(ExtendedId::new(raw).unwrap())
}

#[test]
fn test_standard_id_registers() {
    assert_eq!([0x24, 0x60, 0x00, 0x00], IdRegs::from_id(standard(0x123)).into_registers());
    assert_eq!([0xFF, 0xE0, 0x00, 0x00], IdRegs::from_id(standard(0x7FF)).into_registers());
}

#[test]
fn test_extended_id_registers() {
    assert_eq!([0x91, 0xA8, 0x56, 0x78], IdRegs::from_id(extended(0x1234_5678)).into_registers());
    assert_eq!([0xFF, 0xEB, 0xFF, 0xFF], IdRegs::from_id(extended(0x1FFF_FFFF)).into_registers());
}

#[test]
fn test_id_round_trip() {
    for id in [
        standard(0),
        standard(0x123),
        standard(0x7FF),
        extended(0),
        extended(0x3FFFF),
        extended(0x40000),
        extended(0x1234_5678),
        extended(0x1FFF_FFFF),
    ] {
        let regs = IdRegs::from_id(id).into_registers();
        assert_eq!(Some(id), IdRegs::from_registers(regs).id());
    }
}

#[test]
fn test_every_standard_id_round_trips() {
    for raw in 0..=StandardId::MAX.as_raw() {
        let id = standard(raw);
        assert_eq!(Some(id), IdRegs::from_registers(IdRegs::from_id(id).into_registers()).id());
    }
}

#[test]
fn test_extended_ids_round_trip() {
    // Every bit of the identifier on its own, plus a spread of values
    let singles = (0..29).map(|bit| 1u32 << bit);
    let spread = (0..=ExtendedId::MAX.as_raw()).step_by(0x0001_2345);
    for raw in singles.chain(spread) {
        let id = extended(raw);
        assert_eq!(Some(id), IdRegs::from_registers(IdRegs::from_id(id).into_registers()).id());
    }
}

#[test]
fn test_standard_id_ignores_extended_registers() {
    // EID8/EID0 hold leftovers, EXIDE is clear
    let regs = IdRegs::from_registers([0x24, 0x60, 0xAB, 0xCD]);
    assert_eq!(Some(standard(0x123)), regs.id());
}

#[test]
fn test_dlc_byte() {
    assert_eq!(0x02, dlc_byte(2, false));
    assert_eq!(0x08, dlc_byte(12, false));
    assert_eq!(0x43, dlc_byte(3, true));
    assert_eq!(0x48, dlc_byte(9, true));
}

#[test]
fn test_frame_new() {
    let frame = CanFrame::new(standard(0x10), &[1, 2, 3]).unwrap();
    assert_eq!(3, frame.dlc());
    assert_eq!(&[1u8, 2, 3], frame.data());
    assert!(!frame.is_remote_frame());
    assert!(!frame.is_extended());

    assert!(CanFrame::new(standard(0x10), &[0; 9]).is_none());
    assert!(CanFrame::new_remote(extended(0x10), 9).is_none());
}

#[test]
fn test_remote_frame_has_no_data() {
    let frame = CanFrame::new_remote(extended(0x10), 4).unwrap();
    assert_eq!(4, frame.dlc());
    assert!(frame.data().is_empty());
    assert!(frame.is_extended());
}

#[test]
fn test_payload_data_frame() {
    let frame = CanFrame::new(standard(0x123), &[0xAA, 0xBB]).unwrap();
    assert_eq!(
        &[0x24u8, 0x60, 0x00, 0x00, 0x02, 0xAA, 0xBB],
        TxPayload::from_frame(&frame).as_bytes()
    );
}

#[test]
fn test_payload_remote_frame() {
    let frame = CanFrame::new_remote(standard(0x123), 2).unwrap();
    assert_eq!(&[0x24u8, 0x60, 0x00, 0x00, 0x42], TxPayload::from_frame(&frame).as_bytes());
}

#[test]
fn test_from_registers_clamps_dlc() {
    let data = [1, 2, 3, 4, 5, 6, 7, 8];
    let frame = CanFrame::from_registers([0x24, 0x60, 0x00, 0x00, 0x0C], &data).unwrap();
    assert_eq!(8, frame.dlc());
    assert_eq!(&data, frame.data());
}

#[test]
fn test_from_registers_keeps_dlc_bytes_only() {
    let data = [1, 2, 3, 4, 5, 6, 7, 8];
    let frame = CanFrame::from_registers([0x91, 0xA8, 0x56, 0x78, 0x03], &data).unwrap();
    assert_eq!(extended(0x1234_5678), frame.id());
    assert_eq!(&[1u8, 2, 3], frame.data());
    assert_eq!(CanFrame::new(extended(0x1234_5678), &[1, 2, 3]).unwrap(), frame);
}

#[test]
fn test_from_registers_remote() {
    let frame = CanFrame::from_registers([0x24, 0x60, 0x00, 0x00, 0x45], &[0xFF; 8]).unwrap();
    assert!(frame.is_remote_frame());
    assert_eq!(5, frame.dlc());
    assert!(frame.data().is_empty());
}
