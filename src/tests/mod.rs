use mockall::Sequence;

use crate::mocks::{MockPin, MockSPIBus, NoopDelay, NoopPin, SimChip, TestClock};
use crate::{Settings, MCP2515};

mod frame;
mod pin;

pub(crate) type SimDriver = MCP2515<SimChip, NoopPin, NoopDelay, TestClock>;
pub(crate) type MockDriver = MCP2515<MockSPIBus, MockPin, NoopDelay, TestClock>;

/// Driver on a simulated chip that has only just powered up.
pub(crate) fn sim_driver() -> (SimDriver, SimChip) {
    let chip = SimChip::default();
    let mcp = MCP2515::new(
        chip.clone(),
        NoopPin,
        NoopDelay::default(),
        TestClock::default(),
    );
    (mcp, chip)
}

/// Driver on a simulated chip initialized with `settings`. The transaction
/// log starts empty.
pub(crate) fn initialized(settings: Settings) -> (SimDriver, SimChip) {
    let (mut mcp, chip) = sim_driver();
    mcp.init(settings).unwrap();
    chip.state().log.clear();
    (mcp, chip)
}

/// Exact SPI transaction expectations.
pub(crate) struct Mocks {
    pub bus: MockSPIBus,
    pub pin_cs: MockPin,
    seq: Sequence,
}

impl Mocks {
    pub fn new() -> Self {
        Self {
            bus: MockSPIBus::new(),
            pin_cs: MockPin::new(),
            seq: Sequence::new(),
        }
    }

    pub fn into_driver(self) -> MockDriver {
        MCP2515::new(
            self.bus,
            self.pin_cs,
            NoopDelay::default(),
            TestClock::default(),
        )
    }

    /// Expects one transaction sending `request`, answered with `response`.
    pub fn expect(&mut self, request: &'static [u8], response: &'static [u8]) {
        self.pin_cs
            .expect_set_low()
            .times(1)
            .return_const(Ok(()))
            .in_sequence(&mut self.seq);

        self.bus
            .expect_transfer()
            .times(1)
            .returning(move |data| {
                assert_eq!(request, &data[..]);
                Ok(response)
            })
            .in_sequence(&mut self.seq);

        self.pin_cs
            .expect_set_high()
            .times(1)
            .return_const(Ok(()))
            .in_sequence(&mut self.seq);
    }
}
