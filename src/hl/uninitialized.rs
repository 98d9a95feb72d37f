use crate::{
    ll::{self, Bus},
    Board, Running, Uninitialized,
};

impl<BUS> Board<BUS, Uninitialized>
where
    BUS: Bus,
{
    /// Create a new instance of `Board`
    ///
    /// Requires the register bus. Nothing is written to the hardware until
    /// [`init`] is called.
    ///
    /// [`init`]: #method.init
    pub fn new(bus: BUS) -> Self {
        Board {
            ll: ll::Registers::new(bus),
            state: Uninitialized,
        }
    }

    /// Bring up the LED pin
    ///
    /// Performs the whole INIT sequence, in an order that must not change:
    ///
    /// 1. Open the clock gate for the port's APB2 bus segment. Before this
    ///    write, the port's registers are unreachable; any earlier port
    ///    access would be undefined on real hardware.
    /// 2. Configure pin 1 as a 2 MHz push-pull output (MODE = `0b10`,
    ///    CNF = `0b00`). The other seven pins of CRL keep whatever
    ///    configuration they had.
    /// 3. Drive pin 1 high.
    ///
    /// All three steps are read-modify-write, so unrelated bits in the
    /// shared registers are preserved.
    pub fn init(mut self) -> Board<BUS, Running> {
        self.ll.apb2enr().modify(|_, w| w.iopden(1));

        self.ll.crl().modify(|_, w| w.mode1(0b10).cnf1(0b00));

        self.ll.odr().modify(|_, w| w.odr1(1));

        Board {
            ll: self.ll,
            state: Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        ll::{Register, APB2ENR, CRL, GPIOD_BASE, ODR},
        mock::{Access, MockBus},
    };

    #[test]
    fn init_from_power_on_reset_state() {
        let board = Board::new(MockBus::new());

        let board = board.init();

        let bus = board.free();
        assert_eq!(bus.reg(APB2ENR::ADDR), 0x0000_0020);
        assert_eq!(bus.reg(CRL::ADDR), 0x0000_0020);
        assert_eq!(bus.reg(ODR::ADDR), 0x0000_0002);

        // Nothing else may have been disturbed.
        let (rcc, gpio) = bus.snapshot();
        assert_eq!(rcc.iter().sum::<u32>(), 0x20);
        assert_eq!(gpio.iter().sum::<u32>(), 0x22);
    }

    #[test]
    fn init_preserves_unrelated_bits() {
        let mut bus = MockBus::new();
        bus.set_reg(APB2ENR::ADDR, 0x0000_4A04);
        bus.set_reg(CRL::ADDR, 0x4444_4444);
        bus.set_reg(ODR::ADDR, 0x0000_8000);

        let board = Board::new(bus).init();

        let bus = board.free();
        assert_eq!(bus.reg(APB2ENR::ADDR), 0x0000_4A24);
        assert_eq!(bus.reg(CRL::ADDR), 0x4444_4424);
        assert_eq!(bus.reg(ODR::ADDR), 0x0000_8002);
    }

    #[test]
    fn clock_enable_precedes_every_port_access() {
        let board = Board::new(MockBus::new()).init();

        let bus = board.free();
        let log = bus.log();

        let clock_write = log
            .iter()
            .position(|access| {
                matches!(
                    access,
                    Access::Write { addr, value }
                        if *addr == APB2ENR::ADDR && value & (1 << 5) != 0
                )
            })
            .expect("no clock enable write in the log");

        let first_port_access = log
            .iter()
            .position(|access| access.addr() & 0xFFFF_FF00 == GPIOD_BASE & 0xFFFF_FF00)
            .expect("no port access in the log");

        assert!(clock_write < first_port_access);
    }

    #[test]
    fn pin_nibble_is_output_push_pull_2mhz() {
        let mut bus = MockBus::new();
        // Reset value of a CR register is all-float-input, not zero.
        bus.set_reg(CRL::ADDR, 0x4444_4444);

        let board = Board::new(bus).init();

        let crl = board.free().reg(CRL::ADDR);
        assert_eq!((crl >> 4) & 0xF, 0b0010);
    }
}
