//! Mock register bus for host-side tests
//!
//! Backs the two register blocks with plain zero-initialized memory and
//! records every access in order, so tests can assert both on final register
//! values and on the sequence of bus operations (for example that the clock
//! enable write happens before any port access).
//!
//! This fills the role that `embedded-hal-mock` plays for SPI-based drivers;
//! there is no published mock for a crate-local bus trait.

use std::vec::Vec;

use crate::ll::{Bus, GPIOD_BASE, RCC_BASE};

const RCC_LEN: usize = 12;
const GPIO_LEN: usize = 7;

/// One recorded bus operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// A 32-bit load, with the value that was returned
    Read {
        /// Absolute bus address
        addr: u32,
        /// Value returned to the caller
        value: u32,
    },
    /// A 32-bit store
    Write {
        /// Absolute bus address
        addr: u32,
        /// Value written
        value: u32,
    },
}

impl Access {
    /// The address the operation touched
    pub fn addr(&self) -> u32 {
        match *self {
            Access::Read { addr, .. } => addr,
            Access::Write { addr, .. } => addr,
        }
    }
}

/// A register bus backed by plain memory
///
/// All registers start out zero, which matches the scenario the startup code
/// sees after a power-on reset. Accesses outside the two mapped blocks
/// panic: on real silicon they would be undefined behaviour, and a test that
/// triggers one has found a bug.
pub struct MockBus {
    rcc: [u32; RCC_LEN],
    gpio: [u32; GPIO_LEN],
    log: Vec<Access>,
}

impl MockBus {
    /// Create a mock bus with all registers zero and an empty log
    pub fn new() -> Self {
        MockBus {
            rcc: [0; RCC_LEN],
            gpio: [0; GPIO_LEN],
            log: Vec::new(),
        }
    }

    /// Current value of the register at `addr`, without logging an access
    pub fn reg(&self, addr: u32) -> u32 {
        *self.slot_ref(addr)
    }

    /// Preset the register at `addr`, without logging an access
    pub fn set_reg(&mut self, addr: u32, value: u32) {
        *self.slot_mut(addr) = value;
    }

    /// The ordered log of every `read` and `write` so far
    pub fn log(&self) -> &[Access] {
        &self.log
    }

    /// Snapshot of both register blocks, for change detection
    pub fn snapshot(&self) -> ([u32; RCC_LEN], [u32; GPIO_LEN]) {
        (self.rcc, self.gpio)
    }

    fn slot_ref(&self, addr: u32) -> &u32 {
        match Self::index(addr) {
            (true, i) => &self.rcc[i],
            (false, i) => &self.gpio[i],
        }
    }

    fn slot_mut(&mut self, addr: u32) -> &mut u32 {
        match Self::index(addr) {
            (true, i) => &mut self.rcc[i],
            (false, i) => &mut self.gpio[i],
        }
    }

    fn index(addr: u32) -> (bool, usize) {
        assert_eq!(addr % 4, 0, "unaligned register access at {addr:#010x}");

        let rcc_end = RCC_BASE + 4 * RCC_LEN as u32;
        let gpio_end = GPIOD_BASE + 4 * GPIO_LEN as u32;

        if (RCC_BASE..rcc_end).contains(&addr) {
            (true, ((addr - RCC_BASE) / 4) as usize)
        } else if (GPIOD_BASE..gpio_end).contains(&addr) {
            (false, ((addr - GPIOD_BASE) / 4) as usize)
        } else {
            panic!("access to unmapped address {addr:#010x}");
        }
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for MockBus {
    fn read(&mut self, addr: u32) -> u32 {
        let value = *self.slot_ref(addr);
        self.log.push(Access::Read { addr, value });
        value
    }

    fn write(&mut self, addr: u32, value: u32) {
        *self.slot_mut(addr) = value;

        // The set/reset registers act on the output latch; mirror that so
        // stateful tests observe the same ODR a readback on silicon would.
        if addr == GPIOD_BASE + 0x10 {
            // Set bits win over reset bits when both are given (RM0008).
            let odr = self.slot_mut(GPIOD_BASE + 0x0C);
            *odr &= !(value >> 16);
            *odr |= value & 0xFFFF;
        } else if addr == GPIOD_BASE + 0x14 {
            *self.slot_mut(GPIOD_BASE + 0x0C) &= !(value & 0xFFFF);
        }

        self.log.push(Access::Write { addr, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_start_zeroed() {
        let bus = MockBus::new();

        assert_eq!(bus.reg(RCC_BASE + 0x18), 0);
        assert_eq!(bus.reg(GPIOD_BASE), 0);
        assert!(bus.log().is_empty());
    }

    #[test]
    fn writes_are_logged_in_order() {
        let mut bus = MockBus::new();

        bus.write(RCC_BASE + 0x18, 0x20);
        bus.write(GPIOD_BASE + 0x0C, 0x02);

        assert_eq!(
            bus.log(),
            &[
                Access::Write {
                    addr: RCC_BASE + 0x18,
                    value: 0x20
                },
                Access::Write {
                    addr: GPIOD_BASE + 0x0C,
                    value: 0x02
                },
            ]
        );
    }

    #[test]
    fn bsrr_and_brr_act_on_the_output_latch() {
        let mut bus = MockBus::new();

        bus.write(GPIOD_BASE + 0x10, 0x0000_0002);
        assert_eq!(bus.reg(GPIOD_BASE + 0x0C), 0x0000_0002);

        bus.write(GPIOD_BASE + 0x14, 0x0000_0002);
        assert_eq!(bus.reg(GPIOD_BASE + 0x0C), 0);
    }

    #[test]
    #[should_panic(expected = "unmapped address")]
    fn unmapped_access_panics() {
        let mut bus = MockBus::new();
        bus.read(0x4001_3800);
    }
}
