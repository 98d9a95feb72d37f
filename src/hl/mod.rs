//! High-level interface to the board bringup sequence
//!
//! The entry point to this API is the [Board] struct. Please refer to the
//! documentation there for more details.
//!
//! This module implements a high-level, typestate interface over the
//! [register-level interface]: a board starts out [Uninitialized], and
//! [`init`] moves it to [Running] by enabling the port clock and configuring
//! the LED pin, in that order. The type system makes it impossible to drive
//! the pin before the clock gate is open, which on real hardware would be an
//! undefined write.
//!
//! [register-level interface]: ../ll/index.html
//! [`init`]: struct.Board.html#method.init

use core::fmt;

pub use running::*;
#[allow(unused_imports)]
pub use uninitialized::*;

use crate::ll;

mod running;
mod uninitialized;

/// Entry point to the board bringup API
///
/// Generic over the register bus (the real [`Mmio`] bus on hardware, a mock
/// in host tests) and over the bringup state.
///
/// [`Mmio`]: ../ll/struct.Mmio.html
pub struct Board<BUS, State> {
    ll: ll::Registers<BUS>,
    state: State,
}

impl<BUS, State> Board<BUS, State> {
    /// Direct register-level access to the peripherals
    ///
    /// Escape hatch for anything the high-level API does not cover. Writes
    /// made here are invisible to the typestate, so they can violate the
    /// ordering the states otherwise guarantee.
    pub fn ll(&mut self) -> &mut ll::Registers<BUS> {
        &mut self.ll
    }

    /// Consume `self` and release the bus
    pub fn free(self) -> BUS {
        self.ll.free()
    }
}

// Can't be derived without putting requirements on `BUS`.
impl<BUS, State> fmt::Debug for Board<BUS, State>
where
    State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Board {{ state: ")?;
        self.state.fmt(f)?;
        write!(f, ", .. }}")?;

        Ok(())
    }
}

/// Indicates that the board has not been clocked or configured yet
///
/// Writes to the GPIO block in this state would hit an ungated bus segment.
#[derive(Debug)]
pub struct Uninitialized;

/// Indicates that the LED pin is configured and driven
///
/// This state is absorbing: there is no transition out of it, matching a
/// firmware main loop that never returns.
#[derive(Debug)]
pub struct Running;

#[cfg(feature = "defmt")]
impl defmt::Format for Uninitialized {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Uninitialized");
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Running {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Running");
    }
}
