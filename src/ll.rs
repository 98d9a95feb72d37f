//! Register-level interface to the RCC and GPIO blocks
//!
//! This module implements a register-level interface to the two peripheral
//! blocks the bringup sequence touches: the reset and clock control unit
//! (RCC) and one GPIO port. Users of this crate should typically not need to
//! use this. Please consider using the [high-level interface] instead.
//!
//! Every register access goes through a [`Bus`], which performs exactly one
//! 32-bit load or store at the register's documented address. On hardware
//! that bus is [`Mmio`]; host-side tests substitute a mock that backs the
//! register file with plain memory.
//!
//! **NOTE**: Many field access methods accept types that have a larger number
//! of bits than the field actually consists of. If you use such a method to
//! pass a value that is too large to be written to the field, it will be
//! silently truncated.
//!
//! [high-level interface]: ../hl/index.html

use core::{marker::PhantomData, ptr};

/// Start of the peripheral address space
pub const PERIPH_BASE: u32 = 0x4000_0000;

/// Base address of the reset and clock control block (RM0008, section 3.3)
pub const RCC_BASE: u32 = PERIPH_BASE + 0x2_1000;

/// Base address of the GPIO port D block (RM0008, section 3.3)
pub const GPIOD_BASE: u32 = PERIPH_BASE + 0x1_1400;

/// A 32-bit register bus
///
/// The contract is strict: `read` performs exactly one 32-bit load from
/// `addr` and `write` performs exactly one 32-bit store to `addr`. No
/// caching, no buffering, no access splitting. The [`Registers`] accessors
/// build read-modify-write on top of these two primitives and rely on each
/// call reaching the device.
///
/// Accesses are infallible: a memory-mapped store has no software-observable
/// failure mode.
pub trait Bus {
    /// Perform a single 32-bit load from `addr`
    fn read(&mut self, addr: u32) -> u32;

    /// Perform a single 32-bit store to `addr`
    fn write(&mut self, addr: u32, value: u32);
}

/// The memory-mapped register bus of the real device
///
/// Reads and writes are volatile, so the compiler can neither elide nor
/// reorder them against each other.
pub struct Mmio(());

impl Mmio {
    /// Create the MMIO bus
    ///
    /// # Safety
    ///
    /// The caller must ensure that this code runs on a device where the
    /// peripheral address space described by this module actually exists,
    /// and that no other code accesses these registers concurrently. Create
    /// at most one `Mmio` per device.
    pub const unsafe fn new() -> Self {
        Mmio(())
    }
}

impl Bus for Mmio {
    fn read(&mut self, addr: u32) -> u32 {
        unsafe { ptr::read_volatile(addr as usize as *const u32) }
    }

    fn write(&mut self, addr: u32, value: u32) {
        unsafe { ptr::write_volatile(addr as usize as *mut u32, value) }
    }
}

/// Entry point to the register-level API
///
/// Wraps the bus and hands out one accessor per register. Please consider
/// using [`Board`] instead.
///
/// [`Board`]: ../hl/struct.Board.html
pub struct Registers<BUS> {
    bus: BUS,
}

impl<BUS> Registers<BUS> {
    /// Create a new instance of `Registers`
    ///
    /// Requires the bus that reaches the peripheral address space.
    pub fn new(bus: BUS) -> Self {
        Registers { bus }
    }

    /// Allow direct access to the underlying bus
    pub fn bus(&mut self) -> &mut BUS {
        &mut self.bus
    }

    /// Consume `self` and release the bus
    pub fn free(self) -> BUS {
        self.bus
    }
}

/// Provides access to a register
///
/// You can get an instance for a given register using one of the methods on
/// [`Registers`].
pub struct RegAccessor<'s, R, BUS>(&'s mut Registers<BUS>, PhantomData<R>);

impl<'s, R, BUS> RegAccessor<'s, R, BUS>
where
    BUS: Bus,
{
    /// Read from the register
    #[inline]
    pub fn read(&mut self) -> R::Read
    where
        R: Register + Readable,
    {
        R::from_bits(self.0.bus.read(R::ADDR))
    }

    /// Write to the register
    ///
    /// The value passed to the closure starts out all-zero; fields that the
    /// closure does not set are written as zero.
    #[inline]
    pub fn write<F>(&mut self, f: F)
    where
        R: Register + Writable,
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        let mut w = R::zeroed();
        f(&mut w);
        self.0.bus.write(R::ADDR, <R as Writable>::bits(&w));
    }

    /// Modify the register
    ///
    /// Reads the register, lets the closure change individual fields, and
    /// writes the result back. Bits not named by the closure keep the value
    /// that was read, which is what makes this safe on registers shared
    /// between unrelated peripherals.
    #[inline]
    pub fn modify<F>(&mut self, f: F)
    where
        R: Register + Readable + Writable,
        F: for<'r> FnOnce(&mut R::Read, &'r mut R::Write) -> &'r mut R::Write,
    {
        let mut r = self.read();
        let mut w = R::zeroed();
        *<R as Writable>::bits_mut(&mut w) = <R as Readable>::bits(&r);

        f(&mut r, &mut w);

        self.0.bus.write(R::ADDR, <R as Writable>::bits(&w));
    }
}

/// Implemented for all registers
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
///
/// RM0008 specifies the base address and offset for each register.
pub trait Register {
    /// Base address of the block the register belongs to
    const BASE: u32;

    /// The register's offset within its block
    const OFFSET: u32;

    /// The register's absolute bus address
    const ADDR: u32 = Self::BASE + Self::OFFSET;
}

/// Marker trait for registers that can be read from
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
pub trait Readable {
    /// The type that is used to read from the register
    type Read;

    /// Build the read type from a raw register value
    fn from_bits(bits: u32) -> Self::Read;

    /// Return the read type's raw value
    fn bits(r: &Self::Read) -> u32;
}

/// Marker trait for registers that can be written to
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
pub trait Writable {
    /// The type that is used to write to the register
    type Write;

    /// Return the write type with an all-zero value
    fn zeroed() -> Self::Write;

    /// Return the write type's raw value
    fn bits(w: &Self::Write) -> u32;

    /// Return a mutable reference to the write type's raw value
    fn bits_mut(w: &mut Self::Write) -> &mut u32;
}

/// Generates register implementations
macro_rules! impl_register {
    (
        $(
            $base:expr,
            $offset:expr,
            $rw:tt,
            $name:ident($name_lower:ident) {
            #[$doc:meta]
            $(
                $field:ident,
                $first_bit:expr,
                $last_bit:expr,
                $ty:ty;
                #[$field_doc:meta]
            )*
            }
        )*
    ) => {
        $(
            #[$doc]
            #[allow(non_camel_case_types)]
            pub struct $name;

            impl Register for $name {
                const BASE: u32 = $base;
                const OFFSET: u32 = $offset;
            }

            #[$doc]
            pub mod $name_lower {
                use core::fmt;

                /// Used to read from the register
                pub struct R(pub(crate) u32);

                impl R {
                    $(
                        #[$field_doc]
                        #[inline(always)]
                        pub fn $field(&self) -> $ty {
                            const WIDTH: u32 = ($last_bit) - ($first_bit) + 1;
                            const MASK: u32 = ((1u64 << WIDTH) - 1) as u32;

                            ((self.0 >> ($first_bit)) & MASK) as $ty
                        }
                    )*
                }

                impl fmt::Debug for R {
                    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "{:#010x}", self.0)
                    }
                }

                #[cfg(feature = "defmt")]
                impl defmt::Format for R {
                    fn format(&self, f: defmt::Formatter) {
                        defmt::write!(f, "{=u32:08x}", self.0);
                    }
                }

                /// Used to write to the register
                pub struct W(pub(crate) u32);

                impl W {
                    $(
                        #[$field_doc]
                        #[inline(always)]
                        pub fn $field(&mut self, value: $ty) -> &mut Self {
                            const WIDTH: u32 = ($last_bit) - ($first_bit) + 1;
                            const MASK: u32 = ((1u64 << WIDTH) - 1) as u32;

                            self.0 &= !(MASK << ($first_bit));
                            self.0 |= ((value as u32) & MASK) << ($first_bit);
                            self
                        }
                    )*
                }
            }

            impl_rw!($rw, $name, $name_lower);
        )*


        impl<BUS> Registers<BUS> {
            $(
                #[$doc]
                pub fn $name_lower(&mut self) -> RegAccessor<$name, BUS> {
                    RegAccessor(self, PhantomData)
                }
            )*
        }
    }
}

// Helper macro, used internally by `impl_register!`
macro_rules! impl_rw {
    (RO, $name:ident, $name_lower:ident) => {
        impl_rw!(@R, $name, $name_lower);
    };
    (WO, $name:ident, $name_lower:ident) => {
        impl_rw!(@W, $name, $name_lower);
    };
    (RW, $name:ident, $name_lower:ident) => {
        impl_rw!(@R, $name, $name_lower);
        impl_rw!(@W, $name, $name_lower);
    };

    (@R, $name:ident, $name_lower:ident) => {
        impl Readable for $name {
            type Read = $name_lower::R;

            fn from_bits(bits: u32) -> Self::Read {
                $name_lower::R(bits)
            }

            fn bits(r: &Self::Read) -> u32 {
                r.0
            }
        }
    };
    (@W, $name:ident, $name_lower:ident) => {
        impl Writable for $name {
            type Write = $name_lower::W;

            fn zeroed() -> Self::Write {
                $name_lower::W(0)
            }

            fn bits(w: &Self::Write) -> u32 {
                w.0
            }

            fn bits_mut(w: &mut Self::Write) -> &mut u32 {
                &mut w.0
            }
        }
    };
}

// All registers are implemented in this macro invocation. It follows the
// following syntax:
// <base>, <offset>, <RO/RW/WO>, <NAME(name)> { /// <doc>
//     <field>, <first-bit-index>, <last-bit-index>, <type>; /// <doc>
//     ...
// }
//
// Offsets and bit positions for the RCC block come from RM0008 section 8.3,
// for the GPIO block from section 9.2. Registers the bringup sequence never
// decodes are exposed with a single whole-register `value` field.

impl_register! {

    RCC_BASE, 0x00, RW, CR(cr) { /// Clock control register
        hsion,     0,  0, u8; /// Internal high-speed clock enable
        hsirdy,    1,  1, u8; /// Internal high-speed clock ready flag
        hsitrim,   3,  7, u8; /// Internal high-speed clock trimming
        hsical,    8, 15, u8; /// Internal high-speed clock calibration
        hseon,    16, 16, u8; /// External high-speed clock enable
        hserdy,   17, 17, u8; /// External high-speed clock ready flag
        hsebyp,   18, 18, u8; /// External high-speed clock bypass
        csson,    19, 19, u8; /// Clock security system enable
        pllon,    24, 24, u8; /// PLL enable
        pllrdy,   25, 25, u8; /// PLL clock ready flag
    }
    RCC_BASE, 0x04, RW, CFGR(cfgr) { /// Clock configuration register
        sw,        0,  1, u8; /// System clock switch
        sws,       2,  3, u8; /// System clock switch status
        hpre,      4,  7, u8; /// AHB prescaler
        ppre1,     8, 10, u8; /// APB low-speed prescaler
        ppre2,    11, 13, u8; /// APB high-speed prescaler
        adcpre,   14, 15, u8; /// ADC prescaler
        pllsrc,   16, 16, u8; /// PLL entry clock source
        pllxtpre, 17, 17, u8; /// HSE divider for PLL entry
        pllmul,   18, 21, u8; /// PLL multiplication factor
        usbpre,   22, 22, u8; /// USB prescaler
        mco,      24, 26, u8; /// Microcontroller clock output
    }
    RCC_BASE, 0x08, RW, CIR(cir) { /// Clock interrupt register
        value, 0, 31, u32; /// Raw register value
    }
    RCC_BASE, 0x0C, RW, APB2RSTR(apb2rstr) { /// APB2 peripheral reset register
        afiorst,    0,  0, u8; /// Alternate function IO reset
        ioparst,    2,  2, u8; /// IO port A reset
        iopbrst,    3,  3, u8; /// IO port B reset
        iopcrst,    4,  4, u8; /// IO port C reset
        iopdrst,    5,  5, u8; /// IO port D reset
        ioperst,    6,  6, u8; /// IO port E reset
        adc1rst,    9,  9, u8; /// ADC 1 interface reset
        adc2rst,   10, 10, u8; /// ADC 2 interface reset
        tim1rst,   11, 11, u8; /// TIM1 timer reset
        spi1rst,   12, 12, u8; /// SPI 1 reset
        usart1rst, 14, 14, u8; /// USART1 reset
    }
    RCC_BASE, 0x10, RW, APB1RSTR(apb1rstr) { /// APB1 peripheral reset register
        value, 0, 31, u32; /// Raw register value
    }
    RCC_BASE, 0x14, RW, AHBENR(ahbenr) { /// AHB peripheral clock enable register
        dma1en,  0, 0, u8; /// DMA1 clock enable
        dma2en,  1, 1, u8; /// DMA2 clock enable
        sramen,  2, 2, u8; /// SRAM interface clock enable
        flitfen, 4, 4, u8; /// FLITF clock enable
        crcen,   6, 6, u8; /// CRC clock enable
    }
    RCC_BASE, 0x18, RW, APB2ENR(apb2enr) { /// APB2 peripheral clock enable register
        afioen,   0,  0, u8; /// Alternate function IO clock enable
        iopaen,   2,  2, u8; /// IO port A clock enable
        iopben,   3,  3, u8; /// IO port B clock enable
        iopcen,   4,  4, u8; /// IO port C clock enable
        iopden,   5,  5, u8; /// IO port D clock enable
        iopeen,   6,  6, u8; /// IO port E clock enable
        adc1en,   9,  9, u8; /// ADC 1 interface clock enable
        adc2en,  10, 10, u8; /// ADC 2 interface clock enable
        tim1en,  11, 11, u8; /// TIM1 timer clock enable
        spi1en,  12, 12, u8; /// SPI 1 clock enable
        usart1en, 14, 14, u8; /// USART1 clock enable
    }
    RCC_BASE, 0x1C, RW, APB1ENR(apb1enr) { /// APB1 peripheral clock enable register
        value, 0, 31, u32; /// Raw register value
    }
    RCC_BASE, 0x20, RW, BDCR(bdcr) { /// Backup domain control register
        value, 0, 31, u32; /// Raw register value
    }
    RCC_BASE, 0x24, RW, CSR(csr) { /// Control/status register
        value, 0, 31, u32; /// Raw register value
    }
    RCC_BASE, 0x28, RW, AHBRSTR(ahbrstr) { /// AHB peripheral clock reset register
        value, 0, 31, u32; /// Raw register value
    }
    RCC_BASE, 0x2C, RW, CFGR2(cfgr2) { /// Clock configuration register 2
        value, 0, 31, u32; /// Raw register value
    }

    GPIOD_BASE, 0x00, RW, CRL(crl) { /// Port configuration register low (pins 0-7)
        mode0,  0,  1, u8; /// Pin 0 mode
        cnf0,   2,  3, u8; /// Pin 0 configuration
        mode1,  4,  5, u8; /// Pin 1 mode
        cnf1,   6,  7, u8; /// Pin 1 configuration
        mode2,  8,  9, u8; /// Pin 2 mode
        cnf2,  10, 11, u8; /// Pin 2 configuration
        mode3, 12, 13, u8; /// Pin 3 mode
        cnf3,  14, 15, u8; /// Pin 3 configuration
        mode4, 16, 17, u8; /// Pin 4 mode
        cnf4,  18, 19, u8; /// Pin 4 configuration
        mode5, 20, 21, u8; /// Pin 5 mode
        cnf5,  22, 23, u8; /// Pin 5 configuration
        mode6, 24, 25, u8; /// Pin 6 mode
        cnf6,  26, 27, u8; /// Pin 6 configuration
        mode7, 28, 29, u8; /// Pin 7 mode
        cnf7,  30, 31, u8; /// Pin 7 configuration
    }
    GPIOD_BASE, 0x04, RW, CRH(crh) { /// Port configuration register high (pins 8-15)
        mode8,   0,  1, u8; /// Pin 8 mode
        cnf8,    2,  3, u8; /// Pin 8 configuration
        mode9,   4,  5, u8; /// Pin 9 mode
        cnf9,    6,  7, u8; /// Pin 9 configuration
        mode10,  8,  9, u8; /// Pin 10 mode
        cnf10,  10, 11, u8; /// Pin 10 configuration
        mode11, 12, 13, u8; /// Pin 11 mode
        cnf11,  14, 15, u8; /// Pin 11 configuration
        mode12, 16, 17, u8; /// Pin 12 mode
        cnf12,  18, 19, u8; /// Pin 12 configuration
        mode13, 20, 21, u8; /// Pin 13 mode
        cnf13,  22, 23, u8; /// Pin 13 configuration
        mode14, 24, 25, u8; /// Pin 14 mode
        cnf14,  26, 27, u8; /// Pin 14 configuration
        mode15, 28, 29, u8; /// Pin 15 mode
        cnf15,  30, 31, u8; /// Pin 15 configuration
    }
    GPIOD_BASE, 0x08, RO, IDR(idr) { /// Port input data register
        idr0,   0,  0, u8; /// Pin 0 input level
        idr1,   1,  1, u8; /// Pin 1 input level
        idr2,   2,  2, u8; /// Pin 2 input level
        idr3,   3,  3, u8; /// Pin 3 input level
        idr4,   4,  4, u8; /// Pin 4 input level
        idr5,   5,  5, u8; /// Pin 5 input level
        idr6,   6,  6, u8; /// Pin 6 input level
        idr7,   7,  7, u8; /// Pin 7 input level
        idr8,   8,  8, u8; /// Pin 8 input level
        idr9,   9,  9, u8; /// Pin 9 input level
        idr10, 10, 10, u8; /// Pin 10 input level
        idr11, 11, 11, u8; /// Pin 11 input level
        idr12, 12, 12, u8; /// Pin 12 input level
        idr13, 13, 13, u8; /// Pin 13 input level
        idr14, 14, 14, u8; /// Pin 14 input level
        idr15, 15, 15, u8; /// Pin 15 input level
    }
    GPIOD_BASE, 0x0C, RW, ODR(odr) { /// Port output data register
        odr0,   0,  0, u8; /// Pin 0 output level
        odr1,   1,  1, u8; /// Pin 1 output level
        odr2,   2,  2, u8; /// Pin 2 output level
        odr3,   3,  3, u8; /// Pin 3 output level
        odr4,   4,  4, u8; /// Pin 4 output level
        odr5,   5,  5, u8; /// Pin 5 output level
        odr6,   6,  6, u8; /// Pin 6 output level
        odr7,   7,  7, u8; /// Pin 7 output level
        odr8,   8,  8, u8; /// Pin 8 output level
        odr9,   9,  9, u8; /// Pin 9 output level
        odr10, 10, 10, u8; /// Pin 10 output level
        odr11, 11, 11, u8; /// Pin 11 output level
        odr12, 12, 12, u8; /// Pin 12 output level
        odr13, 13, 13, u8; /// Pin 13 output level
        odr14, 14, 14, u8; /// Pin 14 output level
        odr15, 15, 15, u8; /// Pin 15 output level
    }
    GPIOD_BASE, 0x10, WO, BSRR(bsrr) { /// Port bit set/reset register
        bs0,    0,  0, u8; /// Set pin 0
        bs1,    1,  1, u8; /// Set pin 1
        bs2,    2,  2, u8; /// Set pin 2
        bs3,    3,  3, u8; /// Set pin 3
        bs4,    4,  4, u8; /// Set pin 4
        bs5,    5,  5, u8; /// Set pin 5
        bs6,    6,  6, u8; /// Set pin 6
        bs7,    7,  7, u8; /// Set pin 7
        bs8,    8,  8, u8; /// Set pin 8
        bs9,    9,  9, u8; /// Set pin 9
        bs10,  10, 10, u8; /// Set pin 10
        bs11,  11, 11, u8; /// Set pin 11
        bs12,  12, 12, u8; /// Set pin 12
        bs13,  13, 13, u8; /// Set pin 13
        bs14,  14, 14, u8; /// Set pin 14
        bs15,  15, 15, u8; /// Set pin 15
        br0,   16, 16, u8; /// Reset pin 0
        br1,   17, 17, u8; /// Reset pin 1
        br2,   18, 18, u8; /// Reset pin 2
        br3,   19, 19, u8; /// Reset pin 3
        br4,   20, 20, u8; /// Reset pin 4
        br5,   21, 21, u8; /// Reset pin 5
        br6,   22, 22, u8; /// Reset pin 6
        br7,   23, 23, u8; /// Reset pin 7
        br8,   24, 24, u8; /// Reset pin 8
        br9,   25, 25, u8; /// Reset pin 9
        br10,  26, 26, u8; /// Reset pin 10
        br11,  27, 27, u8; /// Reset pin 11
        br12,  28, 28, u8; /// Reset pin 12
        br13,  29, 29, u8; /// Reset pin 13
        br14,  30, 30, u8; /// Reset pin 14
        br15,  31, 31, u8; /// Reset pin 15
    }
    GPIOD_BASE, 0x14, WO, BRR(brr) { /// Port bit reset register
        br0,    0,  0, u8; /// Reset pin 0
        br1,    1,  1, u8; /// Reset pin 1
        br2,    2,  2, u8; /// Reset pin 2
        br3,    3,  3, u8; /// Reset pin 3
        br4,    4,  4, u8; /// Reset pin 4
        br5,    5,  5, u8; /// Reset pin 5
        br6,    6,  6, u8; /// Reset pin 6
        br7,    7,  7, u8; /// Reset pin 7
        br8,    8,  8, u8; /// Reset pin 8
        br9,    9,  9, u8; /// Reset pin 9
        br10,  10, 10, u8; /// Reset pin 10
        br11,  11, 11, u8; /// Reset pin 11
        br12,  12, 12, u8; /// Reset pin 12
        br13,  13, 13, u8; /// Reset pin 13
        br14,  14, 14, u8; /// Reset pin 14
        br15,  15, 15, u8; /// Reset pin 15
    }
    GPIOD_BASE, 0x18, RW, LCKR(lckr) { /// Port configuration lock register
        lck0,   0,  0, u8; /// Lock pin 0 configuration
        lck1,   1,  1, u8; /// Lock pin 1 configuration
        lck2,   2,  2, u8; /// Lock pin 2 configuration
        lck3,   3,  3, u8; /// Lock pin 3 configuration
        lck4,   4,  4, u8; /// Lock pin 4 configuration
        lck5,   5,  5, u8; /// Lock pin 5 configuration
        lck6,   6,  6, u8; /// Lock pin 6 configuration
        lck7,   7,  7, u8; /// Lock pin 7 configuration
        lck8,   8,  8, u8; /// Lock pin 8 configuration
        lck9,   9,  9, u8; /// Lock pin 9 configuration
        lck10, 10, 10, u8; /// Lock pin 10 configuration
        lck11, 11, 11, u8; /// Lock pin 11 configuration
        lck12, 12, 12, u8; /// Lock pin 12 configuration
        lck13, 13, 13, u8; /// Lock pin 13 configuration
        lck14, 14, 14, u8; /// Lock pin 14 configuration
        lck15, 15, 15, u8; /// Lock pin 15 configuration
        lckk,  16, 16, u8; /// Lock key
    }
}
