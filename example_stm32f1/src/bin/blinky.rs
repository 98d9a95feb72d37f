//! Minimal LED image for an STM32F103: vector table, reset handler, and the
//! bringup sequence driving port D pin 1.
//!
//! The linker script is expected to place the `.vectors` section at the
//! start of flash and to define the usual section boundary symbols
//! (`_etext`, `_sdata`, `_edata`, `_sbss`, `_ebss`).

#![no_std]
#![no_main]

use core::ptr::{addr_of, addr_of_mut};

use panic_halt as _;

use stm32f1_bringup::{
    startup::{self, VectorTable},
    Board, Mmio,
};

/// Top of SRAM on a 64K part, loaded into SP by hardware at power-on
const STACK_TOP: u32 = 0x2000_8000;

// Section boundaries, defined by the linker script. Only their addresses
// are meaningful; never read these as values.
extern "C" {
    static _etext: u8;
    static mut _sdata: u8;
    static mut _edata: u8;
    static mut _sbss: u8;
    static mut _ebss: u8;
}

/// The exception table the core reads at power-on
///
/// Pinned to the start of the image by the linker script; slots 3 and 4 are
/// unused and stay zero.
#[link_section = ".vectors"]
#[no_mangle]
pub static VECTORS: VectorTable = VectorTable {
    initial_sp: STACK_TOP,
    reset: Reset,
    nmi: NMI,
    hard_fault: 0,
    mem_manage: 0,
};

/// Entered by hardware with SP already loaded from slot 0
///
/// # Safety
///
/// Called exactly once, by the core, out of reset. Must not be called from
/// software.
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn Reset() -> ! {
    // Statics are not usable until both of these have run.
    startup::copy_data(addr_of!(_etext), addr_of_mut!(_sdata), addr_of_mut!(_edata));
    startup::zero_bss(addr_of_mut!(_sbss), addr_of_mut!(_ebss));

    main()
}

/// Non-maskable interrupt: park the core
///
/// # Safety
///
/// Called by the core only. Never returns, so the interrupted context is
/// abandoned.
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn NMI() -> ! {
    startup::halt()
}

fn main() -> ! {
    // The only `Mmio` in the image, created once, right here.
    let board = Board::new(unsafe { Mmio::new() });

    board.init().run()
}
