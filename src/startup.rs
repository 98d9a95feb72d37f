//! Runtime bootstrap for the bare-metal image
//!
//! The Cortex-M3 core reads the first two words of the image before a single
//! instruction of this crate runs: slot 0 becomes the initial stack pointer,
//! slot 1 the address execution starts at. [`VectorTable`] fixes that layout
//! as a type, and a firmware binary places one instance in the `.vectors`
//! section that the linker script puts at the start of the image.
//!
//! The reset handler must then establish the C-like memory environment the
//! application assumes: statics with initializers get their values copied
//! from the load image ([`copy_data`]), zero-initialized statics get zeroed
//! ([`zero_bss`]). Both must run before anything touches a static, which is
//! why these routines take raw pointers and nothing else: at this point
//! there is no runtime to lean on.
//!
//! The section boundary symbols (`_etext`, `_sdata`, `_edata`, `_sbss`,
//! `_ebss`) are produced by the linker script and trusted as-is; there is no
//! meaningful way to validate them from inside the image.

/// The exception table the hardware reads at power-on
///
/// Slot order and width are a contract with the core (ARMv7-M B1.5.3) and
/// with the linker script that pins the table to the start of flash. On the
/// target every slot is one 32-bit word; the handler slots hold pointers, so
/// host builds widen them without changing the order. This template only
/// populates the slots it uses; the hard-fault and mem-manage slots stay
/// zero.
#[repr(C)]
pub struct VectorTable {
    /// Slot 0: value loaded into SP before the first instruction
    pub initial_sp: u32,
    /// Slot 1: the reset handler, entered with SP already valid
    pub reset: unsafe extern "C" fn() -> !,
    /// Slot 2: non-maskable interrupt handler
    pub nmi: unsafe extern "C" fn() -> !,
    /// Slot 3: hard fault (unused in this template, keep zero)
    pub hard_fault: usize,
    /// Slot 4: memory management fault (unused in this template, keep zero)
    pub mem_manage: usize,
}

/// Copy the initialized-data image from flash to RAM
///
/// Copies bytes from `src` upward into `[dst, end)`, in ascending order.
/// After the call, every byte of the destination range equals the byte at
/// the same offset from `src`. Does nothing when `dst == end`.
///
/// The stores are volatile so the copy cannot be elided or deferred past
/// later code that reads the statics living in the destination range.
///
/// # Safety
///
/// `src` must be readable for `end - dst` bytes, `[dst, end)` must be
/// writable, the two ranges must not overlap, and nothing may hold
/// references into the destination range. In practice all three pointers
/// come straight from linker symbols.
pub unsafe fn copy_data(mut src: *const u8, mut dst: *mut u8, end: *mut u8) {
    while dst < end {
        dst.write_volatile(src.read_volatile());
        src = src.add(1);
        dst = dst.add(1);
    }
}

/// One iteration of the post-fault halt loop
///
/// Touches no register and changes no observable state; the halt is an
/// absorbing state. Kept separate from [`halt`] so tests can drive a
/// bounded number of iterations.
#[inline]
pub fn halt_step() {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    cortex_m::asm::nop();

    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    core::hint::spin_loop();
}

/// Park the core
///
/// The template's entire fault containment: after a non-maskable interrupt
/// there is no recovery, no logging, and no return to the interrupted
/// context. The only way out is a reset.
pub fn halt() -> ! {
    loop {
        halt_step();
    }
}

/// Zero the uninitialized-data region
///
/// After the call, every byte in `[start, end)` reads as zero, which is the
/// value the language guarantees for zero-initialized statics. Does nothing
/// when `start == end`.
///
/// # Safety
///
/// `[start, end)` must be writable and nothing may hold references into it.
pub unsafe fn zero_bss(mut start: *mut u8, end: *mut u8) {
    while start < end {
        start.write_volatile(0);
        start = start.add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::mem;

    unsafe extern "C" fn spin() -> ! {
        loop {
            core::hint::spin_loop();
        }
    }

    #[test]
    fn vector_table_slots_are_in_hardware_order() {
        // Slots are one pointer wide. On the Cortex-M3 that is the 32-bit
        // word the core expects, giving offsets 0x00/0x04/0x08/0x0C/0x10
        // and 20 bytes total; on a 64-bit test host the slots widen but
        // their order and density must not change.
        let word = mem::size_of::<usize>();

        assert_eq!(mem::size_of::<VectorTable>(), 5 * word);

        assert_eq!(mem::offset_of!(VectorTable, initial_sp), 0);
        assert_eq!(mem::offset_of!(VectorTable, reset), word);
        assert_eq!(mem::offset_of!(VectorTable, nmi), 2 * word);
        assert_eq!(mem::offset_of!(VectorTable, hard_fault), 3 * word);
        assert_eq!(mem::offset_of!(VectorTable, mem_manage), 4 * word);
    }

    #[test]
    fn vector_table_unused_slots_stay_zero() {
        let table = VectorTable {
            initial_sp: 0x2000_8000,
            reset: spin,
            nmi: spin,
            hard_fault: 0,
            mem_manage: 0,
        };

        assert_eq!(table.initial_sp, 0x2000_8000);
        assert_eq!(table.hard_fault, 0);
        assert_eq!(table.mem_manage, 0);
    }

    #[test]
    fn halt_loop_leaves_hardware_untouched() {
        use crate::{mock::MockBus, Board};

        let mut board = Board::new(MockBus::new()).init();

        let before = board.ll().bus().snapshot();
        let accesses = board.ll().bus().log().len();

        // `halt()` never returns; iterate its body under a cap instead and
        // check that nothing observable moves.
        for _ in 0..32 {
            halt_step();
        }

        let bus = board.free();
        assert_eq!(bus.snapshot(), before);
        assert_eq!(bus.log().len(), accesses);
    }

    #[test]
    fn copy_data_reproduces_the_source_image() {
        let src: [u8; 8] = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04];
        let mut dst = [0u8; 8];

        unsafe {
            let start = dst.as_mut_ptr();
            copy_data(src.as_ptr(), start, start.add(dst.len()));
        }

        assert_eq!(dst, src);
    }

    #[test]
    fn copy_data_preserves_byte_order() {
        let src: [u8; 4] = [1, 2, 3, 4];
        let mut dst = [0u8; 4];

        unsafe {
            let start = dst.as_mut_ptr();
            copy_data(src.as_ptr(), start, start.add(4));
        }

        assert_eq!(dst, [1, 2, 3, 4]);
    }

    #[test]
    fn copy_data_with_empty_range_is_a_no_op() {
        let src: [u8; 4] = [9; 4];
        let mut dst = [7u8; 4];

        unsafe {
            let start = dst.as_mut_ptr();
            copy_data(src.as_ptr(), start, start);
        }

        assert_eq!(dst, [7; 4]);
    }

    #[test]
    fn zero_bss_clears_the_range() {
        let mut bss = [0xFFu8; 16];

        unsafe {
            let start = bss.as_mut_ptr();
            zero_bss(start, start.add(bss.len()));
        }

        assert_eq!(bss, [0; 16]);
    }

    #[test]
    fn zero_bss_with_empty_range_is_a_no_op() {
        let mut bss = [0xA5u8; 4];

        unsafe {
            let start = bss.as_mut_ptr();
            zero_bss(start, start);
        }

        assert_eq!(bss, [0xA5; 4]);
    }

    #[test]
    fn zero_bss_stops_at_the_end_pointer() {
        let mut buf = [0xFFu8; 8];

        // Zero only the first half; the second half must survive.
        unsafe {
            let start = buf.as_mut_ptr();
            zero_bss(start, start.add(4));
        }

        assert_eq!(buf, [0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
