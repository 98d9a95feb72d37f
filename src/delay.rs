//! Software busy-wait delay
//!
//! A counted loop that burns CPU cycles and nothing else. There is no time
//! unit here: the wall-clock length of one iteration depends on the clock
//! tree and the optimizer, and this template configures neither a timer nor
//! a known sysclk. Good enough to pace the template's main loop, nothing
//! more.

/// Iteration count for a visible LED delay on the original template's clock
pub const LED_DELAY: u32 = 800_000;

/// Burn roughly `count` loop iterations
///
/// Returns immediately for `count == 0`. Each iteration executes a `nop` on
/// the target so the loop survives optimization; host builds spin-loop-hint
/// instead.
pub fn busy_wait(count: u32) {
    for _ in 0..count {
        #[cfg(all(target_arch = "arm", target_os = "none"))]
        cortex_m::asm::nop();

        #[cfg(not(all(target_arch = "arm", target_os = "none")))]
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_returns_immediately() {
        busy_wait(0);
    }

    #[test]
    fn small_count_terminates() {
        busy_wait(1000);
    }
}
