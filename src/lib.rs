//! Bare-metal startup and GPIO bringup template for STM32F1 microcontrollers
//!
//! This crate contains everything a minimal STM32F1 image needs between
//! power-on and a driven LED pin: the vector table layout and memory
//! initialization routines ([`startup`]), a register-level interface to the
//! RCC and GPIO blocks ([`ll`]), and a typestate bringup API on top of it
//! ([`hl`]). The recommended way to use it is the [high-level interface];
//! the register-level interface is there when you need more flexibility.
//!
//! All register access goes through a bus trait, so the whole bringup
//! sequence runs unmodified against a mock register file in host tests. See
//! `example_stm32f1/` for a complete firmware image that runs it against the
//! real peripheral addresses.
//!
//! [high-level interface]: hl/index.html

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod delay;
pub mod hl;
pub mod ll;
pub mod startup;

#[cfg(any(test, feature = "std"))]
pub mod mock;

pub use crate::{
    hl::{Board, Led, Running, Uninitialized},
    ll::{Bus, Mmio},
    startup::VectorTable,
};
