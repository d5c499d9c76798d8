// src/serial/backend.rs

//! Hardware abstraction for the UART drivers.
//!
//! Register roles are named by a per-variant [`RegisterMap`] enum, so offsets
//! and widths are fixed once in the map instead of being recomputed at every
//! call site. The drivers only ever talk to a [`UartHardware`]
//! implementation: [`Mmio`] on real hardware, a recording mock in tests.

use super::error::UartError;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr;

/// A set of named registers inside one register window.
pub trait RegisterMap: Copy + fmt::Debug {
    /// Access width of every register in the window
    type Word: Copy;
    /// Span of the window in bytes
    const WINDOW_SIZE: usize;
    /// Byte offset of this register from the window base
    fn offset(self) -> usize;
}

/// Minimal abstraction over UART register access.
///
/// Implementations must not reorder, merge or drop accesses: every call is
/// a hardware side effect.
pub trait UartHardware<W: Copy> {
    /// Read the current value of a register.
    fn read<R: RegisterMap<Word = W>>(&mut self, register: R) -> W;
    /// Write a value to a register.
    fn write<R: RegisterMap<Word = W>>(&mut self, register: R, value: W);
}

/// Memory-mapped register window backed by volatile pointer access.
pub struct Mmio<W> {
    base: usize,
    len: usize,
    _word: PhantomData<W>,
}

impl<W: Copy> Mmio<W> {
    /// Create a window without validating the address
    ///
    /// # Safety
    ///
    /// `base..base + R::WINDOW_SIZE` must be the register window of a UART
    /// of the matching variant, mapped as device memory, aligned for `W`,
    /// and not accessed through any other handle.
    pub const unsafe fn new_unchecked<R: RegisterMap<Word = W>>(base: usize) -> Self {
        Self {
            base,
            len: R::WINDOW_SIZE,
            _word: PhantomData,
        }
    }

    /// Create a window after checking the address once
    ///
    /// Rejects a null base, a base that is not aligned for `W`, and a window
    /// that would wrap the address space.
    ///
    /// # Safety
    ///
    /// Same contract as [`Mmio::new_unchecked`]; only the arithmetic
    /// properties of the address are checked here.
    pub unsafe fn new<R: RegisterMap<Word = W>>(base: usize) -> Result<Self, UartError> {
        if base == 0 {
            return Err(UartError::InvalidAddress);
        }
        if base % mem::align_of::<W>() != 0 {
            return Err(UartError::MisalignedAddress);
        }
        if base.checked_add(R::WINDOW_SIZE).is_none() {
            return Err(UartError::InvalidAddress);
        }

        // SAFETY: forwarded from the caller.
        Ok(unsafe { Self::new_unchecked::<R>(base) })
    }

    /// Window base address
    pub const fn base(&self) -> usize {
        self.base
    }

    #[inline]
    fn addr_of<R: RegisterMap<Word = W>>(&self, register: R) -> usize {
        let offset = register.offset();
        debug_assert!(
            offset + mem::size_of::<W>() <= self.len,
            "register {:?} outside the {}-byte window",
            register,
            self.len
        );
        self.base + offset
    }
}

impl<W: Copy> UartHardware<W> for Mmio<W> {
    #[inline]
    fn read<R: RegisterMap<Word = W>>(&mut self, register: R) -> W {
        let addr = self.addr_of(register);
        // SAFETY: the window was vouched for at construction and the offset
        // lies inside it. Volatile so the read is never elided or cached.
        unsafe { ptr::read_volatile(addr as *const W) }
    }

    #[inline]
    fn write<R: RegisterMap<Word = W>>(&mut self, register: R, value: W) {
        let addr = self.addr_of(register);
        // SAFETY: as for `read`.
        unsafe { ptr::write_volatile(addr as *mut W, value) }
    }
}

impl<W> fmt::Debug for Mmio<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mmio")
            .field("base", &format_args!("{:#x}", self.base))
            .field("len", &self.len)
            .finish()
    }
}
