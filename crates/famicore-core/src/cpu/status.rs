use bitflags::bitflags;

bitflags! {
    /// The 8-bit processor status register (P).
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N V _ B D I Z C
    /// ```
    /// Bit 5 has no storage on the real chip and always reads back as 1 when
    /// the register is pushed; bit 4 ("B") only exists on the stack copy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Carry flag (C).
        const CARRY     = 0b0000_0001;
        /// Zero flag (Z).
        const ZERO      = 0b0000_0010;
        /// Interrupt disable flag (I).
        const INTERRUPT = 0b0000_0100;
        /// Decimal mode flag (D). Stored but ignored by the 2A03 ALU.
        const DECIMAL   = 0b0000_1000;
        /// Break flag (B). Set on PHP/BRK pushes, clear on IRQ/NMI pushes.
        const BREAK     = 0b0001_0000;
        /// Unused bit, hard-wired to 1 on pushes.
        const UNUSED    = 0b0010_0000;
        /// Overflow flag (V).
        const OVERFLOW  = 0b0100_0000;
        /// Negative flag (N).
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Status {
    /// Post-reset state: interrupts disabled, everything else clear.
    pub fn new() -> Self {
        Status::UNUSED | Status::INTERRUPT
    }

    /// Updates Z and N from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    /// The byte pushed by PHP/BRK: bit 5 and B both forced on.
    #[inline]
    pub fn pushed_by_instruction(self) -> u8 {
        (self | Status::UNUSED | Status::BREAK).bits()
    }

    /// The byte pushed by IRQ/NMI: bit 5 forced on, B forced off.
    #[inline]
    pub fn pushed_by_interrupt(self) -> u8 {
        ((self | Status::UNUSED) - Status::BREAK).bits()
    }

    /// Restores the register from a stack byte. B has no storage and bit 5
    /// always reads as set.
    #[inline]
    pub fn pulled(byte: u8) -> Self {
        (Status::from_bits_retain(byte) - Status::BREAK) | Status::UNUSED
    }

    #[inline]
    pub fn carry(self) -> bool {
        self.contains(Status::CARRY)
    }

    #[inline]
    pub fn zero(self) -> bool {
        self.contains(Status::ZERO)
    }

    #[inline]
    pub fn overflow(self) -> bool {
        self.contains(Status::OVERFLOW)
    }

    #[inline]
    pub fn negative(self) -> bool {
        self.contains(Status::NEGATIVE)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}
