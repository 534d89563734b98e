//! Word transfer engine
//!
//! Clocks words through TDR/RDR one at a time, polling RDRF after each, and
//! applies the device's chip-select discipline around them:
//!
//! - **Automatic** chip select: the controller drives NPCS. The engine only
//!   marks the final word of a terminated transfer so the controller releases
//!   chip select after it. Byte transfers do this by clearing CSAAT before the
//!   last word, wider transfers by issuing LASTXFER.
//! - **GPIO, Frame**: chip select asserted before the first word and, when the
//!   transfer terminates, negated after the last. An unterminated transfer
//!   leaves it asserted so the next call continues the same frame.
//! - **GPIO, Toggle**: chip select pulsed around every word.
//! - **AlwaysHigh**: chip select is never touched.
//!
//! Words wider than 8 bits occupy two bytes of the buffer, least significant
//! byte first, and are shifted out MSB first like every SPI word.

use crate::device::{CsMode, DeviceId, LogicalDevice};
use crate::error::{Error, Result};
use crate::hal::{Hardware, SpiRegisters};
use crate::regs::{Control, Csr, Reg, Status};
use crate::resolver::Capability;

/// How long to wait for the controller to finish a word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum PollBound {
    /// Spin until the word completes, however long that takes
    #[default]
    Forever,
    /// Give up after this many status reads (at least one)
    Spins(u32),
}

/// Buffers for one transfer
#[derive(Debug)]
pub enum Words<'a> {
    /// Send the buffer, discard what comes back
    Write(&'a [u8]),
    /// Send the buffer contents as filler and overwrite them with what comes
    /// back
    Read(&'a mut [u8]),
    /// Send the first buffer, receive into the second
    ///
    /// The transfer length is that of the shorter buffer.
    Duplex(&'a [u8], &'a mut [u8]),
}

impl Words<'_> {
    /// Transfer length in bytes
    pub fn len(&self) -> usize {
        match self {
            Words::Write(tx) => tx.len(),
            Words::Read(buf) => buf.len(),
            Words::Duplex(tx, rx) => tx.len().min(rx.len()),
        }
    }

    /// True for a zero-length transfer
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tx_bytes(&self) -> &[u8] {
        match self {
            Words::Write(tx) | Words::Duplex(tx, _) => tx,
            Words::Read(buf) => buf,
        }
    }

    fn rx_bytes(&mut self) -> Option<&mut [u8]> {
        match self {
            Words::Write(_) => None,
            Words::Read(buf) => Some(buf),
            Words::Duplex(_, rx) => Some(rx),
        }
    }

    fn word_count(&self, width: Width) -> usize {
        match width {
            Width::Byte => self.len(),
            Width::Half => self.len() / 2,
        }
    }

    fn outgoing(&self, width: Width, i: usize) -> u16 {
        let tx = self.tx_bytes();
        match width {
            Width::Byte => u16::from(tx[i]),
            Width::Half => u16::from_le_bytes([tx[2 * i], tx[2 * i + 1]]),
        }
    }

    fn store(&mut self, width: Width, i: usize, word: u16) {
        if let Some(rx) = self.rx_bytes() {
            match width {
                Width::Byte => rx[i] = word as u8,
                Width::Half => rx[2 * i..2 * i + 2].copy_from_slice(&word.to_le_bytes()),
            }
        }
    }
}

/// Buffer layout of a word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    /// One byte per word (8 bit words)
    Byte,
    /// Two bytes per word (9..=16 bit words)
    Half,
}

impl Width {
    fn for_bits(bits: u8) -> Self {
        if bits <= 8 {
            Width::Byte
        } else {
            Width::Half
        }
    }

    const fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
        }
    }
}

/// True when the controller holds a received word
pub(crate) fn rx_ready<R: SpiRegisters + ?Sized>(regs: &mut R) -> bool {
    Status::from_bits_truncate(regs.read(Reg::Sr)).contains(Status::RDRF)
}

/// True when TDR can take another word
pub(crate) fn tx_ready<R: SpiRegisters + ?Sized>(regs: &mut R) -> bool {
    Status::from_bits_truncate(regs.read(Reg::Sr)).contains(Status::TDRE)
}

fn wait_rx_ready<R: SpiRegisters + ?Sized>(regs: &mut R, poll: PollBound) -> bool {
    match poll {
        PollBound::Forever => {
            while !rx_ready(regs) {
                core::hint::spin_loop();
            }
            true
        }
        PollBound::Spins(limit) => {
            for _ in 0..limit.max(1) {
                if rx_ready(regs) {
                    return true;
                }
                core::hint::spin_loop();
            }
            false
        }
    }
}

/// Clock one word out and return the word clocked in
///
/// Returns `None` when the poll bound runs out before RDRF is set.
pub(crate) fn exchange_word<R: SpiRegisters + ?Sized>(
    regs: &mut R,
    tx: u16,
    poll: PollBound,
) -> Option<u16> {
    // Drain a stale word so RDRF reflects this transfer only
    let _ = regs.read(Reg::Rdr);

    regs.write(Reg::Tdr, u32::from(tx));

    if !wait_rx_ready(regs, poll) {
        return None;
    }

    Some(regs.read(Reg::Rdr) as u16)
}

/// Run one transfer for a device whose settings are already loaded
///
/// Returns the number of buffer bytes transferred.
pub(crate) fn transfer<H: Hardware + ?Sized>(
    hw: &mut H,
    id: DeviceId,
    device: &mut LogicalDevice,
    poll: PollBound,
    words: &mut Words<'_>,
    terminate: bool,
) -> Result<usize> {
    let width = Width::for_bits(device.bits());
    let count = words.word_count(width);

    debug_assert!(
        width == Width::Byte || words.len() % 2 == 0,
        "odd byte count for {} bit words",
        device.bits()
    );

    match (device.cs_mode(), device.capability()) {
        (CsMode::AlwaysHigh, _) => {
            for i in 0..count {
                clock_word(hw, words, width, i, id, poll)?;
            }
        }

        (cs_mode, Capability::Automatic(_)) => {
            match width {
                Width::Byte => {
                    // A previous terminated transfer may have cleared CSAAT
                    set_csaat(hw, device, cs_mode == CsMode::Frame);
                    for i in 0..count {
                        if terminate && i + 1 == count {
                            set_csaat(hw, device, false);
                        }
                        clock_word(hw, words, width, i, id, poll)?;
                    }
                }
                Width::Half => {
                    for i in 0..count {
                        if terminate && i + 1 == count {
                            hw.write(Reg::Cr, Control::LASTXFER.bits());
                        }
                        clock_word(hw, words, width, i, id, poll)?;
                    }
                }
            }
        }

        (CsMode::Frame, Capability::Gpio) => {
            // Still asserted when continuing an unterminated frame
            if !device.cs_active() {
                device.assert_cs(hw);
            }
            let clocked = (0..count).try_for_each(|i| clock_word(hw, words, width, i, id, poll));
            // A failed word ends the frame
            if terminate || clocked.is_err() {
                device.negate_cs(hw);
            }
            clocked?;
        }

        (CsMode::Toggle, Capability::Gpio) => {
            for i in 0..count {
                device.assert_cs(hw);
                let clocked = clock_word(hw, words, width, i, id, poll);
                device.negate_cs(hw);
                clocked?;
            }
        }
    }

    Ok(count * width.bytes())
}

fn clock_word<R: SpiRegisters + ?Sized>(
    regs: &mut R,
    words: &mut Words<'_>,
    width: Width,
    i: usize,
    id: DeviceId,
    poll: PollBound,
) -> Result<()> {
    let tx = words.outgoing(width, i);
    let rx = exchange_word(regs, tx, poll).ok_or(Error::Timeout { device: id })?;
    log::trace!("spi: {} word {} tx={:#06x} rx={:#06x}", id, i, tx, rx);
    words.store(width, i, rx);
    Ok(())
}

fn set_csaat<R: SpiRegisters + ?Sized>(regs: &mut R, device: &LogicalDevice, hold: bool) {
    let reg = Reg::Csr(device.channel());
    let csr = Csr(regs.read(reg));
    if csr.csaat() != hold {
        regs.write(reg, csr.with_csaat(hold).0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_lengths() {
        let tx = [1u8, 2, 3];
        let mut rx = [0u8; 2];
        assert_eq!(Words::Write(&tx).len(), 3);
        assert_eq!(Words::Duplex(&tx, &mut rx).len(), 2);
        assert!(Words::Write(&[]).is_empty());
    }

    #[test]
    fn test_half_words_are_little_endian_in_buffer() {
        let mut buf = [0x34u8, 0x12, 0x78, 0x56];
        let mut words = Words::Read(&mut buf);
        assert_eq!(words.word_count(Width::Half), 2);
        assert_eq!(words.outgoing(Width::Half, 0), 0x1234);
        assert_eq!(words.outgoing(Width::Half, 1), 0x5678);

        words.store(Width::Half, 1, 0xbeef);
        assert_eq!(buf, [0x34, 0x12, 0xef, 0xbe]);
    }

    #[test]
    fn test_write_discards_received() {
        let tx = [0xaa];
        let mut words = Words::Write(&tx);
        words.store(Width::Byte, 0, 0x55);
        assert_eq!(tx, [0xaa]);
    }

    #[test]
    fn test_width_selection() {
        assert_eq!(Width::for_bits(8), Width::Byte);
        assert_eq!(Width::for_bits(9), Width::Half);
        assert_eq!(Width::for_bits(16), Width::Half);
    }

    struct Stuck {
        status_reads: u32,
    }

    impl SpiRegisters for Stuck {
        fn read(&mut self, reg: Reg) -> u32 {
            if reg == Reg::Sr {
                self.status_reads += 1;
            }
            0
        }

        fn write(&mut self, _reg: Reg, _value: u32) {}
    }

    #[test]
    fn test_bounded_poll_gives_up() {
        let mut regs = Stuck { status_reads: 0 };
        assert_eq!(exchange_word(&mut regs, 0x55, PollBound::Spins(10)), None);
        assert_eq!(regs.status_reads, 10);

        let mut regs = Stuck { status_reads: 0 };
        assert_eq!(exchange_word(&mut regs, 0x55, PollBound::Spins(0)), None);
        assert_eq!(regs.status_reads, 1);
    }
}
