//! Helpers for building and displaying block contents

use std::io::{self, Write};

/// Bytes per row in [`hex_dump`]
const HEX_ROW: usize = 16;

/// Fill `block` with repeated copies of `pattern`. The last copy is cut short
/// when the block runs out. An empty pattern leaves the block unchanged.
pub fn fill_block(block: &mut [u8], pattern: &[u8]) {
    if pattern.is_empty() {
        return;
    }
    for chunk in block.chunks_mut(pattern.len()) {
        chunk.copy_from_slice(&pattern[..chunk.len()]);
    }
}

/// A freshly allocated block of `block_size` bytes filled with `pattern`
pub fn filled_block(block_size: usize, pattern: &[u8]) -> Vec<u8> {
    let mut block = vec![0u8; block_size];
    fill_block(&mut block, pattern);
    block
}

/// Write the raw block bytes with no conversion
pub fn dump_block<W: Write>(writer: &mut W, block: &[u8]) -> io::Result<()> {
    writer.write_all(block)
}

/// Write the block as rows of offset, hex bytes and printable ASCII
pub fn hex_dump<W: Write>(writer: &mut W, block: &[u8]) -> io::Result<()> {
    for (row, chunk) in block.chunks(HEX_ROW).enumerate() {
        write!(writer, "{:08x}:", row * HEX_ROW)?;
        for byte in chunk {
            write!(writer, " {:02x}", byte)?;
        }
        for _ in chunk.len()..HEX_ROW {
            write!(writer, "   ")?;
        }
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        writeln!(writer, "  |{}|", ascii)?;
    }
    Ok(())
}
