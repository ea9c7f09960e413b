/// Formatting helpers for reports — byte counts, offsets and byte values.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the display-formatting boundary.

/// Format a byte count into a human-readable string with a binary unit.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KiB", b / KB)
    } else if b < GB {
        format!("{:.1} MiB", b / MB)
    } else {
        format!("{:.2} GiB", b / GB)
    }
}

/// Format a count with thousand separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a damage offset as `0x`-prefixed hex, zero-padded to 8 digits.
///
/// Negative offsets (32-bit legacy wrap) keep their sign.
pub fn format_offset(offset: i64) -> String {
    if offset < 0 {
        format!("-0x{:08X}", offset.unsigned_abs())
    } else {
        format!("0x{offset:08X}")
    }
}

/// Format a byte as hex plus its printable ASCII form, e.g. `0x41 'A'`.
pub fn format_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("0x{byte:02X} '{}'", byte as char)
    } else {
        format!("0x{byte:02X}")
    }
}
