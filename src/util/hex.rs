//! Hex formatting helpers used for logging and diagnostics.
//!
//! Encoding/decoding of whole packets goes through the `hex` crate directly
//! ([`crate::packet::Packet::hex_string`]); this module only covers the
//! debug-dump formats used in log lines.

/// Format bytes for compact log lines, e.g. `"80 e3 29 00 10 6f"`.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pretty-print a hex dump with offsets and an ASCII gutter, similar to `hexdump -C`.
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    if data.is_empty() {
        return String::new();
    }

    let mut result = String::new();
    let num_chunks = data.chunks(bytes_per_line).count();

    for (i, chunk) in data.chunks(bytes_per_line).enumerate() {
        result.push_str(&format!("{:04x}: ", i * bytes_per_line));

        for (j, byte) in chunk.iter().enumerate() {
            result.push_str(&format!("{byte:02x}"));
            if j % 2 == 1 {
                result.push(' ');
            }
        }

        if chunk.len() < bytes_per_line {
            let missing = bytes_per_line - chunk.len();
            for _ in 0..missing {
                result.push_str("  ");
                if (chunk.len() + 1) % 2 == 0 {
                    result.push(' ');
                }
            }
        }

        result.push_str(" |");
        for &byte in chunk {
            if byte.is_ascii_graphic() || byte == b' ' {
                result.push(byte as char);
            } else {
                result.push('.');
            }
        }
        result.push('|');

        if i < num_chunks - 1 {
            result.push('\n');
        }
    }

    result
}
