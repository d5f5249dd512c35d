const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// A MIDI message as delivered by an input.
///
/// The bytes are opaque: they are neither parsed nor validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Msg<'a> {
    /// Device supplied timestamp, `None` when unspecified.
    pub ts: Option<u64>,
    pub bytes: &'a [u8],
}

impl<'a> Msg<'a> {
    pub fn new(ts: Option<u64>, bytes: &'a [u8]) -> Self {
        Msg { ts, bytes }
    }
}

/// Renders a log line: `prefix`, then each byte as two uppercase hex digits
/// separated by single spaces, then a new line.
pub fn render(prefix: &str, bytes: &[u8]) -> String {
    let mut line = String::with_capacity(prefix.len() + 3 * bytes.len() + 1);
    line.push_str(prefix);

    for (idx, byte) in bytes.iter().enumerate() {
        if idx > 0 {
            line.push(' ');
        }
        line.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        line.push(HEX_DIGITS[(byte & 0xF) as usize] as char);
    }

    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_without_prefix() {
        assert_eq!(render("", &[0x90, 0x3C, 0x40]), "90 3C 40\n");
    }

    #[test]
    fn single_byte_with_prefix() {
        assert_eq!(render(">>> ", &[0xFF]), ">>> FF\n");
        assert_eq!(render("<<< ", &[0x0A]), "<<< 0A\n");
    }

    #[test]
    fn every_byte_is_two_uppercase_digits() {
        let bytes: Vec<u8> = (0..=u8::MAX).collect();
        let line = render("", &bytes);

        let expected = bytes
            .iter()
            .map(|byte| format!("{:02X}", byte))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(line, format!("{}\n", expected));
    }

    #[test]
    fn sysex_is_dumped_as_is() {
        let sysex = [0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];
        assert_eq!(render(">>> ", &sysex), ">>> F0 7E 7F 06 01 F7\n");
    }

    #[test]
    fn empty_message_is_only_prefix() {
        assert_eq!(render("<<< ", &[]), "<<< \n");
    }
}
