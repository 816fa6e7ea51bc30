use anyhow::Result;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io::{self, Write};

/// JSON formatter producing the layout the consuming process already parses:
/// `", "` and `": "` separators, everything outside printable ASCII escaped as `\uXXXX`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompatFormatter;

impl Formatter for CompatFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (index, c) in fragment.char_indices() {
            if (c as u32) < 0x7f {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize a record to a single line of JSON
pub fn to_line<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, CompatFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Print a record as one line on stdout
pub fn print_to_console<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let line = to_line(value)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", line)?;
    handle.flush()?;
    Ok(())
}

/// The minimal object printed when the invocation itself is unusable
pub fn fatal_error(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}
