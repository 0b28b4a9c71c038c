//! IMU line protocol
//!
//! The IMU board prints one ASCII line per reading:
//!
//! ```text
//! IMU,<ax>,<ay>,<az>,<gx>,<gy>,<gz>\n
//! ```
//!
//! Accel in m/s², gyro in rad/s. Anything else on the link (boot banners,
//! debug prints, half-written lines) is ignored.

use crate::core::types::Sample;

/// Tag that starts every sample line
pub const LINE_TAG: &str = "IMU";

/// Tag plus three accel and three gyro fields
pub const FIELD_COUNT: usize = 7;

/// Lines longer than this are noise, not samples
pub const MAX_LINE_LEN: usize = 256;

/// Parse one line (without its terminator) into a sample
///
/// Returns `None` for anything that is not exactly the 7-field tagged form
/// with every value a finite number.
pub fn parse_line(line: &str) -> Option<Sample> {
    let line = line.trim();
    let mut fields = line.split(',');

    // Tag must be immediately followed by the comma
    if fields.next()? != LINE_TAG {
        return None;
    }

    let mut values = [0.0f64; FIELD_COUNT - 1];
    for value in values.iter_mut() {
        *value = fields.next()?.trim().parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
    }

    if fields.next().is_some() {
        return None;
    }

    Some(Sample::new(
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
    ))
}

/// Render a sample the way the IMU board prints it (no terminator)
pub fn format_line(sample: &Sample) -> String {
    format!(
        "{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
        LINE_TAG,
        sample.accel[0],
        sample.accel[1],
        sample.accel[2],
        sample.gyro[0],
        sample.gyro[1],
        sample.gyro[2]
    )
}

/// Splits a byte stream into lines
///
/// Partial reads are buffered until a `\n` arrives. A line that grows past
/// [`MAX_LINE_LEN`] without a terminator is dropped along with everything up
/// to the next `\n`.
#[derive(Debug, Default)]
pub struct LineReader {
    buffer: Vec<u8>,
    overflowed: bool,
    dropped: u64,
}

impl LineReader {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
            overflowed: false,
            dropped: 0,
        }
    }

    /// Feed raw bytes, calling `on_line` for each complete line
    pub fn feed<F>(&mut self, data: &[u8], mut on_line: F)
    where
        F: FnMut(&str),
    {
        for &byte in data {
            if byte == b'\n' {
                if self.overflowed {
                    self.overflowed = false;
                } else {
                    match std::str::from_utf8(&self.buffer) {
                        Ok(line) => on_line(line),
                        Err(_) => self.dropped += 1,
                    }
                }
                self.buffer.clear();
                continue;
            }

            if self.overflowed {
                continue;
            }
            if self.buffer.len() >= MAX_LINE_LEN {
                log::trace!("Dropping oversized line ({} bytes)", self.buffer.len());
                self.buffer.clear();
                self.overflowed = true;
                self.dropped += 1;
                continue;
            }
            self.buffer.push(byte);
        }
    }

    /// Lines discarded for length or invalid UTF-8
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let sample = parse_line("IMU,0.12,-0.05,9.79,0.01,0.00,-0.02").unwrap();
        assert_eq!(sample.accel, [0.12, -0.05, 9.79]);
        assert_eq!(sample.gyro, [0.01, 0.0, -0.02]);
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_cr() {
        let sample = parse_line(" IMU, 1.0 ,2,3,4,5,6\r").unwrap();
        assert_eq!(sample.accel, [1.0, 2.0, 3.0]);
        assert_eq!(sample.gyro, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_parse_rejects_padded_tag() {
        assert!(parse_line(" IMU ,1,2,3,4,5,6").is_none());
        assert!(parse_line("IMU\t,1,2,3,4,5,6").is_none());
        assert!(parse_line("imu,1,2,3,4,5,6").is_none());
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let rejected = [
            "",
            "IMU",
            "IMU,1,2,3,4,5",
            "IMU,1,2,3,4,5,6,7",
            "IMU,1,2,x,4,5,6",
            "IMU,1,2,,4,5,6",
            "ACC,1,2,3,4,5,6",
            "imu,1,2,3,4,5,6",
            "IMUX,1,2,3,4,5,6",
            "IMU,1,2,3,4,5,NaN",
            "IMU,inf,2,3,4,5,6",
            "Motor: started",
        ];
        for line in rejected {
            assert!(parse_line(line).is_none(), "accepted {:?}", line);
        }
    }

    #[test]
    fn test_format_matches_firmware_output() {
        let sample = Sample::new([0.0, -9.80665, 0.126], [0.0, 0.0, 1.0]);
        assert_eq!(format_line(&sample), "IMU,0.00,-9.81,0.13,0.00,0.00,1.00");
        assert!(parse_line(&format_line(&sample)).is_some());
    }

    #[test]
    fn test_line_reader_reassembles_split_lines() {
        let mut reader = LineReader::new();
        let mut lines = Vec::new();

        reader.feed(b"IMU,1,2,", |l| lines.push(l.to_string()));
        assert!(lines.is_empty());
        reader.feed(b"3,4,5,6\nboot ok\nIMU", |l| lines.push(l.to_string()));
        assert_eq!(lines, vec!["IMU,1,2,3,4,5,6", "boot ok"]);
    }

    #[test]
    fn test_line_reader_drops_oversized_line() {
        let mut reader = LineReader::new();
        let mut lines = Vec::new();

        let noise = vec![b'x'; MAX_LINE_LEN * 2];
        reader.feed(&noise, |l| lines.push(l.to_string()));
        reader.feed(b"tail\nIMU,1,2,3,4,5,6\n", |l| lines.push(l.to_string()));

        assert_eq!(lines, vec!["IMU,1,2,3,4,5,6"]);
        assert_eq!(reader.dropped(), 1);
    }

    #[test]
    fn test_line_reader_drops_invalid_utf8() {
        let mut reader = LineReader::new();
        let mut lines = Vec::new();

        reader.feed(b"\xff\xfe\nok\n", |l| lines.push(l.to_string()));
        assert_eq!(lines, vec!["ok"]);
        assert_eq!(reader.dropped(), 1);
    }
}
