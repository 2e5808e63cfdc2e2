/// Inclusive byte window `[start, end]` over a source of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// A syntactically valid single-range request, before it is checked
/// against the source length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    From { start: u64, end: Option<u64> },
    Suffix(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Bad syntax, non-numeric fields or more than one range.
    Invalid,
    /// Well formed, but no byte of the source falls inside it.
    Unsatisfiable,
}

pub fn parse_range_header(value: &str, size: u64) -> Result<ByteRange, RangeError> {
    parse_range_spec(value)?.resolve(size)
}

pub fn parse_range_spec(value: &str) -> Result<RangeSpec, RangeError> {
    let value = value.trim();
    let range = value.strip_prefix("bytes=").ok_or(RangeError::Invalid)?;
    if range.contains(',') {
        return Err(RangeError::Invalid);
    }

    if let Some(suffix) = range.trim_start().strip_prefix('-') {
        return Ok(RangeSpec::Suffix(parse_position(suffix)?));
    }

    let (start, end) = range.split_once('-').ok_or(RangeError::Invalid)?;
    let start = parse_position(start)?;
    let end = if end.trim().is_empty() {
        None
    } else {
        Some(parse_position(end)?)
    };
    Ok(RangeSpec::From { start, end })
}

impl RangeSpec {
    pub fn resolve(self, size: u64) -> Result<ByteRange, RangeError> {
        if size == 0 {
            return Err(RangeError::Unsatisfiable);
        }
        let last = size - 1;

        match self {
            RangeSpec::Suffix(0) => Err(RangeError::Unsatisfiable),
            RangeSpec::Suffix(len) => Ok(ByteRange {
                start: size.saturating_sub(len),
                end: last,
            }),
            RangeSpec::From { start, .. } if start > last => Err(RangeError::Unsatisfiable),
            RangeSpec::From { start, end } => {
                let end = end.map_or(last, |end| end.min(last));
                if end < start {
                    return Err(RangeError::Unsatisfiable);
                }
                Ok(ByteRange { start, end })
            }
        }
    }
}

/// Digits only. `u64::from_str` alone would also take a leading `+`.
fn parse_position(text: &str) -> Result<u64, RangeError> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Invalid);
    }
    text.parse().map_err(|_| RangeError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::{parse_range_header, parse_range_spec, ByteRange, RangeError, RangeSpec};

    #[test]
    fn parses_open_ended_range() {
        let range = parse_range_header("bytes=0-", 100).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.length(), 100);
    }

    #[test]
    fn parses_closed_range() {
        let range = parse_range_header("bytes=10-19", 100).unwrap();
        assert_eq!(range, ByteRange { start: 10, end: 19 });
        assert_eq!(range.content_range(100), "bytes 10-19/100");
    }

    #[test]
    fn single_byte_ranges() {
        assert_eq!(
            parse_range_header("bytes=0-0", 1).unwrap(),
            ByteRange { start: 0, end: 0 }
        );
        assert_eq!(
            parse_range_header("bytes=99-99", 100).unwrap(),
            ByteRange { start: 99, end: 99 }
        );
    }

    #[test]
    fn clamps_end_overflow() {
        let range = parse_range_header("bytes=90-200", 100).unwrap();
        assert_eq!(range, ByteRange { start: 90, end: 99 });
    }

    #[test]
    fn parses_suffix_range() {
        let range = parse_range_header("bytes=-10", 100).unwrap();
        assert_eq!(range, ByteRange { start: 90, end: 99 });
    }

    #[test]
    fn oversized_suffix_covers_whole_source() {
        assert_eq!(
            parse_range_header("bytes=-100", 100).unwrap(),
            ByteRange { start: 0, end: 99 }
        );
        assert_eq!(
            parse_range_header("bytes=-5000", 100).unwrap(),
            ByteRange { start: 0, end: 99 }
        );
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(
            parse_range_spec("  bytes= 5 - 9 ").unwrap(),
            RangeSpec::From {
                start: 5,
                end: Some(9)
            }
        );
    }

    #[test]
    fn rejects_multiple_ranges() {
        let err = parse_range_header("bytes=0-1,2-3", 100).unwrap_err();
        assert_eq!(err, RangeError::Invalid);
    }

    #[test]
    fn rejects_other_units() {
        assert_eq!(parse_range_spec("items=0-1"), Err(RangeError::Invalid));
        assert_eq!(parse_range_spec("Bytes=0-1"), Err(RangeError::Invalid));
        assert_eq!(parse_range_spec("0-1"), Err(RangeError::Invalid));
    }

    #[test]
    fn rejects_malformed_numbers() {
        for value in [
            "bytes=",
            "bytes=-",
            "bytes=abc-",
            "bytes=1-x",
            "bytes=+1-2",
            "bytes=1.5-2",
            "bytes=--5",
            "bytes=-5-10",
            "bytes=5",
            "bytes=99999999999999999999-",
        ] {
            assert_eq!(parse_range_spec(value), Err(RangeError::Invalid), "{}", value);
        }
    }

    #[test]
    fn rejects_inverted_range() {
        let err = parse_range_header("bytes=10-5", 100).unwrap_err();
        assert_eq!(err, RangeError::Unsatisfiable);
    }

    #[test]
    fn rejects_unsatisfiable() {
        let err = parse_range_header("bytes=100-", 100).unwrap_err();
        assert_eq!(err, RangeError::Unsatisfiable);
        let err = parse_range_header("bytes=100-110", 100).unwrap_err();
        assert_eq!(err, RangeError::Unsatisfiable);
    }

    #[test]
    fn zero_suffix_is_unsatisfiable() {
        assert_eq!(
            parse_range_header("bytes=-0", 100),
            Err(RangeError::Unsatisfiable)
        );
    }

    #[test]
    fn empty_source_is_unsatisfiable() {
        assert_eq!(parse_range_header("bytes=0-", 0), Err(RangeError::Unsatisfiable));
        assert_eq!(parse_range_header("bytes=-1", 0), Err(RangeError::Unsatisfiable));
        // syntax is still checked first
        assert_eq!(parse_range_header("bytes=0-1,2-3", 0), Err(RangeError::Invalid));
    }
}
