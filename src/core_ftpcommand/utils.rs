use crate::core_error::FtpError;

/// Destination and declared length of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorRequest {
    pub filename: String,
    pub size: u64,
}

/// Parses the STOR argument `<anything>/<filename><<size>>`.
///
/// Only the part after the last `/` names the file; it is always created in the
/// session's working directory.
pub fn parse_stor_argument(arg: &str) -> Result<StorRequest, FtpError> {
    let invalid = || FtpError::InvalidStorArgument(arg.to_string());

    let open = arg.find('<').ok_or_else(invalid)?;
    let close = arg.find('>').ok_or_else(invalid)?;
    let slash = arg[..open].rfind('/').ok_or_else(invalid)?;
    if close < open {
        return Err(invalid());
    }

    let filename = &arg[slash + 1..open];
    if filename.is_empty() {
        return Err(invalid());
    }
    let size = arg[open + 1..close].trim().parse().map_err(|_| invalid())?;

    Ok(StorRequest {
        filename: filename.to_string(),
        size,
    })
}

/// Leading decimal digits of the REST argument, `0` when there are none.
pub fn parse_rest_offset(arg: &str) -> u64 {
    let arg = arg.trim_start();
    let digits = arg
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(arg, |(end, _)| &arg[..end]);
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stor_argument() {
        let request = parse_stor_argument("/incoming/a.txt<5>").unwrap();
        assert_eq!(request.filename, "a.txt");
        assert_eq!(request.size, 5);

        let request = parse_stor_argument("C:/Users/me/photo.jpg<1048576>").unwrap();
        assert_eq!(request.filename, "photo.jpg");
        assert_eq!(request.size, 1_048_576);
    }

    #[test]
    fn test_parse_stor_argument_rejects_malformed() {
        for arg in [
            "a.txt<5>",
            "/incoming/a.txt",
            "/incoming/a.txt<5",
            "/incoming/a.txt>5<",
            "/incoming/<5>",
            "/incoming/a.txt<five>",
            "/incoming/a.txt<-1>",
        ] {
            assert!(
                matches!(parse_stor_argument(arg), Err(FtpError::InvalidStorArgument(_))),
                "{:?} should be rejected",
                arg
            );
        }
    }

    #[test]
    fn test_parse_rest_offset() {
        assert_eq!(parse_rest_offset("100"), 100);
        assert_eq!(parse_rest_offset(" 42"), 42);
        assert_eq!(parse_rest_offset("12abc"), 12);
        assert_eq!(parse_rest_offset("abc"), 0);
        assert_eq!(parse_rest_offset(""), 0);
        assert_eq!(parse_rest_offset("-5"), 0);
        assert_eq!(parse_rest_offset("99999999999999999999999"), 0);
    }
}
