/// Error code registry for Screenpack
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Input errors
/// - 3000-3999: Output errors
/// - 4000-4999: Encoding errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;

    // Input errors (2000-2999)
    pub const INPUT_MISSING: u16 = 2001;
    pub const INPUT_UNREADABLE: u16 = 2002;
    pub const INPUT_MALFORMED: u16 = 2003;

    // Output errors (3000-3999)
    pub const OUTPUT_DIR_UNAVAILABLE: u16 = 3001;
    pub const OUTPUT_WRITE_FAILED: u16 = 3002;
    pub const OUTPUT_VERIFY_FAILED: u16 = 3003;

    // Encoding errors (4000-4999)
    pub const ENCODING_SERIALIZE: u16 = 4001;
    pub const ENCODING_CORRUPT_PACK: u16 = 4002;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1001 => "Configuration file not found",
        1002 => "Failed to parse configuration",
        1003 => "Invalid value in configuration",

        2001 => "Required input file is missing",
        2002 => "Input file could not be read",
        2003 => "Input file does not match the expected structure",

        3001 => "Output directory could not be created",
        3002 => "Artifact write failed",
        3003 => "Written artifacts failed verification",

        4001 => "Serialization failed",
        4002 => "Packed document is corrupt",

        _ => "Unknown error code",
    }
}
