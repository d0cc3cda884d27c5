use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type covering every failure this library can return.
///
/// Two broad classes exist: malformed-input conditions that a lenient caller
/// may tolerate ([`Error::Malformed`], [`Error::OutOfBounds`]) and structural
/// violations that are always fatal to the operation that raised them
/// ([`Error::InvalidSign`], [`Error::ZeroDivisor`], [`Error::UnknownTable`]).
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// The error carries the source location where the malformation was
    /// detected, and the message names the table/column/offset context
    /// where one applies.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the input.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A big-integer sign outside {-1, 0, 1}, or a non-zero sign paired
    /// with a zero magnitude.
    #[error("Invalid big-integer sign - {0}")]
    InvalidSign(i8),

    /// Division by a zero-length divisor was attempted.
    #[error("Division by zero")]
    ZeroDivisor,

    /// A table tag outside the range of known metadata tables.
    #[error("Unknown metadata table - {0:#04x}")]
    UnknownTable(u8),

    /// A value too large for the compressed integer wire format.
    #[error("Value can not be represented as a compressed integer - {0:#x}")]
    CompressedOverflow(u32),
}
