use std::io;
use thiserror::Error;

/// Error types for MD3 model, animation config and skin processing
#[derive(Error, Debug)]
pub enum Md3Error {
    /// I/O error other than running out of input
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// The input ended before a record was complete
    #[error("Truncated input: unexpected end of data")]
    TruncatedInput,

    /// The file does not start with the IDP3 identifier
    #[error("Invalid magic: expected '{expected}', got '{actual}'")]
    BadMagic { expected: String, actual: String },

    /// A mesh inside the file does not start with the IDP3 identifier
    #[error("Invalid magic in mesh {mesh}: got '{actual}'")]
    BadMeshMagic { mesh: usize, actual: String },

    /// Version or size fields of the file header are inconsistent
    #[error("Corrupt header: {0}")]
    BadHeader(String),

    /// Offsets or counts of a mesh header are inconsistent
    #[error("Corrupt mesh header: {0}")]
    BadMeshHeader(String),

    /// No unread section starts at the current position
    #[error("Corrupt section layout: no section starts at byte {offset}")]
    CorruptSectionLayout { offset: i64 },

    /// No unread mesh section starts at the current position
    #[error("Corrupt layout in mesh {mesh}: no section starts at mesh byte {offset}")]
    CorruptMeshLayout { mesh: usize, offset: i64 },

    /// An animation line of an animation.cfg could not be decoded
    #[error("Corrupt animation line {line}: {reason}")]
    CorruptAnimationLine { line: usize, reason: String },

    /// A header directive of an animation.cfg has an unusable argument
    #[error("Invalid directive '{directive}' on line {line}")]
    InvalidDirective { line: usize, directive: String },

    /// Texture loaders only handle 24 and 32 bit color maps
    #[error("Unsupported color map depth: {0} bits")]
    UnsupportedColorMapDepth(u8),

    /// The node id does not refer to a live scene node
    #[error("Unknown scene node: {0}")]
    UnknownNode(usize),

    /// The tag index is not valid for the parent model
    #[error("Tag index {index} out of range (model has {count} tags)")]
    TagIndexOutOfRange { index: usize, count: usize },

    /// The frame index is not valid for the model
    #[error("Frame {frame} out of range (model has {count} frames)")]
    FrameOutOfRange { frame: usize, count: usize },

    /// A texture could not be loaded
    #[error("Texture error: {0}")]
    Texture(String),
}

impl From<io::Error> for Md3Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::TruncatedInput
        } else {
            Self::Io(err)
        }
    }
}

/// Result type using Md3Error
pub type Result<T> = std::result::Result<T, Md3Error>;
