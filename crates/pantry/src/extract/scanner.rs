//! Byte-level state machine that finds top-level object boundaries.
//!
//! Works directly on bytes: every structural character (`{`, `}`, `"`, `\`)
//! is ASCII and can never appear inside a multi-byte UTF-8 sequence, so no
//! decoding is needed before scanning.

/// Lexical context of the scanner, independent of nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Outside any string literal; braces are structural.
    Structural,
    /// Inside a string literal; braces are plain text.
    InString,
    /// The previous byte was a backslash. The next byte is taken literally,
    /// then scanning resumes in the wrapped context.
    Escaped(Context),
}

/// Context an escape sequence returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Structural,
    InString,
}

impl Context {
    fn resume(self) -> ScanState {
        match self {
            Context::Structural => ScanState::Structural,
            Context::InString => ScanState::InString,
        }
    }
}

/// What a single byte means to the depth tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Ordinary content.
    Literal,
    /// A structural `{`.
    Open,
    /// A structural `}`.
    Close,
}

/// Pure transition function: next lexical state and the token for `byte`.
pub fn transition(state: ScanState, byte: u8) -> (ScanState, Token) {
    match state {
        ScanState::Escaped(context) => (context.resume(), Token::Literal),
        ScanState::Structural => match byte {
            b'\\' => (ScanState::Escaped(Context::Structural), Token::Literal),
            b'"' => (ScanState::InString, Token::Literal),
            b'{' => (ScanState::Structural, Token::Open),
            b'}' => (ScanState::Structural, Token::Close),
            _ => (ScanState::Structural, Token::Literal),
        },
        ScanState::InString => match byte {
            b'\\' => (ScanState::Escaped(Context::InString), Token::Literal),
            b'"' => (ScanState::Structural, Token::Literal),
            _ => (ScanState::InString, Token::Literal),
        },
    }
}

/// Tracks nesting depth and captures the bytes of the object being read.
///
/// Only one in-progress object is ever buffered.
#[derive(Debug)]
pub struct ObjectScanner {
    state: ScanState,
    depth: usize,
    capture: Vec<u8>,
}

impl Default for ObjectScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Structural,
            depth: 0,
            capture: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True while bytes are being captured into a candidate object.
    pub fn is_capturing(&self) -> bool {
        self.depth > 0
    }

    /// Number of bytes held for the in-progress object.
    pub fn buffered(&self) -> usize {
        self.capture.len()
    }

    /// Feeds one byte. Returns the bytes of a complete top-level object
    /// when this byte closes one.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        let (next, token) = transition(self.state, byte);
        self.state = next;

        match token {
            Token::Literal => {
                if self.is_capturing() {
                    self.capture.push(byte);
                }
                None
            }
            Token::Open => {
                if self.depth == 0 {
                    self.capture.clear();
                }
                self.capture.push(byte);
                self.depth += 1;
                None
            }
            Token::Close => {
                // A stray `}` between objects is ignored; depth never goes negative.
                if self.depth == 0 {
                    return None;
                }
                self.capture.push(byte);
                self.depth -= 1;
                if self.depth == 0 {
                    Some(std::mem::take(&mut self.capture))
                } else {
                    None
                }
            }
        }
    }
}
