//! Auto-growing output buffer with JSON emit helpers.

/// A byte buffer writer that grows automatically as needed.
///
/// Besides the raw byte operations it tracks two counters, [`Writer::size`]
/// and [`Writer::flushed`]. A conditional writer snapshots both before
/// emitting a property; if neither moved afterwards the property was
/// skipped and no separator is owed.
///
/// # Example
///
/// ```
/// use json_bind_buffers::Writer;
///
/// let mut writer = Writer::with_alloc_size(16);
/// writer.u8(b'[');
/// writer.write_i64(-12);
/// writer.u8(b',');
/// writer.write_str("a\"b");
/// writer.u8(b']');
/// assert_eq!(writer.flush(), br#"[-12,"a\"b"]"#);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Position where last flush happened.
    pub x0: usize,
    /// Current cursor position.
    pub x: usize,
    /// Total bytes handed out by [`Writer::flush`].
    flushed: u64,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with default allocation size (64KB).
    pub fn new() -> Self {
        Self::with_alloc_size(64 * 1024)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let alloc_size = alloc_size.max(1);
        Self {
            uint8: vec![0u8; alloc_size],
            x0: 0,
            x: 0,
            flushed: 0,
            alloc_size,
        }
    }

    /// Ensures the buffer has at least `capacity` bytes available.
    fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining < capacity {
            let total = self.uint8.len() - self.x0;
            let required = capacity - remaining;
            let total_required = total + required;
            let new_size = if total_required <= self.alloc_size {
                self.alloc_size
            } else {
                total_required * 2
            };
            self.grow(new_size);
        }
    }

    fn grow(&mut self, new_size: usize) {
        let x0 = self.x0;
        let x = self.x;
        let mut new_buf = vec![0u8; new_size];
        new_buf[..x - x0].copy_from_slice(&self.uint8[x0..x]);
        self.uint8 = new_buf;
        self.x = x - x0;
        self.x0 = 0;
    }

    /// Bytes written since the last flush.
    #[inline]
    pub fn size(&self) -> usize {
        self.x - self.x0
    }

    /// Bytes handed out by all previous flushes.
    #[inline]
    pub fn flushed(&self) -> u64 {
        self.flushed
    }

    /// Snapshot of both counters, for "did anything get written" checks.
    #[inline]
    pub fn mark(&self) -> (usize, u64) {
        (self.size(), self.flushed)
    }

    /// Overwrites the last unflushed byte. Used to turn a trailing `,` into
    /// the closing delimiter. Appends instead when nothing is buffered.
    pub fn replace_last(&mut self, byte: u8) {
        if self.x > self.x0 {
            self.uint8[self.x - 1] = byte;
        } else {
            self.u8(byte);
        }
    }

    /// Returns the written data and advances the flush position.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..self.x].to_vec();
        self.flushed += (self.x - self.x0) as u64;
        self.x0 = self.x;
        result
    }

    /// Writes a single byte.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, data: &[u8]) {
        let len = data.len();
        self.ensure_capacity(len);
        self.uint8[self.x..self.x + len].copy_from_slice(data);
        self.x += len;
    }

    /// Writes an ASCII string verbatim.
    fn ascii(&mut self, s: &str) {
        self.buf(s.as_bytes());
    }

    // ---------------------------------------------------------------- JSON

    pub fn write_null(&mut self) {
        self.buf(b"null");
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf(if value { b"true" } else { b"false" });
    }

    pub fn write_i64(&mut self, value: i64) {
        self.ascii(&value.to_string());
    }

    /// NaN is written as `null` and infinities as `±1e308`. Finite values
    /// always carry a fraction or exponent, so `2.0` stays a float when
    /// read back without a static type.
    pub fn write_f64(&mut self, value: f64) {
        self.ascii(&format_float(value));
    }

    /// Writes a quoted, escaped JSON string.
    pub fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len();

        // Fast path: printable ASCII, no quotes or backslash
        if len < 256 && bytes.iter().all(|&b| (32..=126).contains(&b) && b != b'"' && b != b'\\') {
            self.ensure_capacity(len + 2);
            let x = self.x;
            self.uint8[x] = b'"';
            self.uint8[x + 1..x + 1 + len].copy_from_slice(bytes);
            self.uint8[x + 1 + len] = b'"';
            self.x = x + 2 + len;
            return;
        }

        let json_str = serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
        self.buf(json_str.as_bytes());
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "null".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "1e308".to_string()
        } else {
            "-1e308".to_string()
        }
    } else {
        format!("{f:?}")
    }
}
