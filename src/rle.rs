//! RLE pattern codec.
//!
//! Decoding streams line by line into a fixed `size x size` [`Grid`]; the
//! header's `x`/`y` are parsed but never used for sizing, so a pattern that
//! does not fit fails with [`LifeError::PatternExceedsBounds`] instead of being
//! clipped. Encoding is the inverse for any grid whose rows below the last
//! alive row are dead.
//!
//! See <https://golly.sourceforge.io/Help/formats.html#rle> for the format.

use crate::{Grid, LifeError, Result, RuleSet};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::info;

/// Encoded body lines are wrapped at this width. Run tokens are never split.
pub const LINE_WIDTH: usize = 70;

/// Digits in `usize::MAX`; a longer run count can never parse.
const MAX_COUNT_DIGITS: usize = usize::MAX.ilog10() as usize + 1;

/// On-disk representations of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFormat {
    /// Plain-text RLE.
    Rle,
    /// Gzip-compressed RLE, as produced by `gzip pattern.rle`.
    CompressedRle,
}

impl PatternFormat {
    /// Picks the format from the file name: `.gz` means compressed.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension() {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Self::CompressedRle,
            _ => Self::Rle,
        }
    }
}

/// Parsed `x = <W>, y = <H>[, rule = <rule>]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub width: usize,
    pub height: usize,
    /// B3/S23 when the header has no rule clause.
    pub rule: RuleSet,
}

impl Header {
    /// Parses a header line.
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::InvalidHeaderFormat`] if `x` and `y` are not the first
    /// two clauses or are not non-negative integers, or if a third clause is
    /// present and is not `rule`. A malformed rule value yields
    /// [`LifeError::InvalidRuleFormat`].
    pub fn parse(line: &[u8]) -> Result<Self> {
        fn value_of<'a>(part: Option<&'a [u8]>, expected_key: &[u8]) -> Option<&'a str> {
            let part = part?;
            let i = part.iter().position(|&b| b == b'=')?;
            if part[..i].trim_ascii() != expected_key {
                return None;
            }
            std::str::from_utf8(part[i + 1..].trim_ascii()).ok()
        }

        fn number(value: Option<&str>) -> Option<usize> {
            let value = value?;
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            value.parse().ok()
        }

        let invalid = || LifeError::InvalidHeaderFormat(String::from_utf8_lossy(line).into_owned());
        let mut parts = line.split(|&b| b == b',').map(|x| x.trim_ascii());

        let width = number(value_of(parts.next(), b"x")).ok_or_else(invalid)?;
        let height = number(value_of(parts.next(), b"y")).ok_or_else(invalid)?;
        // rule is optional; anything after it is ignored
        let rule = match parts.next() {
            Some(part) => {
                let value = value_of(Some(part), b"rule").ok_or_else(invalid)?;
                RuleSet::parse(value.split_ascii_whitespace().next().unwrap_or(""))?
            }
            None => RuleSet::conway(),
        };

        Ok(Self {
            width,
            height,
            rule,
        })
    }
}

/// Incremental decoder for the body of an RLE pattern.
///
/// Bytes can be fed in arbitrary pieces; a run count split across two
/// [`feed`](Self::feed) calls is still read as one number. Unrecognized bytes,
/// including whitespace and line breaks, are skipped.
pub struct RleDecoder {
    grid: Grid,
    x: usize,
    y: usize,
    /// Digits of a run count not yet consumed by a token.
    pending: String,
    finished: bool,
}

impl RleDecoder {
    /// Starts decoding into an all-dead `size x size` grid.
    pub fn new(size: usize) -> Self {
        Self {
            grid: Grid::new(size),
            x: 0,
            y: 0,
            pending: String::new(),
            finished: false,
        }
    }

    /// Consumes `data`. Returns `Ok(true)` once the `!` terminator has been
    /// seen; everything after it, in this call or later ones, is ignored.
    pub fn feed(&mut self, data: &[u8]) -> Result<bool> {
        if self.finished {
            return Ok(true);
        }
        for &b in data {
            match b {
                b'0'..=b'9' => {
                    self.pending.push(b as char);
                    if self.pending.len() > MAX_COUNT_DIGITS {
                        return Err(LifeError::InvalidNumericToken(self.pending.clone()));
                    }
                }
                b'b' => {
                    let count = self.take_count()?;
                    self.run(count, false)?;
                }
                b'o' => {
                    let count = self.take_count()?;
                    self.run(count, true)?;
                }
                b'$' => {
                    let count = self.take_count()?;
                    self.y = self.y.saturating_add(count);
                    self.x = 0;
                }
                b'!' => {
                    self.finished = true;
                    return Ok(true);
                }
                _ => {}
            }
        }
        Ok(false)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The grid as decoded so far.
    pub fn finish(self) -> Grid {
        self.grid
    }

    fn take_count(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(1);
        }
        let count = self
            .pending
            .parse()
            .map_err(|_| LifeError::InvalidNumericToken(self.pending.clone()))?;
        self.pending.clear();
        Ok(count)
    }

    fn run(&mut self, count: usize, alive: bool) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let size = self.grid.size();
        let end = self.x.checked_add(count).filter(|&end| end <= size);
        let Some(end) = end.filter(|_| self.y < size) else {
            return Err(LifeError::PatternExceedsBounds {
                x: if self.y < size { size } else { self.x },
                y: self.y,
                size,
            });
        };
        if alive {
            for x in self.x..end {
                self.grid.set(x, self.y, true);
            }
        }
        self.x = end;
        Ok(())
    }
}

/// Decodes a pattern from `reader` into a `size x size` grid.
///
/// `#` lines are comments and are skipped wherever they appear. The first
/// other non-blank line is the header; the remaining lines are the body.
/// Reading stops at `!`.
///
/// # Errors
///
/// Any [`LifeError`] from the header or body, or [`LifeError::Io`] from
/// `reader`. Nothing is returned on failure, so a half-decoded board is never
/// observable.
pub fn decode_from(mut reader: impl BufRead, size: usize) -> Result<(Grid, RuleSet)> {
    let mut header = None;
    let mut decoder = RleDecoder::new(size);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let s = line.strip_suffix(b"\n").unwrap_or(&line[..]);
        let s = s.strip_suffix(b"\r").unwrap_or(s);
        if s.starts_with(b"#") {
            continue;
        }
        if header.is_none() {
            if !s.trim_ascii().is_empty() {
                header = Some(Header::parse(s)?);
            }
            continue;
        }
        if decoder.feed(s)? {
            break;
        }
    }

    let header =
        header.ok_or_else(|| LifeError::InvalidHeaderFormat("missing header".to_string()))?;
    Ok((decoder.finish(), header.rule))
}

/// Decodes an in-memory RLE pattern. See [`decode_from`].
pub fn decode(data: &[u8], size: usize) -> Result<(Grid, RuleSet)> {
    decode_from(data, size)
}

/// Accumulates body tokens, wrapping before a token would pass [`LINE_WIDTH`].
struct BodyWriter {
    out: String,
    line_length: usize,
}

impl BodyWriter {
    fn push(&mut self, token: &str) {
        if self.line_length > 0 && self.line_length + token.len() > LINE_WIDTH {
            self.out.push('\n');
            self.line_length = 0;
        }
        self.out.push_str(token);
        self.line_length += token.len();
    }

    fn push_run(&mut self, count: usize, alive: bool) {
        let tag = if alive { 'o' } else { 'b' };
        if count > 1 {
            self.push(&format!("{}{}", count, tag));
        } else {
            self.push(tag.encode_utf8(&mut [0; 4]));
        }
    }
}

/// Encodes `grid` and `rule` as RLE text.
///
/// The header declares the full grid size. Rows after the last alive row are
/// omitted, as are dead runs at the end of a row; every emitted row ends with
/// `$` and the body ends with `!`. An all-dead grid encodes as a single `$!`.
pub fn encode(grid: &Grid, rule: &RuleSet) -> String {
    let size = grid.size();
    let mut writer = BodyWriter {
        out: format!("x = {}, y = {}, rule = {}\n\n", size, size, rule),
        line_length: 0,
    };

    let rows = if size == 0 {
        0
    } else {
        grid.last_alive_row().unwrap_or(0) + 1
    };
    for y in 0..rows {
        let row = grid.row(y);
        let mut x = 0;
        while x < size {
            let state = row[x];
            let run_length = row[x..].iter().take_while(|&&c| c == state).count();
            x += run_length;
            if state != 0 || x < size {
                writer.push_run(run_length, state != 0);
            }
        }
        writer.push("$");
    }
    writer.push("!");

    writer.out
}

/// Decodes `data` stored in `format`.
pub fn from_format(format: PatternFormat, data: &[u8], size: usize) -> Result<(Grid, RuleSet)> {
    match format {
        PatternFormat::Rle => decode(data, size),
        PatternFormat::CompressedRle => decode_from(BufReader::new(GzDecoder::new(data)), size),
    }
}

/// Encodes `grid` and `rule` in `format`.
pub fn to_format(format: PatternFormat, grid: &Grid, rule: &RuleSet) -> Result<Vec<u8>> {
    let text = encode(grid, rule);
    match format {
        PatternFormat::Rle => Ok(text.into_bytes()),
        PatternFormat::CompressedRle => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text.as_bytes())?;
            Ok(encoder.finish()?)
        }
    }
}

/// Loads the pattern at `path` into a `size x size` grid, choosing the format
/// from the file name.
pub fn load(path: impl AsRef<Path>, size: usize) -> Result<(Grid, RuleSet)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let (grid, rule) = match PatternFormat::from_path(path) {
        PatternFormat::Rle => decode_from(BufReader::new(file), size)?,
        PatternFormat::CompressedRle => decode_from(BufReader::new(GzDecoder::new(file)), size)?,
    };
    info!(
        path = %path.display(),
        size,
        rule = %rule,
        population = grid.population(),
        "loaded pattern"
    );
    Ok((grid, rule))
}

/// Saves `grid` and `rule` to `path`, choosing the format from the file name.
pub fn save(path: impl AsRef<Path>, grid: &Grid, rule: &RuleSet) -> Result<()> {
    let path = path.as_ref();
    let data = to_format(PatternFormat::from_path(path), grid, rule)?;
    std::fs::write(path, data)?;
    info!(path = %path.display(), rule = %rule, "saved pattern");
    Ok(())
}
