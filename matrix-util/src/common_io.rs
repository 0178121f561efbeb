use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

///
/// Open a file for reading, and return a buffered reader
/// * `input_file` - file name--either gzipped or not
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    // take a look at the extension
    // return buffered reader accordingly
    let ext = Path::new(input_file).extension().and_then(|x| x.to_str());
    let file = File::open(input_file)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", input_file, e))?;
    match ext {
        Some("gz") => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

///
/// Open a file for writing, and return a buffered writer
/// * `output_file` - file name--either gzipped or not
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    // we can simply override with stdout
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }

    if output_file.eq_ignore_ascii_case("stderr") {
        return Ok(Box::new(BufWriter::new(std::io::stderr())));
    }

    let ext = Path::new(output_file).extension().and_then(|x| x.to_str());
    let file = File::create(output_file)?;
    match ext {
        Some("gz") => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            Ok(Box::new(BufWriter::new(encoder)))
        }
        _ => Ok(Box::new(BufWriter::new(file))),
    }
}

///
/// Write every item on its own line into the output file
///
/// * `lines` - anything that can be displayed
/// * `output_file` - file name--either gzipped or not, or `stdout`
///
/// A broken pipe (e.g., `| head`) ends the write quietly.
pub fn write_lines<T>(lines: &[T], output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        if let Err(e) = writeln!(buf, "{}", line) {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                return Ok(());
            }
            return Err(anyhow::anyhow!("unexpected error: {}", e));
        }
    }
    buf.flush()?;
    Ok(())
}

///
/// Create the parent directory of a file if needed
/// * `file` - file name
///
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

fn is_comment_line(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('#') || line.starts_with('%')
}

/// A whitespace-separated token together with the (1-based) line it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub line: usize,
    pub text: Box<str>,
}

impl Token {
    /// Parse the token text into any `FromStr` type
    pub fn parse<T>(&self) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        self.text
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("line {}: cannot parse '{}': {}", self.line, self.text, e))
    }
}

/// Stream whitespace-separated tokens out of a buffered reader,
/// regardless of how they are spread over lines. Lines starting with
/// `#` or `%` are skipped.
pub struct TokenStream<R: BufRead> {
    reader: R,
    line_no: usize,
    pending: std::collections::VecDeque<Token>,
    buf: String,
}

impl<R: BufRead> TokenStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            pending: std::collections::VecDeque::new(),
            buf: String::new(),
        }
    }

    /// Current line number (number of lines consumed so far)
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl TokenStream<Box<dyn BufRead>> {
    /// Open a (possibly gzipped) file as a token stream
    pub fn from_file(input_file: &str) -> anyhow::Result<Self> {
        Ok(Self::new(open_buf_reader(input_file)?))
    }
}

impl<R: BufRead> Iterator for TokenStream<R> {
    type Item = std::io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    if is_comment_line(&self.buf) {
                        continue;
                    }
                    let line = self.line_no;
                    self.pending.extend(self.buf.split_whitespace().map(|w| Token {
                        line,
                        text: w.into(),
                    }));
                }
                Err(e) => return Some(Err(e)),
            }
        }
        self.pending.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tokens_span_lines_and_skip_comments() {
        let text = "# header\n3 2\n  1\n\n% note\n0 1 1 2\n";
        let tokens: Vec<Token> = TokenStream::new(Cursor::new(text))
            .collect::<std::io::Result<_>>()
            .unwrap();
        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_ref()).collect();
        assert_eq!(words, vec!["3", "2", "1", "0", "1", "1", "2"]);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[2].line, 3);
        assert_eq!(tokens[3].line, 6);
    }

    #[test]
    fn token_parse_reports_line() {
        let tok = Token {
            line: 7,
            text: "x1".into(),
        };
        let err = tok.parse::<usize>().unwrap_err();
        assert!(err.to_string().contains("line 7"));
        let ok = Token {
            line: 1,
            text: "42".into(),
        };
        assert_eq!(ok.parse::<usize>().unwrap(), 42);
    }
}
