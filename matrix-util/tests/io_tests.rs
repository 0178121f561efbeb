use matrix_util::common_io::{mkdir, open_buf_reader, write_lines, TokenStream};
use std::io::BufRead;

#[test]
fn gz_lines_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("nested/out/lines.txt.gz");
    let file = file.to_str().ok_or(anyhow::anyhow!("non-utf8 path"))?;

    mkdir(file)?;
    let lines: Vec<String> = (0..100).map(|i| format!("{} {}", i, i * i)).collect();
    write_lines(&lines, file)?;

    // really compressed
    let raw = std::fs::read(file)?;
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let back: Vec<String> = open_buf_reader(file)?.lines().collect::<std::io::Result<_>>()?;
    assert_eq!(back, lines);
    Ok(())
}

#[test]
fn token_stream_from_plain_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("tokens.txt");
    let file = file.to_str().ok_or(anyhow::anyhow!("non-utf8 path"))?;

    write_lines(&["# comment", "1 2", "", "3"], file)?;

    let mut tokens = TokenStream::from_file(file)?;
    let mut values = vec![];
    for tok in tokens.by_ref() {
        values.push(tok?.parse::<u32>()?);
    }
    assert_eq!(values, vec![1, 2, 3]);
    assert_eq!(tokens.line_no(), 4);
    Ok(())
}

#[test]
fn missing_file_names_the_path() {
    let err = match open_buf_reader("/definitely/not/here.txt") {
        Ok(_) => panic!("opened a missing file"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("/definitely/not/here.txt"));
}
