pub mod libs;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Open `input` for buffered reading.
///
/// `stdin` reads standard input; files ending in `.gz` are decompressed on the fly.
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    if input == "stdin" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let path = Path::new(input);
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("could not open {}: {}", path.display(), e))?;

    let reader: Box<dyn BufRead> = if path.extension() == Some(OsStr::new("gz")) {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(reader)
}

/// Open `output` for buffered writing. `stdout` writes to the screen.
pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(output)
            .map_err(|e| anyhow::anyhow!("could not create {}: {}", output, e))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_reader_plain_and_gz() {
        let dir = tempdir().unwrap();

        let plain = dir.path().join("seq.fa");
        std::fs::write(&plain, ">a\nMKT\n").unwrap();

        let gz = dir.path().join("seq.fa.gz");
        {
            let file = File::create(&gz).unwrap();
            let mut encoder = GzEncoder::new(file, flate2::Compression::default());
            encoder.write_all(b">a\nMKT\n").unwrap();
            encoder.finish().unwrap();
        }

        for path in [&plain, &gz] {
            let mut text = String::new();
            reader(path.to_str().unwrap())
                .unwrap()
                .read_to_string(&mut text)
                .unwrap();
            assert_eq!(text, ">a\nMKT\n");
        }
    }

    #[test]
    fn test_reader_missing_file() {
        assert!(reader("no/such/file.fa").is_err());
    }
}
