//! Program image loading.
//!
//! Two formats are accepted:
//!
//! - hex text, one or more 32-bit words per line in the style of `$readmemh`
//!   files, with `//` and `#` comments and `@<word-index>` address directives;
//! - raw little-endian binary (`.bin`), padded with zero bytes to a whole word.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::{HarnessError, ImageError, Result};

/// Largest image, in words, and so the largest store a run allocates
/// (4 MiB). An `@` directive may not select an index at or past it.
pub const MAX_IMAGE_WORDS: usize = 1 << 20;

/// On-disk image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Hex text words.
    Hex,
    /// Little-endian raw bytes.
    Binary,
}

impl ImageFormat {
    /// Picks the format from a file extension; anything but `.bin` is hex.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bin") => Self::Binary,
            _ => Self::Hex,
        }
    }
}

/// Reads an image from disk in the format implied by its extension.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] when the file cannot be read and
/// [`HarnessError::Image`] when a hex line is malformed.
pub fn load_image(path: &Path) -> Result<Vec<u32>> {
    let format = ImageFormat::from_path(path);
    let image = match format {
        ImageFormat::Binary => {
            let bytes = fs::read(path).map_err(|source| HarnessError::io(path, source))?;
            parse_binary(&bytes)
        }
        ImageFormat::Hex => {
            let text =
                fs::read_to_string(path).map_err(|source| HarnessError::io(path, source))?;
            parse_hex(&text).map_err(|source| HarnessError::Image {
                path: path.to_path_buf(),
                source,
            })?
        }
    };
    debug!(path = %path.display(), ?format, words = image.len(), "loaded image");
    Ok(image)
}

/// Packs little-endian bytes into words.
#[must_use]
pub fn parse_binary(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0_u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(word)
        })
        .collect()
}

/// Parses hex text into words.
///
/// Words not covered by any line are zero.
///
/// # Errors
///
/// Returns the first malformed line.
pub fn parse_hex(text: &str) -> std::result::Result<Vec<u32>, ImageError> {
    let mut image = Vec::new();
    let mut cursor = 0_usize;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        for token in strip_comment(raw).split_whitespace() {
            if let Some(target) = token.strip_prefix('@') {
                cursor = parse_address(target)
                    .ok_or_else(|| ImageError::new(line, format!("invalid address `{token}`")))?;
                if cursor >= MAX_IMAGE_WORDS {
                    return Err(ImageError::new(
                        line,
                        format!("address `{token}` beyond the {MAX_IMAGE_WORDS}-word limit"),
                    ));
                }
                continue;
            }

            let word = parse_word(token)
                .ok_or_else(|| ImageError::new(line, format!("invalid hex word `{token}`")))?;
            if cursor >= MAX_IMAGE_WORDS {
                return Err(ImageError::new(line, "image exceeds the word limit"));
            }
            if image.len() <= cursor {
                image.resize(cursor + 1, 0);
            }
            image[cursor] = word;
            cursor += 1;
        }
    }

    Ok(image)
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find("//"), line.find('#')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

fn hex_digits(token: &str) -> Option<String> {
    let body = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    let digits: String = body.chars().filter(|c| *c != '_').collect();
    (!digits.is_empty() && digits.len() <= 8).then_some(digits)
}

fn parse_word(token: &str) -> Option<u32> {
    u32::from_str_radix(&hex_digits(token)?, 16).ok()
}

fn parse_address(token: &str) -> Option<usize> {
    usize::from_str_radix(&hex_digits(token)?, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::{load_image, parse_binary, parse_hex, ImageFormat};
    use std::path::Path;

    #[test]
    fn hex_lines_fill_consecutive_words() {
        let image = parse_hex("30072005\n0x2101_3802\n").expect("valid image");
        assert_eq!(image, vec![0x3007_2005, 0x2101_3802]);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "// arithmetic test\n\n30072005 # movs, adds\n  # trailing\n38022101 // subs\n";
        assert_eq!(
            parse_hex(text).expect("valid image"),
            vec![0x3007_2005, 0x3802_2101]
        );
    }

    #[test]
    fn address_directive_moves_the_cursor_and_zero_fills() {
        let image = parse_hex("e7ff2005\n@4\ncafef00d deadbeef\n@1 00000001\n")
            .expect("valid image");
        assert_eq!(
            image,
            vec![0xE7FF_2005, 1, 0, 0, 0xCAFE_F00D, 0xDEAD_BEEF]
        );
    }

    #[test]
    fn malformed_words_report_their_line() {
        let error = parse_hex("00000000\n\nnot-hex\n").expect_err("invalid image");
        assert_eq!(error.line, 3);
        assert!(error.message.contains("not-hex"));
    }

    #[test]
    fn oversized_words_are_rejected() {
        let error = parse_hex("123456789").expect_err("nine digits");
        assert_eq!(error.line, 1);
    }

    #[test]
    fn far_address_directives_are_rejected() {
        let error = parse_hex("@fffffff\n00000001\n").expect_err("beyond limit");
        assert_eq!(error.line, 1);
    }

    #[test]
    fn binary_images_are_little_endian_and_zero_padded() {
        let image = parse_binary(&[0x05, 0x20, 0xFF, 0xE7, 0x0D, 0xF0]);
        assert_eq!(image, vec![0xE7FF_2005, 0x0000_F00D]);
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ImageFormat::from_path(Path::new("a.bin")), ImageFormat::Binary);
        assert_eq!(ImageFormat::from_path(Path::new("a.BIN")), ImageFormat::Binary);
        assert_eq!(ImageFormat::from_path(Path::new("a.hex")), ImageFormat::Hex);
        assert_eq!(ImageFormat::from_path(Path::new("a")), ImageFormat::Hex);
    }

    #[test]
    fn load_image_reads_both_formats_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let hex = dir.path().join("prog.hex");
        let bin = dir.path().join("prog.bin");
        std::fs::write(&hex, "e7ff2005\n").expect("write hex");
        std::fs::write(&bin, [0x05, 0x20, 0xFF, 0xE7]).expect("write bin");

        assert_eq!(load_image(&hex).expect("hex loads"), vec![0xE7FF_2005]);
        assert_eq!(load_image(&bin).expect("bin loads"), vec![0xE7FF_2005]);
    }

    #[test]
    fn missing_files_are_io_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = load_image(&dir.path().join("absent.hex")).expect_err("missing");
        assert!(matches!(error, crate::HarnessError::Io { .. }));
    }
}
