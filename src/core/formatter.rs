//! Display formatting and the preview read primitive for rove.
//!
//! Formats entry attributes, sizes and times for the list and info columns, clips lines to
//! an exact terminal width, and reads capped file previews with binary detection.

use chrono::{DateTime, Local};
use humansize::{DECIMAL, format_size};
use unicode_width::UnicodeWidthChar;

use std::fs::{File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

// Bytes to peek for null bytes in binary detection
const BINARY_PEEK_BYTES: usize = 1024;

/// Result of the preview primitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewContent {
    pub content: String,
    pub is_binary: bool,
    pub truncated: bool,
}

/// Formats the file attributes in a unix-like format.
///
/// On Unix: Returns a string like 'drwxr-xr-x'.
/// On Windows: Returns a short flag string (`d`/`l`, `h` hidden, `s` system, `a` archive,
/// `r` read-only).
pub fn format_attributes(meta: &Metadata) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let file_type = meta.file_type();
        let first = if file_type.is_dir() {
            'd'
        } else if file_type.is_symlink() {
            'l'
        } else {
            '-'
        };
        let mode = meta.permissions().mode();
        let mut chars = [first, '-', '-', '-', '-', '-', '-', '-', '-', '-'];
        for (i, shift) in [6u32, 3, 0].into_iter().enumerate() {
            let base = 1 + i * 3;
            for (offset, flag) in ['r', 'w', 'x'].into_iter().enumerate() {
                if (mode >> (shift + 2 - offset as u32)) & 1 != 0 {
                    chars[base + offset] = flag;
                }
            }
        }
        chars.iter().collect()
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        let attr = meta.file_attributes();
        let flags = [
            (0x02, 'h'),
            (0x04, 's'),
            (0x20, 'a'),
            (0x01, 'r'),
        ];
        let mut out = String::with_capacity(5);
        out.push(if attr & 0x10 != 0 {
            'd'
        } else if attr & 0x400 != 0 {
            'l'
        } else {
            '-'
        });
        for (bit, flag) in flags {
            out.push(if attr & bit != 0 { flag } else { '-' });
        }
        out
    }
}

/// Formats a size for the list column, "-" for directories and unknown sizes.
pub fn format_file_size(size: Option<u64>, is_dir: bool) -> String {
    match size {
        Some(sz) if !is_dir => format_size(sz, DECIMAL),
        _ => "-".to_string(),
    }
}

/// Formats a timestamp in local time, "-" if unknown.
pub fn format_file_time(time: Option<SystemTime>) -> String {
    time.map(|t| {
        let dt: DateTime<Local> = DateTime::from(t);
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    })
    .unwrap_or_else(|| "-".to_string())
}

/// Cleans a line to exactly `width` display columns.
///
/// Control characters are dropped, tabs expand to the next multiple of 4, wide characters
/// that would overflow are cut, and short lines are padded with spaces.
pub fn sanitize_to_exact_width(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut current_w = 0;

    for ch in line.chars() {
        if ch == '\t' {
            let space_count = 4 - (current_w % 4);
            if current_w + space_count > width {
                break;
            }
            out.push_str(&" ".repeat(space_count));
            current_w += space_count;
            continue;
        }

        if ch.is_control() {
            continue;
        }

        let w = ch.width().unwrap_or(0);
        if current_w + w > width {
            break;
        }
        out.push(ch);
        current_w += w;
    }

    if current_w < width {
        out.push_str(&" ".repeat(width - current_w));
    }
    out
}

/// Reads at most `max_bytes` of a file for the preview pane.
///
/// A file is binary when it starts with a PDF header or holds a NUL byte within its first
/// 1024 bytes; binary previews carry no content. Directories yield an empty preview.
pub fn read_preview(path: &Path, max_bytes: usize) -> io::Result<PreviewContent> {
    let meta = std::fs::metadata(path)?;
    if meta.is_dir() {
        return Ok(PreviewContent::default());
    }
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }

    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(max_bytes.min(meta.len() as usize));
    file.take(max_bytes as u64).read_to_end(&mut buf)?;

    let truncated = meta.len() > buf.len() as u64;
    let peek = &buf[..buf.len().min(BINARY_PEEK_BYTES)];
    if peek.starts_with(b"%PDF-") || peek.contains(&0) {
        return Ok(PreviewContent {
            content: String::new(),
            is_binary: true,
            truncated,
        });
    }

    Ok(PreviewContent {
        content: String::from_utf8_lossy(&buf).into_owned(),
        is_binary: false,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sanitize_produces_exact_width() {
        let width = 10;
        for input in ["short.txt", "very_long_filename.txt", "🦀_crab.rs", "\t_tab"] {
            let result = sanitize_to_exact_width(input, width);
            let actual = unicode_width::UnicodeWidthStr::width(result.as_str());
            assert_eq!(actual, width, "input {input:?} gave {result:?}");
            assert!(!result.chars().any(|c| c.is_control()));
        }
    }

    #[test]
    fn size_and_time_placeholders() {
        assert_eq!(format_file_size(Some(1000), true), "-");
        assert_eq!(format_file_size(None, false), "-");
        assert_eq!(format_file_size(Some(1000), false), "1 kB");
        assert_eq!(format_file_time(None), "-");
    }

    #[test]
    fn preview_reads_text_and_caps_size() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("readme.txt");
        fs::write(&path, "line one\nline two\n")?;

        let full = read_preview(&path, 4096)?;
        assert_eq!(full.content, "line one\nline two\n");
        assert!(!full.is_binary);
        assert!(!full.truncated);

        let capped = read_preview(&path, 4)?;
        assert_eq!(capped.content, "line");
        assert!(capped.truncated);
        Ok(())
    }

    #[test]
    fn preview_detects_binary() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let bin = dir.path().join("blob.bin");
        fs::write(&bin, [0x7f, b'E', b'L', b'F', 0, 1, 2])?;
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, b"%PDF-1.7 text only")?;

        for path in [bin, pdf] {
            let preview = read_preview(&path, 4096)?;
            assert!(preview.is_binary);
            assert!(preview.content.is_empty());
        }
        Ok(())
    }

    #[test]
    fn preview_of_directory_is_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert_eq!(read_preview(dir.path(), 10)?, PreviewContent::default());
        assert!(read_preview(&dir.path().join("missing"), 10).is_err());
        Ok(())
    }
}
