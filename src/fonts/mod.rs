//! Font discovery for the PDF adapter.
//!
//! A document tree names its body font family; this module maps that name to the
//! four `<Family>-<Style>.ttf` files `genpdf` expects.  Directories are searched in
//! order: `QUOTE_REPORT_FONTS_DIR`, `assets/fonts` next to the running binary, and
//! `assets/fonts` in the crate root.  When none of them holds the family, the
//! Windows Arial family is used if a Windows font directory can be found.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Environment variable naming an extra directory searched first.
pub const FONTS_DIR_ENV: &str = "QUOTE_REPORT_FONTS_DIR";

/// Environment variable overriding the Windows fallback font directory.
pub const WINDOWS_FONTS_DIR_ENV: &str = "QUOTE_REPORT_WINDOWS_FONTS_DIR";

const FONT_STYLES: [&str; 4] = ["Regular", "Bold", "Italic", "BoldItalic"];

const WINDOWS_FALLBACK_FAMILY_NAME: &str = "Arial";

const WINDOWS_FONT_FILES: [(&str, &str); 4] = [
    ("arial.ttf", "regular"),
    ("arialbd.ttf", "bold"),
    ("ariali.ttf", "italic"),
    ("arialbi.ttf", "bold italic"),
];

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push(path);
    }
    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }
    push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));

    candidates
}

fn missing_font_files(directory: &Path, family: &str) -> Vec<String> {
    FONT_STYLES
        .iter()
        .map(|style| format!("{family}-{style}.ttf"))
        .filter(|name| !directory.join(name).is_file())
        .collect()
}

/// Returns the first directory holding all four files of `family`.
pub fn fonts_source_dir(family: &str) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }
        let missing = missing_font_files(&candidate, family);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate font family '{}'. Checked: {}. Set {} to a directory with the font files.",
            family,
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "font directory not found"),
    ))
}

fn load_named_family(family: &str) -> Result<FontFamily<FontData>, Error> {
    let directory = fonts_source_dir(family)?;
    debug!("loading font family '{}' from {}", family, directory.display());

    fonts::from_files(&directory, family, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                family,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn windows_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(path);
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                let candidate = root.join("Fonts");
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

fn load_windows_font(directory: &Path, file: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        let io_kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!(
                "Failed to load Windows fallback {} font at {}: {}",
                style,
                path.display(),
                err
            ),
            io::Error::new(io_kind, err.to_string()),
        )
    })
}

fn windows_fallback_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = windows_font_directory().ok_or_else(|| {
        Error::new(
            "Windows font directory not found for fallback",
            io::Error::new(io::ErrorKind::NotFound, "windows fonts directory not found"),
        )
    })?;

    let [regular, bold, italic, bold_italic] = WINDOWS_FONT_FILES;
    Ok(FontFamily {
        regular: load_windows_font(&directory, regular.0, regular.1)?,
        bold: load_windows_font(&directory, bold.0, bold.1)?,
        italic: load_windows_font(&directory, italic.0, italic.1)?,
        bold_italic: load_windows_font(&directory, bold_italic.0, bold_italic.1)?,
    })
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Loads `family`, falling back to the Windows Arial family when its files are missing.
pub fn font_family(family: &str) -> Result<FontFamily<FontData>, Error> {
    match load_named_family(family) {
        Ok(loaded) => Ok(loaded),
        Err(err) if fonts_missing(&err) => match windows_fallback_font_family() {
            Ok(fallback) => {
                warn!(
                    "Font family '{}' unavailable ({}); falling back to Windows '{}' family.",
                    family, err, WINDOWS_FALLBACK_FAMILY_NAME
                );
                Ok(fallback)
            }
            Err(fallback_err) => {
                warn!(
                    "Font family '{}' unavailable ({}); Windows fallback failed: {}",
                    family, err, fallback_err
                );
                Err(Error::new(
                    format!(
                        "Font family '{}' unavailable and Windows fallback failed: {}",
                        family, fallback_err
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "fonts are not available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether the files of `family` can be found without falling back.
pub fn fonts_available(family: &str) -> bool {
    fonts_source_dir(family).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_family_lists_expected_file_names() {
        let missing = missing_font_files(Path::new("/nonexistent"), "Segoe UI");
        assert_eq!(
            missing,
            [
                "Segoe UI-Regular.ttf",
                "Segoe UI-Bold.ttf",
                "Segoe UI-Italic.ttf",
                "Segoe UI-BoldItalic.ttf",
            ]
        );
    }

    #[test]
    fn unknown_family_reports_not_found() {
        let err = fonts_source_dir("NoSuchFamily-7f3a").unwrap_err();
        assert!(fonts_missing(&err));
        assert!(err.to_string().contains("NoSuchFamily-7f3a"));
        assert!(!fonts_available("NoSuchFamily-7f3a"));
    }

    #[test]
    fn manifest_assets_are_always_searched() {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
        assert!(font_directory_candidates().contains(&manifest));
    }
}
