//! Font discovery for invoice documents.
//!
//! A bundled Roboto family is preferred.  It is searched for in an explicitly
//! configured directory, the `INVOICE_COMPOSER_FONTS_DIR` environment variable,
//! `assets/fonts` next to the running executable and `assets/fonts` in this
//! crate's manifest directory, in that order.  When no bundled copy is found a
//! system sans-serif family is used instead (Liberation Sans or DejaVu Sans on
//! Unix, Arial on Windows); `INVOICE_COMPOSER_SYSTEM_FONTS_DIR` overrides where
//! that fallback is looked up.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const BUNDLED_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable naming a directory with the bundled font files.
pub const FONTS_DIR_ENV: &str = "INVOICE_COMPOSER_FONTS_DIR";

/// Environment variable naming a directory with a system fallback family.
pub const SYSTEM_FONTS_DIR_ENV: &str = "INVOICE_COMPOSER_SYSTEM_FONTS_DIR";

const BUNDLED_FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// File names of a four-style family that does not follow genpdf's
/// `<Name>-<Style>.ttf` convention.
struct FamilyFiles {
    name: &'static str,
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
    directories: &'static [&'static str],
}

impl FamilyFiles {
    fn paths(&self, directory: &Path) -> [PathBuf; 4] {
        [
            directory.join(self.regular),
            directory.join(self.bold),
            directory.join(self.italic),
            directory.join(self.bold_italic),
        ]
    }

    fn complete_in(&self, directory: &Path) -> bool {
        self.paths(directory).iter().all(|path| path.is_file())
    }
}

const SYSTEM_FAMILIES: &[FamilyFiles] = &[
    FamilyFiles {
        name: "Liberation Sans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
        directories: &[
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/truetype/liberation2",
            "/usr/share/fonts/liberation-sans",
            "/usr/share/fonts/liberation",
        ],
    },
    FamilyFiles {
        name: "DejaVu Sans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
        directories: &[
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/dejavu",
            "/usr/share/fonts/TTF",
        ],
    },
    FamilyFiles {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
        directories: &[],
    },
];

/// Returns the directory the bundled fonts are expected in when running from
/// the source tree.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

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

fn bundled_directory_candidates(preferred: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.iter().any(|existing| existing == &candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = preferred {
        push(path.to_path_buf());
    }
    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push(path);
    }
    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }
    push(bundled_fonts_source_dir());

    candidates
}

fn missing_bundled_files(path: &Path) -> Vec<PathBuf> {
    BUNDLED_FONT_FILES
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_bundled_directory(preferred: Option<&Path>) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in bundled_directory_candidates(preferred) {
        let exists = candidate.is_dir();
        let missing = missing_bundled_files(&candidate);

        if exists && missing.is_empty() {
            return Ok(candidate);
        }

        let reason = if !exists {
            "directory missing".to_owned()
        } else {
            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            format!("missing files [{}]", missing_list)
        };

        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    Err(Error::new(
        format!(
            "Unable to locate bundled {} fonts. Checked: {}. See assets/fonts/README.md or set {}.",
            BUNDLED_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_font_family(preferred: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_bundled_directory(preferred)?;
    debug!("loading bundled fonts from {}", directory.display());

    fonts::from_files(&directory, BUNDLED_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                BUNDLED_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn system_directories(family: &FamilyFiles) -> Vec<PathBuf> {
    let mut directories = Vec::new();
    if let Some(path) = env_path(SYSTEM_FONTS_DIR_ENV) {
        directories.push(path);
    }
    directories.extend(family.directories.iter().map(PathBuf::from));

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                directories.push(root.join("Fonts"));
            }
        }
    }

    directories
}

fn locate_system_family() -> Option<(&'static FamilyFiles, PathBuf)> {
    SYSTEM_FAMILIES.iter().find_map(|family| {
        system_directories(family)
            .into_iter()
            .find(|directory| family.complete_in(directory))
            .map(|directory| (family, directory))
    })
}

fn load_font(path: &Path, family: &str) -> Result<FontData, Error> {
    FontData::load(path, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load {} font at {}: {}",
                family,
                path.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn system_font_family() -> Result<FontFamily<FontData>, Error> {
    let (family, directory) = locate_system_family().ok_or_else(|| {
        Error::new(
            format!(
                "No system fallback font family found; set {} to a directory containing one",
                SYSTEM_FONTS_DIR_ENV
            ),
            io::Error::new(io::ErrorKind::NotFound, "system fonts not found"),
        )
    })?;

    let [regular, bold, italic, bold_italic] = family.paths(&directory);
    Ok(FontFamily {
        regular: load_font(&regular, family.name)?,
        bold: load_font(&bold, family.name)?,
        italic: load_font(&italic, family.name)?,
        bold_italic: load_font(&bold_italic, family.name)?,
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

/// Returns the font family used for invoice documents.
///
/// `preferred` names a directory holding the bundled Roboto files and is tried
/// before any other location.  Falls back to a system family when no bundled
/// copy can be found.
pub fn font_family(preferred: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family(preferred) {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match system_font_family() {
            Ok(fallback) => {
                warn!("{}; falling back to a system font family", err);
                Ok(fallback)
            }
            Err(fallback_err) => {
                warn!(
                    "Bundled fonts unavailable ({}); system fallback failed: {}",
                    err, fallback_err
                );
                Err(Error::new(
                    format!(
                        "Bundled fonts unavailable and system fallback failed: {}",
                        fallback_err
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "no usable fonts available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether any usable font family can be found without loading it.
pub fn fonts_available(preferred: Option<&Path>) -> bool {
    resolve_bundled_directory(preferred).is_ok() || locate_system_family().is_some()
}
