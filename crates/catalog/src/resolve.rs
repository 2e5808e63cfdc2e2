use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Best-effort mapping from a stored path string to a file that exists on
/// this machine. Stored paths come from imports on other hosts, so they can
/// be relative to the media root, carry Windows separators, or use the
/// `/D:/...` form some clients produce.
#[derive(Clone, Debug, Default)]
pub struct PathResolver {
    media_root: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Repair {
    Unchanged,
    Fixed(PathBuf),
    NotFound,
}

impl PathResolver {
    pub fn new(media_root: Option<PathBuf>) -> Self {
        Self { media_root }
    }

    pub fn media_root(&self) -> Option<&Path> {
        self.media_root.as_deref()
    }

    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        let stored = stored.trim();
        if stored.is_empty() {
            return None;
        }
        self.candidates(stored).into_iter().find(|path| path.is_file())
    }

    pub fn repair(&self, stored: &str) -> Repair {
        match self.resolve(stored) {
            Some(path) if path.as_os_str() == stored.trim() => Repair::Unchanged,
            Some(path) => Repair::Fixed(path),
            None => Repair::NotFound,
        }
    }

    fn candidates(&self, stored: &str) -> Vec<PathBuf> {
        let mut out = vec![PathBuf::from(stored)];

        if let Some(root) = &self.media_root {
            let raw = Path::new(stored);
            if !raw.is_absolute() {
                out.push(root.join(raw));
            }
            if let Some(name) = basename(stored) {
                out.push(root.join(name));
            }
        }

        let forward = stored.replace('\\', "/");
        if forward != stored {
            out.push(PathBuf::from(&forward));
        }
        if let Some(drive_path) = strip_slash_before_drive(&forward) {
            out.push(PathBuf::from(drive_path));
        }

        let native: String = stored
            .chars()
            .map(|ch| if ch == '/' || ch == '\\' { MAIN_SEPARATOR } else { ch })
            .collect();
        if native != stored {
            out.push(PathBuf::from(native));
        }

        out
    }
}

/// Last component of a stored path, accepting either separator.
fn basename(stored: &str) -> Option<&str> {
    stored
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

/// `/D:/music/a.mp3` -> `D:/music/a.mp3`
fn strip_slash_before_drive(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('/')?;
    let mut chars = rest.chars();
    let drive = chars.next()?;
    if drive.is_ascii_alphabetic() && chars.next() == Some(':') {
        Some(rest)
    } else {
        None
    }
}
