use std::{
    fs::read_dir,
    path::{Path, PathBuf},
};

use compositor::{Canvas, ComposeError, SetLoader, Source};

/// Reads symbol sets laid out as `<root>/<dataset>/<set>/*.png`.
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn set_dir(&self, label: &str, source: Source) -> PathBuf {
        self.root
            .join(source.dataset())
            .join(source.file_stem(label))
    }

    // sorted so a seeded store samples the same files on every machine
    fn glyph_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| matches!(p.extension().and_then(|s| s.to_str()), Some("png")))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl SetLoader for DirLoader {
    fn load(&self, label: &str, source: Source) -> compositor::Result<Vec<Canvas>> {
        let failed = |reason: String| ComposeError::Load {
            label: label.to_string(),
            reason,
        };

        let dir = self.set_dir(label, source);
        let paths = Self::glyph_paths(&dir).map_err(|e| failed(format!("{}: {e}", dir.display())))?;
        paths
            .iter()
            .map(|p| {
                image::open(p)
                    .map(|img| img.to_luma32f())
                    .map_err(|e| failed(format!("{}: {e}", p.display())))
            })
            .collect()
    }
}
