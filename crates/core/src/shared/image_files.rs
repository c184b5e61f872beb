use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::constants::{IMAGE_EXTENSIONS, OUTPUT_EXTENSION, OUTPUT_PREFIX};

/// Whether `path` has one of the supported image extensions (case-insensitive).
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Output file name for `input`: `trimmed_<stem>.png`.
pub fn output_file_name(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| "image".into());
    PathBuf::from(format!("{OUTPUT_PREFIX}{stem}.{OUTPUT_EXTENSION}"))
}

/// Supported images directly inside `dir`, sorted by path.
///
/// Subdirectories are not descended into.
pub fn list_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.JPEG", true)]
    #[case("a.Png", true)]
    #[case("scan.tif", true)]
    #[case("anim.gif", true)]
    #[case("look.AVIF", true)]
    #[case("notes.txt", false)]
    #[case("no_extension", false)]
    fn test_is_image(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image(Path::new(name)), expected);
    }

    #[rstest]
    #[case("shirt.jpg", "trimmed_shirt.png")]
    #[case("dir/model.front.webp", "trimmed_model.front.png")]
    #[case("already.png", "trimmed_already.png")]
    fn test_output_file_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(output_file_name(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "readme.md", "c.WEBP"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<_> = list_images(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.WEBP"]);
    }

    #[test]
    fn test_list_images_missing_dir_is_error() {
        assert!(list_images(Path::new("/nonexistent/dir")).is_err());
    }
}
