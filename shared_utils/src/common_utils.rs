//! Common Utilities Module
//!
//! Pure helpers for file-name matching and output path construction. None of
//! them touch the filesystem.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════
// File name matching
// ═══════════════════════════════════════════════════════════════

/// Case-insensitive suffix comparison.
///
/// `suffix` is compared including its leading dot, so `".heic"` matches
/// `"IMG_0001.HEIC"` but not `"heic"` or `"photo.heic.txt"`.
///
/// # Examples
/// ```
/// use shared_utils::common_utils::has_suffix_ignore_case;
///
/// assert!(has_suffix_ignore_case("IMG_0001.HEIC", ".heic"));
/// assert!(has_suffix_ignore_case("photo.heic", ".HEIC"));
/// assert!(!has_suffix_ignore_case("photo.heic.txt", ".heic"));
/// ```
pub fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    name.to_lowercase().ends_with(&suffix.to_lowercase())
}

/// File name without its last extension.
///
/// Names that consist only of a leading dot and an extension (`".heic"`) are
/// returned unchanged, matching how `Path::file_stem` treats hidden files.
///
/// # Examples
/// ```
/// use shared_utils::common_utils::file_stem_lossy;
///
/// assert_eq!(file_stem_lossy("photo.heic"), "photo");
/// assert_eq!(file_stem_lossy("holiday.2024.HEIC"), "holiday.2024");
/// assert_eq!(file_stem_lossy("noext"), "noext");
/// ```
pub fn file_stem_lossy(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Last path component as a displayable string (empty for `/` or `..`).
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `output_dir / (stem(source) + target_extension)`.
///
/// The stem is taken from the path as an `OsStr`, so names that are not
/// valid UTF-8 keep their exact bytes.
///
/// # Examples
/// ```
/// use std::path::{Path, PathBuf};
/// use shared_utils::common_utils::output_path_for;
///
/// assert_eq!(
///     output_path_for(Path::new("in/IMG_1.HEIC"), Path::new("out"), ".jpg"),
///     PathBuf::from("out").join("IMG_1.jpg")
/// );
/// ```
pub fn output_path_for(source: &Path, output_dir: &Path, target_extension: &str) -> PathBuf {
    let mut name = source.file_stem().map(OsStr::to_os_string).unwrap_or_default();
    name.push(target_extension);
    output_dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_suffix_exact_and_mixed_case() {
        assert!(has_suffix_ignore_case("a.heic", ".heic"));
        assert!(has_suffix_ignore_case("a.HeIc", ".heic"));
        assert!(has_suffix_ignore_case(".heic", ".heic"));
    }

    #[test]
    fn test_suffix_rejects_other_names() {
        assert!(!has_suffix_ignore_case("a.jpg", ".heic"));
        assert!(!has_suffix_ignore_case("aheic", ".heic"));
        assert!(!has_suffix_ignore_case("a.heif", ".heic"));
        assert!(!has_suffix_ignore_case("", ".heic"));
    }

    #[test]
    fn test_stem_only_strips_last_extension() {
        assert_eq!(file_stem_lossy("a.b.heic"), "a.b");
        assert_eq!(file_stem_lossy("photo.HEIC"), "photo");
        assert_eq!(file_stem_lossy(".heic"), ".heic");
    }

    #[test]
    fn test_file_name_lossy() {
        assert_eq!(file_name_lossy(Path::new("dir/sub/a.heic")), "a.heic");
        assert_eq!(file_name_lossy(Path::new("/")), "");
    }

    #[test]
    fn test_output_path_keeps_stem_case() {
        let out = output_path_for(Path::new("Holiday.HEIC"), Path::new("/tmp/out"), ".jpg");
        assert_eq!(out, Path::new("/tmp/out").join("Holiday.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_path_keeps_non_utf8_stem() {
        use std::ffi::OsString;
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let first = PathBuf::from(OsString::from_vec(b"a\xff.heic".to_vec()));
        let second = PathBuf::from(OsString::from_vec(b"a\xfe.heic".to_vec()));

        let out_first = output_path_for(&first, Path::new("out"), ".jpg");
        let out_second = output_path_for(&second, Path::new("out"), ".jpg");

        assert_ne!(out_first, out_second);
        assert_eq!(out_first.file_name().unwrap().as_bytes(), b"a\xff.jpg");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn suffix_match_ignores_case(stem in "[a-zA-Z0-9_]{1,16}", upper in any::<bool>()) {
            let ext = if upper { ".HEIC" } else { ".heic" };
            let name = format!("{}{}", stem, ext);
            prop_assert!(has_suffix_ignore_case(&name, ".heic"));
            prop_assert!(has_suffix_ignore_case(&name, ".HEIC"));
        }

        #[test]
        fn stem_plus_extension_round_trips(stem in "[a-zA-Z0-9_]{1,16}") {
            let name = format!("{}.heic", stem);
            prop_assert_eq!(file_stem_lossy(&name), stem);
        }

        #[test]
        fn output_path_always_ends_with_target(stem in "[a-zA-Z0-9_]{1,16}") {
            let out = output_path_for(Path::new(&format!("{}.HEIC", stem)), Path::new("out"), ".jpg");
            let name = file_name_lossy(&out);
            prop_assert!(name.ends_with(".jpg"));
            prop_assert_eq!(file_stem_lossy(&name), stem);
        }
    }
}
