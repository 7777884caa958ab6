use std::io;
use std::path::Path;

use log::{debug, warn};
use walkdir::WalkDir;

use super::error::EvalError;
use super::record::{Labeled, PetRecord, ResultSet};

/// Derives the ground-truth pet label from an image filename.
///
/// `"Boston_terrier_02259.jpg"` becomes `"boston terrier"`: one extension is
/// stripped, the stem is split on `_`, and only purely alphabetic words are kept.
/// Hidden files (leading `.`) yield `None`. A name without any alphabetic word
/// yields an empty label, which is still a valid record.
pub fn pet_label(filename: &str) -> Option<String> {
    if filename.starts_with('.') {
        return None;
    }

    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    let words: Vec<&str> = stem
        .split('_')
        .filter(|word| !word.is_empty() && word.chars().all(char::is_alphabetic))
        .collect();

    Some(words.join(" ").to_lowercase().trim().to_string())
}

/// Builds the initial result set from a sequence of filenames.
///
/// Hidden names are dropped entirely. Repeated names keep their first record and
/// leave a duplicate diagnostic on the set.
pub fn labels_from_filenames<I, S>(filenames: I) -> ResultSet<Labeled>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut results = ResultSet::new();
    for filename in filenames {
        let filename = filename.as_ref();
        match pet_label(filename) {
            Some(label) => {
                debug!("{} -> {:?}", filename, label);
                results.insert(filename, PetRecord::new(label));
            }
            None => debug!("Skipping hidden file {}", filename),
        }
    }
    results
}

/// Lists `image_dir` (non-recursively) and labels every visible regular file.
///
/// A missing or unreadable directory, or a path that is not a directory, is fatal.
/// Entries that fail to stat are skipped with a warning. Symlinked images count.
pub fn get_pet_labels(image_dir: &Path) -> Result<ResultSet<Labeled>, EvalError> {
    let image_dir_error = |source: io::Error| EvalError::ImageDir {
        path: image_dir.to_path_buf(),
        source,
    };
    let mut filenames = Vec::new();

    for entry in WalkDir::new(image_dir)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(image_dir_error(io::Error::from(e))),
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", image_dir, e);
                continue;
            }
        };

        if entry.depth() == 0 {
            if !entry.file_type().is_dir() {
                return Err(image_dir_error(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "not a directory",
                )));
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => filenames.push(name.to_string()),
            None => warn!("Skipping non UTF-8 filename {:?}", entry.file_name()),
        }
    }

    Ok(labels_from_filenames(filenames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    #[test]
    fn test_breed_with_sequence_number() {
        assert_eq!(pet_label("Boston_terrier_02259.jpg").as_deref(), Some("boston terrier"));
        assert_eq!(pet_label("Collie_03797.jpg").as_deref(), Some("collie"));
    }

    #[test]
    fn test_hidden_file_is_rejected() {
        assert_eq!(pet_label(".DS_Store"), None);
        assert_eq!(pet_label(".hidden_dog_01.jpg"), None);
    }

    #[test]
    fn test_only_last_extension_is_stripped() {
        assert_eq!(pet_label("great_dane.tar.gz").as_deref(), Some("great"));
        assert_eq!(pet_label("no_extension").as_deref(), Some("no extension"));
    }

    #[test]
    fn test_mixed_tokens_are_dropped() {
        assert_eq!(pet_label("cat2_tabby_007.png").as_deref(), Some("tabby"));
        assert_eq!(pet_label("fox-squirrel_01.jpg").as_deref(), Some(""));
        assert_eq!(pet_label("12345.jpg").as_deref(), Some(""));
    }

    #[test]
    fn test_case_and_empty_tokens() {
        assert_eq!(pet_label("German__Shepherd_.JPG").as_deref(), Some("german shepherd"));
    }

    #[test]
    fn test_duplicate_filenames_keep_first() {
        let results = labels_from_filenames(["Beagle_01.jpg", "Beagle_01.jpg", ".secret.jpg"]);
        assert_eq!(results.len(), 1);
        assert_eq!(results.diagnostics().len(), 1);
    }

    #[test]
    fn test_directory_listing_skips_hidden_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("Beagle_01125.jpg")).unwrap();
        File::create(dir.path().join("gecko_80.jpg")).unwrap();
        File::create(dir.path().join(".DS_Store")).unwrap();
        fs::create_dir(dir.path().join("Poodle_subdir")).unwrap();

        let results = get_pet_labels(dir.path()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.get("Beagle_01125.jpg").unwrap().pet_label, "beagle");
        assert_eq!(results.get("gecko_80.jpg").unwrap().pet_label, "gecko");
    }

    #[test]
    fn test_directory_listing_is_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["fox_05.jpg", "Beagle_01.jpg", "cat_03.jpg"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let results = get_pet_labels(dir.path()).unwrap();
        let names: Vec<_> = results.filenames().collect();
        assert_eq!(names, vec!["Beagle_01.jpg", "cat_03.jpg", "fox_05.jpg"]);
    }

    #[test]
    fn test_nested_images_are_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("more")).unwrap();
        File::create(dir.path().join("more").join("Collie_02.jpg")).unwrap();
        File::create(dir.path().join("Collie_01.jpg")).unwrap();

        let results = get_pet_labels(dir.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.get("Collie_02.jpg").is_none());
    }

    #[test]
    fn test_file_as_image_dir_is_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = get_pet_labels(file.path());
        assert!(matches!(result, Err(EvalError::ImageDir { .. })));
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let result = get_pet_labels(Path::new("/nonexistent/pet_images"));
        assert!(matches!(result, Err(EvalError::ImageDir { .. })));
    }
}
