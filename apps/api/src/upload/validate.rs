//! Pre-extraction file validation: extension allow-list, size ceiling, and
//! batch count.

/// File types the extractor can handle.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "txt"];

/// Per-file ceiling in the upload path.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Batches beyond this are rejected whole — never silently truncated.
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// A file that passed validation, with its normalized extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    /// Index into the submitted batch.
    pub index: usize,
    pub extension: String,
}

#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<AcceptedFile>,
    pub rejections: Vec<String>,
}

/// Lowercased extension of a filename, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Validates a batch of (filename, byte length) pairs. An oversized batch
/// rejects everything with a single message; otherwise files are accepted
/// or rejected individually.
pub fn validate_files(files: &[(String, usize)]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    if files.len() > MAX_FILES_PER_UPLOAD {
        outcome.rejections.push(format!(
            "Maximum {MAX_FILES_PER_UPLOAD} files allowed per upload"
        ));
        return outcome;
    }

    for (index, (filename, size)) in files.iter().enumerate() {
        let Some(extension) = file_extension(filename) else {
            outcome
                .rejections
                .push(format!("Unsupported file type: {filename}"));
            continue;
        };

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            outcome
                .rejections
                .push(format!("Unsupported file type: {filename}"));
            continue;
        }

        if *size > MAX_FILE_SIZE {
            outcome
                .rejections
                .push(format!("File too large: {filename}"));
            continue;
        }

        outcome.accepted.push(AcceptedFile { index, extension });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(names: &[(&str, usize)]) -> Vec<(String, usize)> {
        names.iter().map(|(n, s)| (n.to_string(), *s)).collect()
    }

    #[test]
    fn test_accepts_allowed_extensions_case_insensitively() {
        let files = batch(&[
            ("cv.pdf", 100),
            ("cv.DOCX", 100),
            ("cv.Doc", 100),
            ("cv.TXT", 100),
        ]);
        let outcome = validate_files(&files);
        assert_eq!(outcome.accepted.len(), 4);
        assert!(outcome.rejections.is_empty());
        assert_eq!(outcome.accepted[1].extension, "docx");
    }

    #[test]
    fn test_rejects_unknown_extension_and_missing_extension() {
        let files = batch(&[("cv.exe", 100), ("cv", 100), ("cv.", 100)]);
        let outcome = validate_files(&files);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejections.len(), 3);
        assert!(outcome.rejections[0].contains("cv.exe"));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let files = batch(&[("big.pdf", MAX_FILE_SIZE + 1), ("ok.pdf", MAX_FILE_SIZE)]);
        let outcome = validate_files(&files);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].index, 1);
        assert!(outcome.rejections[0].contains("big.pdf"));
    }

    #[test]
    fn test_oversized_batch_rejects_everything() {
        let files: Vec<(String, usize)> = (0..11).map(|i| (format!("cv{i}.pdf"), 100)).collect();
        let outcome = validate_files(&files);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejections.len(), 1);
        assert!(outcome.rejections[0].contains("Maximum 10 files"));
    }

    #[test]
    fn test_mixed_batch_keeps_valid_files() {
        let files = batch(&[("a.pdf", 10), ("b.png", 10), ("c.txt", 10)]);
        let outcome = validate_files(&files);
        let indices: Vec<usize> = outcome.accepted.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(outcome.rejections.len(), 1);
    }
}
