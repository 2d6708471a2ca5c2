use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const FORM_EXTENSION: &str = "xlsx";

// Excel leaves files such as `~$form.xlsx` next to the forms that are open.
fn is_lock_file(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with("~$"))
        .unwrap_or(false)
}

fn is_form(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && !is_lock_file(entry)
        && entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(FORM_EXTENSION))
            .unwrap_or(false)
}

/// All the forms under `root`, in a stable order.
pub fn find_forms(root: &Path) -> Vec<PathBuf> {
    let mut forms: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) if is_form(&entry) => forms.push(entry.path().to_path_buf()),
            Ok(entry) => debug!("find_forms: ignoring {:?}", entry.path()),
            Err(e) => warn!("Error accessing entry: {}", e),
        }
    }
    forms.sort();
    forms
}

/// The path of a form relative to the search root, as reported in the diagnostics.
pub fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<String>>()
        .join("/")
}
