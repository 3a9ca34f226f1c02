use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{BatchError, Result};

/// Extensions the video pipelines accept as input
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "mkv", "webm"];

/// Extensions the image pipelines accept as input
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Extensions considered usable audio tracks
pub const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "m4a", "aac", "flac", "ogg"];

/// Extensions considered usable background music
pub const MUSIC_EXTENSIONS: [&str; 3] = ["mp3", "wav", "aac"];

/// One source file scheduled for processing
///
/// Consumption is a two-step affair: the driver MARKS an item once its
/// output is written, and a separate sweep deletes marked sources.
/// Keeping the steps apart means a crashed batch leaves unconsumed
/// inputs on disk for retry or audit.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub path: PathBuf,
    consumed: bool,
}

impl WorkItem {
    pub fn consumed(&self) -> bool {
        self.consumed
    }
}

/// The work-item list for one batch
///
/// Produced once from a directory listing; iteration never depends on
/// directory mutation.
#[derive(Debug)]
pub struct WorkSet {
    items: Vec<WorkItem>,
}

impl WorkSet {
    /// Collect the sorted, extension-filtered regular files of `dir`
    pub fn from_dir(dir: &Path, extensions: &[&str]) -> Result<WorkSet> {
        let mut paths = list_files(dir, Some(extensions))?;
        paths.sort();

        Ok(WorkSet {
            items: paths
                .into_iter()
                .map(|path| WorkItem { path, consumed: false })
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.items.iter().map(|i| i.path.clone()).collect()
    }

    /// Mark the item at `index` as consumed
    pub fn mark_consumed(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            item.consumed = true;
        }
    }

    /// Delete every marked source file
    ///
    /// Returns how many files were removed. A deletion failure is
    /// logged and skipped; the output already exists at that point.
    pub fn sweep_consumed(&mut self) -> usize {
        let mut removed = 0;
        for item in self.items.iter_mut().filter(|i| i.consumed) {
            match fs::remove_file(&item.path) {
                Ok(()) => {
                    debug!("Consumed input {:?}", item.path);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove consumed input {:?}: {}", item.path, e),
            }
        }
        removed
    }
}

/// Clear a folder of its regular files
///
/// Creates the folder when missing. Only direct children that are
/// regular files are removed — subdirectories and their contents stay.
/// With an extension filter, only matching files (case-insensitive) go.
pub fn clear_folder(dir: &Path, extensions: Option<&[&str]>) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if matches_extension(&path, extensions) {
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}

/// Find the audio track of a folder: first match by sorted name
pub fn find_audio(dir: &Path) -> Result<PathBuf> {
    let mut files = list_files(dir, Some(&AUDIO_EXTENSIONS))?;
    files.sort();

    files.into_iter().next().ok_or_else(|| {
        BatchError::NoAudioFound { path: dir.display().to_string() }.into()
    })
}

/// Find the video clips of a folder, sorted by name
pub fn find_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = list_files(dir, Some(&VIDEO_EXTENSIONS))?;
    files.sort();

    if files.is_empty() {
        return Err(BatchError::NoVideosFound { path: dir.display().to_string() }.into());
    }
    Ok(files)
}

/// Find the images of a folder, sorted by name
pub fn find_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = list_files(dir, Some(&IMAGE_EXTENSIONS))?;
    files.sort();

    if files.is_empty() {
        return Err(BatchError::NoImagesFound { path: dir.display().to_string() }.into());
    }
    Ok(files)
}

/// Pick one random music file from a folder, if any
pub fn pick_random_music<R: Rng>(dir: &Path, rng: &mut R) -> Option<PathBuf> {
    let files = list_files(dir, Some(&MUSIC_EXTENSIONS)).ok()?;
    files.choose(rng).cloned()
}

fn list_files(dir: &Path, extensions: Option<&[&str]>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && matches_extension(&path, extensions) {
            files.push(path);
        }
    }

    Ok(files)
}

fn matches_extension(path: &Path, extensions: Option<&[&str]>) -> bool {
    let extensions = match extensions {
        Some(exts) => exts,
        None => return true,
    };

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            extensions.iter().any(|want| *want == e)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_clear_folder_removes_only_matching_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.mp4"));
        touch(&dir.path().join("b.MP4"));
        touch(&dir.path().join("keep.txt"));
        fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub/nested.mp4"));

        clear_folder(dir.path(), Some(&["mp4"])).unwrap();

        assert!(!dir.path().join("a.mp4").exists());
        assert!(!dir.path().join("b.MP4").exists());
        assert!(dir.path().join("keep.txt").exists());
        // Subdirectories are untouched
        assert!(dir.path().join("sub/nested.mp4").exists());
    }

    #[test]
    fn test_clear_folder_without_filter_removes_all_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.mp4"));
        touch(&dir.path().join("b.txt"));
        fs::create_dir(dir.path().join("sub")).unwrap();

        clear_folder(dir.path(), None).unwrap();

        assert!(!dir.path().join("a.mp4").exists());
        assert!(!dir.path().join("b.txt").exists());
        assert!(dir.path().join("sub").exists());
    }

    #[test]
    fn test_clear_folder_creates_missing_folder() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("fresh");

        clear_folder(&target, None).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_find_audio_takes_first_sorted_match() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b_song.mp3"));
        touch(&dir.path().join("a_song.wav"));
        touch(&dir.path().join("notes.txt"));

        let audio = find_audio(dir.path()).unwrap();
        assert_eq!(audio.file_name().unwrap(), "a_song.wav");
    }

    #[test]
    fn test_missing_resources_error_before_processing() {
        let dir = tempdir().unwrap();

        assert!(find_audio(dir.path()).is_err());
        assert!(find_videos(dir.path()).is_err());
        assert!(find_images(dir.path()).is_err());
    }

    #[test]
    fn test_workset_mark_and_sweep() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.mp4"));
        touch(&dir.path().join("b.mp4"));

        let mut set = WorkSet::from_dir(dir.path(), &["mp4"]).unwrap();
        assert_eq!(set.len(), 2);

        set.mark_consumed(0);
        // Marking alone must not touch the filesystem
        assert!(dir.path().join("a.mp4").exists());

        let removed = set.sweep_consumed();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("a.mp4").exists());
        assert!(dir.path().join("b.mp4").exists());
    }

    #[test]
    fn test_workset_is_sorted() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("c.mp4"));
        touch(&dir.path().join("a.mp4"));
        touch(&dir.path().join("b.mp4"));

        let set = WorkSet::from_dir(dir.path(), &["mp4"]).unwrap();
        let names: Vec<_> = set
            .items()
            .iter()
            .map(|i| i.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.mp4", "b.mp4", "c.mp4"]);
    }

    #[test]
    fn test_pick_random_music_ignores_other_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("song.mp3"));
        touch(&dir.path().join("cover.png"));

        let mut rng = rand::thread_rng();
        for _ in 0..5 {
            let pick = pick_random_music(dir.path(), &mut rng).unwrap();
            assert_eq!(pick.file_name().unwrap(), "song.mp3");
        }

        let empty = tempdir().unwrap();
        assert!(pick_random_music(empty.path(), &mut rng).is_none());
    }
}
