/*!
 * Tests for file and directory utilities
 */

use std::path::Path;

use anyhow::Result;
use codecast::file_utils::FileManager;

use crate::common::create_temp_dir;

#[test]
fn test_ensureDir_withExistingDir_shouldBeIdempotent() -> Result<()> {
    let dir = create_temp_dir()?;
    FileManager::ensure_dir(dir.path())?;
    FileManager::ensure_dir(dir.path())?;
    assert!(FileManager::dir_exists(dir.path()));
    Ok(())
}

#[test]
fn test_writeToFile_shouldCreateMissingParents() -> Result<()> {
    let dir = create_temp_dir()?;
    let target = dir.path().join("deep/nested/out.md");

    FileManager::write_to_file(&target, "content")?;

    assert!(FileManager::file_exists(&target));
    assert_eq!(FileManager::read_to_string(&target)?, "content");
    Ok(())
}

#[test]
fn test_scriptOutputPath_withLocalPath_shouldSlugifyLastSegment() {
    let path = FileManager::script_output_path("src/app/main.py", Path::new("scripts"));
    assert_eq!(path, Path::new("scripts").join("main_py_script.md"));
}

#[test]
fn test_scriptOutputPath_withRepoUrl_shouldNameAfterRepo() {
    let path = FileManager::script_output_path(
        "https://github.com/acme/widgets",
        Path::new("scripts"),
    );
    assert_eq!(path, Path::new("scripts").join("widgets_script.md"));
}

#[test]
fn test_scriptOutputPath_withMixedCase_shouldLowercase() {
    let path = FileManager::script_output_path("MyRepo", Path::new("out"));
    assert_eq!(path, Path::new("out").join("myrepo_script.md"));
}
