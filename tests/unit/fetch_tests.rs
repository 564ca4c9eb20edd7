/*!
 * Tests for source file acquisition
 */

use anyhow::Result;

use codecast::errors::FetchError;
use codecast::fetch::{GithubTarget, GithubUrl, LocalFetcher};

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_githubUrl_parse_withBlobUrl_shouldExtractAllParts() {
    let url = GithubUrl::parse("https://github.com/acme/widgets/blob/dev/src/app/main.py").unwrap();
    assert_eq!(url.owner, "acme");
    assert_eq!(url.repo, "widgets");
    assert_eq!(url.branch, "dev");
    assert_eq!(url.path, "src/app/main.py");
    assert_eq!(url.target, GithubTarget::File);
}

#[test]
fn test_githubUrl_parse_withTreeUrl_shouldAllowEmptyPath() {
    let url = GithubUrl::parse("https://github.com/acme/widgets/tree/main").unwrap();
    assert_eq!(url.path, "");
    assert_eq!(url.target, GithubTarget::Directory);
}

#[test]
fn test_githubUrl_parse_withBlobUrlMissingPath_shouldReject() {
    let result = GithubUrl::parse("https://github.com/acme/widgets/blob/main");
    assert!(matches!(result, Err(FetchError::MalformedUrl(_))));
}

#[test]
fn test_githubUrl_parse_withUnsupportedSegment_shouldReject() {
    for url in [
        "https://github.com/acme/widgets/pulls/42",
        "https://github.com/acme",
        "https://example.com/acme/widgets/blob/main/a.py",
        "not a url at all",
    ] {
        assert!(
            matches!(GithubUrl::parse(url), Err(FetchError::MalformedUrl(_))),
            "expected rejection for {}",
            url
        );
    }
}

#[test]
fn test_localFetcher_withDirectory_shouldCollectRelativePathsSorted() -> Result<()> {
    let dir = create_temp_dir()?;
    let root = dir.path().to_path_buf();
    create_test_file(&root, "b.py", "print('b')")?;
    create_test_file(&root, "a.py", "print('a')")?;
    create_test_file(&root, "nested/c.py", "print('c')")?;

    let files = LocalFetcher::new().fetch(&root, &[])?;
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

    assert_eq!(paths, vec!["a.py", "b.py", "nested/c.py"]);
    assert_eq!(files[0].content, "print('a')");
    Ok(())
}

#[test]
fn test_localFetcher_withExtensionFilter_shouldDropOtherFiles() -> Result<()> {
    let dir = create_temp_dir()?;
    let root = dir.path().to_path_buf();
    create_test_file(&root, "keep.py", "pass")?;
    create_test_file(&root, "drop.md", "# notes")?;
    create_test_file(&root, "Makefile", "all:")?;

    let files = LocalFetcher::new().fetch(&root, &["py".to_string()])?;
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

    assert_eq!(paths, vec!["keep.py"]);
    Ok(())
}

#[test]
fn test_localFetcher_withSingleFile_shouldIgnoreFilter() -> Result<()> {
    let dir = create_temp_dir()?;
    let root = dir.path().to_path_buf();
    let path = create_test_file(&root, "notes.md", "# hi")?;

    let files = LocalFetcher::new().fetch(&path, &["py".to_string()])?;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "notes.md");
    assert_eq!(files[0].content, "# hi");
    Ok(())
}

#[test]
fn test_localFetcher_withMissingPath_shouldReturnNotFound() {
    let result = LocalFetcher::new().fetch(std::path::Path::new("/no/such/dir"), &[]);
    assert!(matches!(result, Err(FetchError::NotFound(_))));
}
