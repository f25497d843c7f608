use super::*;
use crate::encode::stream::ContainerType;
use crate::foundation::core::UnixMillis;

struct FailingDownload;

impl DownloadTarget for FailingDownload {
    fn download(&mut self, _artifact: &Artifact) -> ArResult<()> {
        Err(crate::ArError::validation("disk full"))
    }
}

fn still() -> Artifact {
    Artifact::still(vec![1, 2, 3], UnixMillis(7))
}

fn request() -> ShareRequest {
    ShareRequest::titled("AR Screenshot").with_text("hi")
}

#[test]
fn accepted_share_skips_download() {
    let mut share = ScriptedShare::new(ShareResponse::Accept);
    let mut downloads = InMemoryDownloads::new();
    let d = dispose(&still(), &request(), &mut share, &mut downloads).unwrap();
    assert_eq!(d, Disposition::Shared);
    assert!(downloads.is_empty());
    assert_eq!(share.requests(), vec![("screenshot-7.png".to_string(), request())]);
}

#[test]
fn cancel_and_failure_fall_back_to_download() {
    for (response, outcome) in [
        (ShareResponse::Cancel, ShareOutcome::Cancelled),
        (
            ShareResponse::Fail("no app".to_string()),
            ShareOutcome::Failed("no app".to_string()),
        ),
    ] {
        let mut share = ScriptedShare::new(response);
        let mut downloads = InMemoryDownloads::new();
        let d = dispose(&still(), &request(), &mut share, &mut downloads).unwrap();
        assert_eq!(d, Disposition::Downloaded { share: outcome });
        assert_eq!(downloads.artifacts(), vec![still()]);
    }
}

#[test]
fn unsupported_share_is_never_attempted() {
    let mut share = ScriptedShare::new(ShareResponse::Accept).only_mimes(&["image/png"]);
    let mut downloads = InMemoryDownloads::new();
    let rec = Artifact::recording(ContainerType::Webm, vec![9], UnixMillis(1));
    let d = dispose(&rec, &request(), &mut share, &mut downloads).unwrap();
    assert_eq!(
        d,
        Disposition::Downloaded {
            share: ShareOutcome::Unsupported
        }
    );
    assert!(share.requests().is_empty());

    let d = dispose(&rec, &request(), &mut NoShare, &mut downloads).unwrap();
    assert!(matches!(d, Disposition::Downloaded { .. }));
    assert_eq!(downloads.len(), 2);
}

#[test]
fn failing_download_is_a_capture_error() {
    let err = dispose(&still(), &request(), &mut NoShare, &mut FailingDownload).unwrap_err();
    assert!(matches!(err, CaptureError::Download(msg) if msg.contains("disk full")));
}

#[test]
fn directory_downloader_writes_named_file() {
    let dir = std::env::temp_dir().join(format!("arlens-dl-{}", std::process::id()));
    let mut dl = DirectoryDownloader::new(&dir);
    dl.download(&still()).unwrap();
    let written = std::fs::read(dir.join("screenshot-7.png")).unwrap();
    assert_eq!(written, vec![1, 2, 3]);
    let _ = std::fs::remove_dir_all(&dir);
}
