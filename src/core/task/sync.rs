use crate::core::error::{TransferError, TransferResult};
use super::executor::{TaskExecutor, TransferOutcome};
use super::payload::{SyncPayload, SyncSource};
use super::progress::ExecContext;

/// 后续步骤（单次元数据调用）计入进度的固定增量
pub const POST_STEP_INCREMENT: u64 = 1;

/// 同步任务：内部下载成功后执行移动；两步都成功才算成功
///
/// 内部下载的进度原样转发；后续步骤不单独计量，完成时进度加一个固定增量。
pub async fn run_sync(
    executor: &TaskExecutor,
    payload: &SyncPayload,
    cx: &ExecContext,
) -> TransferResult<TransferOutcome> {
    let outcome = match &payload.source {
        SyncSource::Download(p) => executor.io.download(p, cx).await?,
        SyncSource::DownloadLink(p) => executor.io.download_link(p, cx).await?,
    };

    if cx.cancel.is_cancelled() {
        return Err(TransferError::Cancelled);
    }

    if payload.trash_on_finish {
        executor.files.move_to_trash(&outcome).await?;
    } else {
        executor.files.move_to_folder(&outcome, &payload.folder_id).await?;
    }

    let latest = cx.progress.latest();
    cx.progress.report(
        latest.transferred + POST_STEP_INCREMENT,
        latest.total + POST_STEP_INCREMENT,
    );
    cx.progress.flush();

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::executor::{RemoteFiles, TransferIo};
    use crate::core::task::model::Progress;
    use crate::core::task::payload::*;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::sync::Arc;
    use uuid::Uuid;

    struct FakeIo {
        result: TransferResult<TransferOutcome>,
    }

    #[async_trait(?Send)]
    impl TransferIo for FakeIo {
        async fn upload(&self, _p: &UploadPayload, _cx: &ExecContext) -> TransferResult<TransferOutcome> {
            Err(TransferError::Unsupported("upload".into()))
        }

        async fn download(&self, _p: &DownloadPayload, cx: &ExecContext) -> TransferResult<TransferOutcome> {
            cx.progress.report(100, 100);
            self.result.clone()
        }

        async fn download_link(&self, p: &DownloadLinkPayload, cx: &ExecContext) -> TransferResult<TransferOutcome> {
            self.download(&DownloadPayload {
                url: p.url.clone(),
                pwd: None,
                url_type: UrlType::File,
                name: p.name.clone(),
                dir: p.dir.clone(),
                merge: false,
            }, cx).await
        }
    }

    #[derive(Default)]
    struct FakeFiles {
        fail: bool,
        calls: RefCell<Vec<String>>,
    }

    #[async_trait(?Send)]
    impl RemoteFiles for FakeFiles {
        async fn move_to_trash(&self, _o: &TransferOutcome) -> TransferResult<()> {
            self.calls.borrow_mut().push("trash".into());
            if self.fail { Err(TransferError::network("trash 接口超时")) } else { Ok(()) }
        }

        async fn move_to_folder(&self, _o: &TransferOutcome, folder_id: &str) -> TransferResult<()> {
            self.calls.borrow_mut().push(format!("move:{}", folder_id));
            if self.fail { Err(TransferError::network("move 接口超时")) } else { Ok(()) }
        }
    }

    fn sync_payload(trash_on_finish: bool) -> SyncPayload {
        SyncPayload {
            folder_id: "42".into(),
            trash_on_finish,
            source: SyncSource::DownloadLink(DownloadLinkPayload {
                url: "https://example.com/a.bin".into(),
                dir: PathBuf::from("./downloads"),
                name: "a.bin".into(),
            }),
        }
    }

    fn ok_outcome() -> TransferResult<TransferOutcome> {
        Ok(TransferOutcome { remote_id: Some("f1".into()), local_path: None, bytes: 100 })
    }

    #[actix::test]
    async fn test_sync_runs_post_step_after_download() {
        let files = Arc::new(FakeFiles::default());
        let executor = TaskExecutor::new(Arc::new(FakeIo { result: ok_outcome() }), files.clone());
        let cx = ExecContext::detached(Uuid::new_v4());

        let outcome = run_sync(&executor, &sync_payload(false), &cx).await.unwrap();
        assert_eq!(outcome.bytes, 100);
        assert_eq!(*files.calls.borrow(), vec!["move:42".to_string()]);
        assert_eq!(cx.progress.latest(), Progress { transferred: 101, total: 101 });
    }

    #[actix::test]
    async fn test_sync_inner_failure_skips_post_step() {
        let files = Arc::new(FakeFiles::default());
        let io = FakeIo { result: Err(TransferError::QuotaExceeded("满了".into())) };
        let executor = TaskExecutor::new(Arc::new(io), files.clone());
        let cx = ExecContext::detached(Uuid::new_v4());

        let err = run_sync(&executor, &sync_payload(true), &cx).await.unwrap_err();
        assert_eq!(err, TransferError::QuotaExceeded("满了".into()));
        assert!(files.calls.borrow().is_empty());
    }

    #[actix::test]
    async fn test_sync_post_step_failure_fails_task() {
        let files = Arc::new(FakeFiles { fail: true, ..FakeFiles::default() });
        let executor = TaskExecutor::new(Arc::new(FakeIo { result: ok_outcome() }), files.clone());
        let cx = ExecContext::detached(Uuid::new_v4());

        let err = run_sync(&executor, &sync_payload(true), &cx).await.unwrap_err();
        assert_eq!(err, TransferError::network("trash 接口超时"));
        assert_eq!(*files.calls.borrow(), vec!["trash".to_string()]);
    }
}
