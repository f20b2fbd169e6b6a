//! Fault isolation - 훅/실행기 패닉을 에러로 변환

use futures::FutureExt;
use kiln_foundation::{Error, Result};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// 퓨처를 실행하고 패닉을 `Error::Execution`으로 변환
pub(crate) async fn guarded<T, F>(label: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(Error::execution(
            format!("{} panicked: {}", label, panic_message(payload.as_ref())),
            None,
        )),
    }
}

/// 패닉 페이로드에서 메시지 추출
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_result() {
        let ok: Result<u32> = guarded("hook", async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32> = guarded("hook", async { Err(Error::Validation("bad".into())) }).await;
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    async fn explode() -> Result<()> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panic_becomes_execution_error() {
        let result = guarded("activate hook", explode()).await;

        match result {
            Err(Error::Execution { message, .. }) => {
                assert!(message.contains("activate hook panicked"));
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
