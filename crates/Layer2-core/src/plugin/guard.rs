//! Panic Guard - 플러그인 콜백 보호
//!
//! 훅 안의 패닉이 호스트로 전파되지 않아야 한다. 모든 경계 함수는
//! [`guarded`]를 거쳐 호출하고 패닉 내용을 타입 있는 에러로 바꾼다.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// 패닉 payload에서 메시지 추출
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

/// `f` 실행 (패닉 시 `Err(메시지)`)
pub(crate) fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_ok() {
        assert_eq!(guarded(|| 2 + 2), Ok(4));
    }

    #[test]
    fn test_guarded_panic_str() {
        let result: Result<(), String> = guarded(|| panic!("boom"));
        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn test_guarded_panic_string() {
        let id = "iso";
        let result: Result<(), String> = guarded(|| panic!("{} exploded", id));
        assert_eq!(result, Err("iso exploded".to_string()));
    }
}
