use super::*;
use std::collections::HashSet;

const ALL_KINDS: [ErrorKind; 9] = [
    ErrorKind::DeviceInit,
    ErrorKind::SwapchainCreation,
    ErrorKind::SwapchainOutOfDate,
    ErrorKind::AcquireTimeout,
    ErrorKind::FrameTimeout,
    ErrorKind::Present,
    ErrorKind::Backend,
    ErrorKind::InvalidState,
    ErrorKind::OutOfMemory,
];

#[test]
fn test_exit_codes_are_distinct() {
    let codes: HashSet<u8> = ALL_KINDS.iter().map(|&kind| exit_code(kind)).collect();
    assert_eq!(codes.len(), ALL_KINDS.len());
}

#[test]
fn test_exit_codes_avoid_success_and_generic_failure() {
    for kind in ALL_KINDS {
        let code = exit_code(kind);
        assert_ne!(code, 0, "{:?}", kind);
        assert_ne!(code, 1, "{:?}", kind);
    }
}

#[test]
fn test_exit_code_follows_error_kind() {
    let error = swapframe::Error::FrameTimeout("slot 0".to_string());
    assert_eq!(exit_code(error.kind()), 6);
    assert_eq!(exit_code(swapframe::Error::OutOfMemory.kind()), 10);
}
