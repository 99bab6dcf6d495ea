//! Abort ("death test") harness.
//!
//! Contract violations call `std::process::abort()`, which cannot be
//! observed from inside the test that triggers it. [`assert_aborts`]
//! re-runs the calling test in a child process with an environment marker
//! set; the child executes the closure, the parent checks that the child
//! died abnormally and printed the expected diagnostic.

use std::env;
use std::process::Command;

/// Environment variable naming the test the child process should run.
pub const CHILD_ENV: &str = "SLOTBUF_DEATH_TEST";

#[cfg(unix)]
const SIGABRT: i32 = 6;

/// Assert that `body` aborts the process and writes `expected` to stderr.
///
/// `test_name` must be the exact libtest name of the calling test (for a
/// top-level function in an integration test file, just its name).
///
/// ```ignore
/// #[test]
/// fn get_past_end_aborts() {
///     assert_aborts("get_past_end_aborts", "index out of bounds", || {
///         let buf = RawBuffer::allocate(1, 1).unwrap();
///         buf.get(0);
///     });
/// }
/// ```
pub fn assert_aborts<F: FnOnce()>(test_name: &str, expected: &str, body: F) {
    if env::var(CHILD_ENV).as_deref() == Ok(test_name) {
        body();
        // Reaching this line means no abort; a clean exit fails the parent.
        std::process::exit(0);
    }

    let exe = env::current_exe().expect("test binary path");
    let output = Command::new(exe)
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, test_name)
        .output()
        .expect("failed to spawn child test process");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !output.status.success(),
        "`{test_name}` returned normally instead of aborting; stderr:\n{stderr}"
    );
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(
            output.status.signal(),
            Some(SIGABRT),
            "`{test_name}` did not die from SIGABRT; stderr:\n{stderr}"
        );
    }
    assert!(
        stderr.contains(expected),
        "`{test_name}` stderr lacks {expected:?}:\n{stderr}"
    );
}
