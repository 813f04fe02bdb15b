use std::io::Write;

/// The process environment a command runs in.
///
/// Commands write their results and summaries through this trait and request the exit status
/// through it, so a whole invocation can run in-process with captured output.
pub trait Host: Send + Sync {
    /// Destination for command results (stdout for the real binary).
    fn output(&mut self) -> impl Write;

    /// Destination for the end-of-run error report (stderr for the real binary).
    fn error(&mut self) -> impl Write;

    /// Terminate the process with `code`. In-process hosts record the code and return.
    fn exit(&mut self, code: i32);
}

/// Host capturing output in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
impl TestHost {
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}
