//! In-process Lua sandbox.
//!
//! Untrusted snippets get a VM with file, process and module loading
//! removed, `print` redirected into a buffer, and an instruction hook that
//! aborts execution once the deadline passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dispatch_domain::tool::Outcome;
use mlua::{HookTriggers, Lua, Value, Variadic, VmState};

/// Instructions between deadline checks.
const HOOK_INTERVAL: u32 = 10_000;

/// Strip everything that reaches outside the VM.
///
/// Keeps `string`, `table`, `math`, `utf8`, `coroutine` and the
/// time-reading parts of `os`.
pub fn apply_sandbox(lua: &Lua) -> mlua::Result<()> {
    lua.load(
        r#"
        local time, clock, date = os.time, os.clock, os.date
        os = { time = time, clock = clock, date = date }
        io = nil
        package = nil
        require = nil
        load = nil
        loadfile = nil
        dofile = nil
        debug = nil
        collectgarbage = nil
    "#,
    )
    .exec()
}

fn run(code: &str, timeout: Duration, timed_out: Arc<AtomicBool>) -> mlua::Result<String> {
    let lua = Lua::new();
    apply_sandbox(&lua)?;

    let buffer = Arc::new(Mutex::new(String::new()));
    let sink = buffer.clone();
    let print = lua.create_function(move |_, args: Variadic<Value>| {
        let line = args
            .iter()
            .map(|v| v.to_string().unwrap_or_else(|_| format!("{:?}", v)))
            .collect::<Vec<_>>()
            .join("\t");
        if let Ok(mut out) = sink.lock() {
            out.push_str(&line);
            out.push('\n');
        }
        Ok(())
    })?;
    lua.globals().set("print", print)?;

    let deadline = Instant::now() + timeout;
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(HOOK_INTERVAL),
        move |_lua, _debug| {
            if Instant::now() >= deadline {
                timed_out.store(true, Ordering::SeqCst);
                Err(mlua::Error::runtime("execution deadline exceeded"))
            } else {
                Ok(VmState::Continue)
            }
        },
    );

    lua.load(code).set_name("tool-call").exec()?;

    let output = buffer.lock().map(|out| out.clone()).unwrap_or_default();
    Ok(output)
}

/// Run a Lua snippet to completion. Blocking; call from a blocking task.
pub fn execute_lua(code: &str, timeout: Duration) -> Outcome {
    let timed_out = Arc::new(AtomicBool::new(false));
    match run(code, timeout, timed_out.clone()) {
        Ok(output) if output.trim().is_empty() => {
            Outcome::completed("Lua code executed successfully (no output)")
        }
        Ok(output) => Outcome::completed(output.trim_end_matches('\n')),
        Err(_) if timed_out.load(Ordering::SeqCst) => Outcome::timeout(format!(
            "Lua command timed out after {}s",
            timeout.as_secs()
        )),
        Err(e) => Outcome::execution_failure(format!("Lua error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain::tool::FailureKind;

    #[test]
    fn test_print_is_captured() {
        let outcome = execute_lua("print('hello', 42)\nprint(1 + 1)", Duration::from_secs(5));
        assert_eq!(outcome, Outcome::completed("hello\t42\n2"));
    }

    #[test]
    fn test_no_output() {
        let outcome = execute_lua("local x = 1", Duration::from_secs(5));
        assert_eq!(outcome.text(), "Lua code executed successfully (no output)");
    }

    #[test]
    fn test_sandbox_removes_io_and_os_execute() {
        let lua = Lua::new();
        apply_sandbox(&lua).unwrap();
        let io: Value = lua.globals().get("io").unwrap();
        assert_eq!(io, Value::Nil);
        let execute: Value = lua.load("os.execute").eval().unwrap();
        assert_eq!(execute, Value::Nil);
        let time: Value = lua.load("os.time").eval().unwrap();
        assert!(matches!(time, Value::Function(_)));
        let upper: String = lua.load("string.upper('ok')").eval().unwrap();
        assert_eq!(upper, "OK");
    }

    #[test]
    fn test_escape_attempt_fails() {
        let outcome = execute_lua("io.open('/etc/passwd')", Duration::from_secs(5));
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ExecutionFailure));
        assert!(outcome.text().starts_with("Lua error:"));
    }

    #[test]
    fn test_infinite_loop_times_out() {
        let started = Instant::now();
        let outcome = execute_lua("while true do end", Duration::from_millis(200));
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ExecutionTimeout));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
