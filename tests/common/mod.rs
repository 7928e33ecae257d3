#![allow(dead_code)]

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

/// Stand-in converter: writes the output file and records its arguments,
/// stdin and `PANDOC_OUTPUT_DIR` alongside it.
pub const FAKE_PANDOC: &str = r#"#!/bin/sh
out=""
for arg in "$@"; do
  case "$arg" in
    --output=*) out="${arg#--output=}" ;;
  esac
done
cat > "$out.stdin"
printf '%s\n' "$@" > "$out.args"
printf '%s' "$PANDOC_OUTPUT_DIR" > "$out.outdir"
printf 'converted\n' > "$out"
"#;

pub const FAILING_PANDOC: &str =
    "#!/bin/sh\necho 'pandoc: Could not find data file templates/default.nope' >&2\nexit 97\n";

pub fn write_script(path: &Path, body: &str) -> PathBuf {
    fs::write(path, body).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path.to_path_buf()
}

pub fn recorded_args(output: &Path) -> Vec<String> {
    let mut path = output.as_os_str().to_owned();
    path.push(".args");
    fs::read_to_string(path)
        .expect("args recorded")
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn was_invoked(output: &Path) -> bool {
    let mut path = output.as_os_str().to_owned();
    path.push(".args");
    Path::new(&path).exists()
}

pub struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl Server {
    pub fn spawn(pandoc: &Path, user_filter_dir: &Path, working_dir: &Path) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-pandoc"))
            .args(["serve", "--stdio"])
            .arg("--pandoc")
            .arg(pandoc)
            .arg("--user-filter-dir")
            .arg(user_filter_dir)
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn server");
        let stdin = child.stdin.take().expect("stdin available");
        let stdout = BufReader::new(child.stdout.take().expect("stdout available"));
        Self {
            child,
            stdin,
            stdout,
            next_id: 1,
        }
    }

    /// Writes one raw line that expects no reply (a notification or garbage).
    pub fn send_line(&mut self, line: &str) {
        writeln!(self.stdin, "{line}").expect("write line");
        self.stdin.flush().expect("flush");
    }

    pub fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let id = self.next_id;
        self.next_id += 1;
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        let serialized = serde_json::to_string(&request).expect("serialize");
        writeln!(self.stdin, "{serialized}").expect("write request");
        self.stdin.flush().expect("flush");

        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        let response: serde_json::Value = serde_json::from_str(line.trim()).expect("json response");
        assert_eq!(response.get("id").and_then(|v| v.as_u64()), Some(id));
        response
    }

    pub fn call_tool(&mut self, name: &str, arguments: serde_json::Value) -> serde_json::Value {
        let response = self.request(
            "tools/call",
            serde_json::json!({ "name": name, "arguments": arguments }),
        );
        response.get("result").cloned().expect("result present")
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn error_kind(result: &serde_json::Value) -> Option<&str> {
    result
        .get("structuredContent")
        .and_then(|value| value.get("error"))
        .and_then(|value| value.get("kind"))
        .and_then(|value| value.as_str())
}

pub fn is_error(result: &serde_json::Value) -> Option<bool> {
    result.get("isError").and_then(|v| v.as_bool())
}
