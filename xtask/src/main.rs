//! Workspace maintenance commands (`cargo xtask`).
//!
//! Builds the offline worker bundle: compiles `offline_worker` for `wasm32`, generates the
//! `wasm-bindgen` bindings, and appends the service-worker listener glue to produce `sw.js`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, Stdio};

use offline_worker::{append_worker_listeners, WorkerConfig};

const WASM_TARGET: &str = "wasm32-unknown-unknown";
const WORKER_CRATE: &str = "offline_worker";
const DEFAULT_OUT_DIR: &str = "target/worker-dist";
const WORKER_SCRIPT: &str = "sw.js";
const DEFAULT_PUBLIC_PATH: &str = "/";

fn main() -> ExitCode {
    let root = workspace_root();
    let mut args = env::args().skip(1);

    let Some(cmd) = args.next() else {
        print_usage();
        return ExitCode::from(2);
    };

    let rest: Vec<String> = args.collect();

    let result = match cmd.as_str() {
        "setup-worker" => setup_worker(&root),
        "build-worker" => parse_build_args(rest).and_then(|args| build_worker(&root, &args)),
        "verify" => verify(&root),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown xtask command: {other}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

fn print_usage() {
    eprintln!(
        "Usage: cargo xtask <command> [args]\n\
         \n\
         Commands:\n\
           setup-worker        Install the wasm target and wasm-bindgen-cli (if missing)\n\
           build-worker [...]  Build the worker bundle (--release, --config <file>, --out-dir <dir>,\n\
                               --public-path <url path the bundle is served from>)\n\
           verify              Run fmt, clippy and tests for the workspace\n"
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BuildWorkerArgs {
    release: bool,
    config: Option<PathBuf>,
    out_dir: PathBuf,
    public_path: String,
}

impl BuildWorkerArgs {
    fn wasm_url_path(&self) -> String {
        let prefix = self.public_path.trim_end_matches('/');
        format!("{prefix}/{WORKER_CRATE}_bg.wasm")
    }
}

fn parse_build_args(args: Vec<String>) -> Result<BuildWorkerArgs, String> {
    let mut parsed = BuildWorkerArgs {
        release: false,
        config: None,
        out_dir: PathBuf::from(DEFAULT_OUT_DIR),
        public_path: DEFAULT_PUBLIC_PATH.to_string(),
    };

    let mut i = 0usize;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--release" => {
                parsed.release = true;
                i += 1;
                continue;
            }
            "--config" | "--out-dir" | "--public-path" => {
                let Some(value) = args.get(i + 1) else {
                    return Err(format!("missing value for `{arg}`"));
                };
                match arg.as_str() {
                    "--config" => parsed.config = Some(PathBuf::from(value)),
                    "--out-dir" => parsed.out_dir = PathBuf::from(value),
                    _ => parsed.public_path = value.clone(),
                }
                i += 2;
                continue;
            }
            _ => {}
        }

        if let Some(value) = arg.strip_prefix("--config=") {
            parsed.config = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--out-dir=") {
            parsed.out_dir = PathBuf::from(value);
        } else if let Some(value) = arg.strip_prefix("--public-path=") {
            parsed.public_path = value.to_string();
        } else {
            return Err(format!("unknown build-worker argument: {arg}"));
        }
        i += 1;
    }

    if !parsed.public_path.starts_with('/') {
        return Err(format!(
            "`--public-path` must start with `/`, got `{}`",
            parsed.public_path
        ));
    }
    Ok(parsed)
}

fn setup_worker(root: &Path) -> Result<(), String> {
    run(root, "rustup", vec!["target", "add", WASM_TARGET])?;

    if command_available("wasm-bindgen") {
        println!("wasm-bindgen already installed");
        return Ok(());
    }

    run(root, "cargo", vec!["install", "wasm-bindgen-cli"])
}

fn build_worker(root: &Path, args: &BuildWorkerArgs) -> Result<(), String> {
    ensure_command(
        "wasm-bindgen",
        "Install it with `cargo xtask setup-worker` (or `cargo install wasm-bindgen-cli`)",
    )?;
    let config = match &args.config {
        Some(path) => load_config(&root.join(path))?,
        None => WorkerConfig::default(),
    };

    let mut cargo_args = vec!["build", "-p", WORKER_CRATE, "--lib", "--target", WASM_TARGET];
    if args.release {
        cargo_args.push("--release");
    }
    run(root, "cargo", cargo_args)?;

    let profile = if args.release { "release" } else { "debug" };
    let wasm = root
        .join("target")
        .join(WASM_TARGET)
        .join(profile)
        .join(format!("{WORKER_CRATE}.wasm"));
    let out_dir = root.join(&args.out_dir);
    run_owned(
        root,
        "wasm-bindgen",
        vec![
            "--target".to_string(),
            "web".to_string(),
            "--out-dir".to_string(),
            out_dir.display().to_string(),
            wasm.display().to_string(),
        ],
    )?;

    let bindings_path = out_dir.join(format!("{WORKER_CRATE}.js"));
    let bindings = fs::read_to_string(&bindings_path)
        .map_err(|err| format!("failed to read {}: {err}", bindings_path.display()))?;
    let script = append_worker_listeners(bindings, &args.wasm_url_path(), &config)
        .map_err(|err| err.to_string())?;
    let script_path = out_dir.join(WORKER_SCRIPT);
    fs::write(&script_path, script)
        .map_err(|err| format!("failed to write {}: {err}", script_path.display()))?;

    println!(
        "worker bundle ready: {} (register it with {{ type: 'module' }})",
        script_path.display()
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<WorkerConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let is_toml = path.extension().and_then(|ext| ext.to_str()) == Some("toml");
    parse_config(&raw, is_toml).map_err(|err| format!("{}: {err}", path.display()))
}

fn parse_config(raw: &str, is_toml: bool) -> Result<WorkerConfig, String> {
    if !is_toml {
        return WorkerConfig::from_json(raw).map_err(|err| err.to_string());
    }
    let config: WorkerConfig = toml::from_str(raw).map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn verify(root: &Path) -> Result<(), String> {
    run(root, "cargo", vec!["fmt", "--all", "--", "--check"])?;
    run(
        root,
        "cargo",
        vec!["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )?;
    run(root, "cargo", vec!["test", "--workspace"])
}

fn command_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn ensure_command(program: &str, hint: &str) -> Result<(), String> {
    if command_available(program) {
        Ok(())
    } else {
        Err(format!("required command `{program}` not found. {hint}"))
    }
}

fn run(root: &Path, program: &str, args: Vec<&str>) -> Result<(), String> {
    let owned = args.into_iter().map(ToString::to_string).collect();
    run_owned(root, program, owned)
}

fn run_owned(root: &Path, program: &str, args: Vec<String>) -> Result<(), String> {
    print_command(program, &args);
    let status = Command::new(program)
        .current_dir(root)
        .args(&args)
        .status()
        .map_err(|err| format!("failed to start `{program}`: {err}"))?;

    if status.success() {
        Ok(())
    } else {
        Err(format!("`{program}` exited with status {status}"))
    }
}

fn print_command(program: &str, args: &[String]) {
    if args.is_empty() {
        println!("+ {program}");
        return;
    }

    println!("+ {program} {}", args.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn build_args_default_to_debug_bundle() {
        let parsed = parse_build_args(Vec::new()).expect("parse");
        assert!(!parsed.release);
        assert_eq!(parsed.config, None);
        assert_eq!(parsed.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
        assert_eq!(parsed.wasm_url_path(), "/offline_worker_bg.wasm");
    }

    #[test]
    fn build_args_accept_split_and_inline_values() {
        let parsed = parse_build_args(args(&[
            "--release",
            "--config",
            "worker.toml",
            "--out-dir=public",
            "--public-path",
            "/QRScout/",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            BuildWorkerArgs {
                release: true,
                config: Some(PathBuf::from("worker.toml")),
                out_dir: PathBuf::from("public"),
                public_path: "/QRScout/".to_string(),
            }
        );
        assert_eq!(parsed.wasm_url_path(), "/QRScout/offline_worker_bg.wasm");
    }

    #[test]
    fn build_args_reject_unknown_and_incomplete_flags() {
        assert!(parse_build_args(args(&["--watch"])).is_err());
        assert!(parse_build_args(args(&["--config"])).is_err());
        assert!(parse_build_args(args(&["--public-path=QRScout"])).is_err());
    }

    #[test]
    fn toml_config_fills_missing_fields_with_defaults() {
        let config = parse_config("cache_name = \"qrscout-v5\"\n", true).expect("config");
        assert_eq!(config.cache_name, "qrscout-v5");
        assert_eq!(config.sync_tag, WorkerConfig::default().sync_tag);
    }

    #[test]
    fn invalid_configs_are_rejected_in_both_formats() {
        assert!(parse_config("cache_name = \"\"\n", true).is_err());
        assert!(parse_config(r#"{"offline_fallback_path":"index.html"}"#, false).is_err());
    }
}
