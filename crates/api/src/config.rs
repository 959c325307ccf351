use std::path::PathBuf;
use std::time::Duration;

use plyforge_core::generator::GeneratorConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`).
    ///
    /// Generous because the synchronous submission path blocks for the
    /// generator's full runtime.
    pub request_timeout_secs: u64,
    /// Root directory for per-job input directories.
    pub upload_root: PathBuf,
    /// Root directory for per-job output directories.
    pub output_root: PathBuf,
    /// External generator program.
    pub generator_bin: String,
    /// Fixed leading arguments for the generator.
    pub generator_args: Vec<String>,
    /// `HOME` to set for the generator process (inherited when unset).
    pub generator_home: Option<String>,
    /// Wall-clock limit for one generator invocation, in seconds.
    pub generation_timeout_secs: u64,
    /// Maximum number of concurrently running generator processes.
    pub max_concurrent_generations: usize,
    /// Maximum accepted multipart body size in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `600`                   |
    /// | `UPLOAD_ROOT`                | `tmp/uploads`           |
    /// | `OUTPUT_ROOT`                | `tmp/outputs`           |
    /// | `GENERATOR_BIN`              | `sharp`                 |
    /// | `GENERATOR_ARGS`             | `predict`               |
    /// | `GENERATOR_HOME`             | (inherit)               |
    /// | `GENERATION_TIMEOUT_SECS`    | `600`                   |
    /// | `MAX_CONCURRENT_GENERATIONS` | `2`                     |
    /// | `MAX_UPLOAD_BYTES`           | `104857600`             |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upload_root =
            PathBuf::from(std::env::var("UPLOAD_ROOT").unwrap_or_else(|_| "tmp/uploads".into()));
        let output_root =
            PathBuf::from(std::env::var("OUTPUT_ROOT").unwrap_or_else(|_| "tmp/outputs".into()));

        let generator_bin = std::env::var("GENERATOR_BIN").unwrap_or_else(|_| "sharp".into());

        let generator_args: Vec<String> = std::env::var("GENERATOR_ARGS")
            .unwrap_or_else(|_| "predict".into())
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let generator_home = std::env::var("GENERATOR_HOME").ok();

        let generation_timeout_secs: u64 = std::env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("GENERATION_TIMEOUT_SECS must be a valid u64");

        let max_concurrent_generations: usize = std::env::var("MAX_CONCURRENT_GENERATIONS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("MAX_CONCURRENT_GENERATIONS must be a valid usize");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "104857600".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_root,
            output_root,
            generator_bin,
            generator_args,
            generator_home,
            generation_timeout_secs,
            max_concurrent_generations,
            max_upload_bytes,
        }
    }

    /// Build the process-wide generator invocation configuration.
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut env = Vec::new();
        if let Some(home) = &self.generator_home {
            env.push(("HOME".to_string(), home.clone()));
        }

        GeneratorConfig {
            program: self.generator_bin.clone(),
            base_args: self.generator_args.clone(),
            env,
            timeout: Duration::from_secs(self.generation_timeout_secs),
        }
    }
}
