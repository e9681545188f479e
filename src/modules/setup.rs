// First-run allowlist setup

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::modules::config::{self, ALLOWED_DOMAINS_VAR};
use crate::proxy::Allowlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowlistSource {
    Environment,
    EnvFile,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAllowlist {
    pub allowlist: Allowlist,
    pub source: AllowlistSource,
    /// Raw value to write back to the dotenv file, set only for prompted input
    pub persist: Option<String>,
}

/// Decide the allowlist from what is already configured, asking only when nothing is.
///
/// Precedence: process environment, then the persisted dotenv value (even an
/// empty one), then `prompt`.
pub fn resolve_allowlist<F>(
    env: Option<String>,
    persisted: Option<String>,
    prompt: F,
) -> AppResult<ResolvedAllowlist>
where
    F: FnOnce() -> AppResult<String>,
{
    if let Some(raw) = env {
        return Ok(ResolvedAllowlist {
            allowlist: Allowlist::parse(&raw),
            source: AllowlistSource::Environment,
            persist: None,
        });
    }

    if let Some(raw) = persisted {
        return Ok(ResolvedAllowlist {
            allowlist: Allowlist::parse(&raw),
            source: AllowlistSource::EnvFile,
            persist: None,
        });
    }

    let raw = prompt()?;
    Ok(ResolvedAllowlist {
        allowlist: Allowlist::parse(&raw),
        source: AllowlistSource::Prompt,
        persist: Some(raw.trim().to_string()),
    })
}

/// Load the allowlist for this process, running the interactive setup on first start.
/// `env` is the process environment value, if any. Blocks on stdin when prompting.
pub fn load_allowlist(env: Option<String>, env_path: &Path) -> AppResult<Allowlist> {
    let resolved = resolve_allowlist(
        env,
        config::read_env_file(env_path)?,
        || {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            prompt_allowed_domains(&mut input, &mut io::stdout())
        },
    )?;

    if let Some(raw) = &resolved.persist {
        config::write_env_file(env_path, raw).map_err(|e| {
            AppError::Config(format!("Failed to write {}: {}", env_path.display(), e))
        })?;
        tracing::info!("Saved {} to {}", ALLOWED_DOMAINS_VAR, env_path.display());
    }

    tracing::info!(
        "Allowlist source: {:?} ({} host(s))",
        resolved.source,
        resolved.allowlist.len()
    );
    Ok(resolved.allowlist)
}

/// Ask for the comma separated domain list on `output` and read one line from `input`.
pub fn prompt_allowed_domains<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> AppResult<String> {
    writeln!(output, "Welcome! It seems you have not set up your .env file yet.")?;
    writeln!(
        output,
        "Please enter a list of comma separated domain names to be whitelisted in the {} environment variable.",
        ALLOWED_DOMAINS_VAR
    )?;
    writeln!(output, "\nExample: waka.hackclub.com,api.wakatime.com\n")?;
    write!(output, "> ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(AppError::Config(format!(
            "No input available for {}; set it in the environment or in {}",
            ALLOWED_DOMAINS_VAR,
            config::ENV_FILE
        )));
    }

    writeln!(output, "\nGreat - you're all set!")?;
    Ok(line.trim().to_string())
}
