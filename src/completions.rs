use std::io;
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;
use crate::cli::{styled_command, BIN_NAME};
use crate::store::write_atomic;

pub fn render_completions(shell: Shell) -> Vec<u8> {
    let mut command = styled_command();
    let mut script = Vec::new();
    generate(shell, &mut command, BIN_NAME, &mut script);
    script
}

/// Where an installed script lives, relative to `$HOME`.
fn script_path(shell: Shell, home: &Path) -> Option<PathBuf> {
    let relative = match shell {
        Shell::Bash => ".local/share/bash-completion/completions/propbook",
        Shell::Zsh => ".zfunc/_propbook",
        Shell::Fish => ".config/fish/completions/propbook.fish",
        _ => return None,
    };
    Some(home.join(relative))
}

/// Zsh only finds `_propbook` when its directory is on `fpath`.
const ZSH_FPATH_LINE: &str = "fpath=(~/.zfunc $fpath)";

fn ensure_zsh_fpath(home: &Path) -> io::Result<bool> {
    let zshrc = home.join(".zshrc");
    let existing = match std::fs::read_to_string(&zshrc) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err),
    };
    if existing.lines().any(|line| line.trim() == ZSH_FPATH_LINE) {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str("# propbook completions\n");
    updated.push_str(ZSH_FPATH_LINE);
    updated.push_str("\nautoload -U compinit && compinit\n");
    write_atomic(&zshrc, updated.as_bytes())?;
    Ok(true)
}

fn install_into(shell: Shell, home: &Path) -> Result<PathBuf, AppError> {
    let path = script_path(shell, home).ok_or_else(|| {
        AppError::InvalidArgument(format!("--install does not support {shell}; redirect stdout instead"))
    })?;
    write_atomic(&path, &render_completions(shell))?;
    if shell == Shell::Zsh && ensure_zsh_fpath(home)? {
        tracing::info!(rc = %home.join(".zshrc").display(), "added completions directory to fpath");
    }
    Ok(path)
}

fn home_dir() -> Result<PathBuf, AppError> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| AppError::InvalidArgument("HOME is not set".to_string()))
}

pub fn run_completions_command(shell: Option<Shell>, install: bool) -> Result<(), AppError> {
    let shell = shell.or_else(Shell::from_env).ok_or_else(|| {
        AppError::InvalidArgument(
            "could not detect a shell from $SHELL; name one, e.g. `propbook completions bash`"
                .to_string(),
        )
    })?;

    if install {
        let path = install_into(shell, &home_dir()?)?;
        println!("installed {shell} completions to {}", path.display());
    } else {
        use std::io::Write;
        let mut stdout = io::stdout().lock();
        stdout.write_all(&render_completions(shell))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn fake_home() -> PathBuf {
        let home = std::env::temp_dir().join(format!("propbook-home-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&home).expect("home should be creatable");
        home
    }

    #[test]
    fn scripts_mention_the_binary_and_its_commands() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let script = String::from_utf8(render_completions(shell)).expect("utf8 script");
            assert!(script.contains(BIN_NAME), "{shell} script names the binary");
            assert!(script.contains("repair"), "{shell} script completes repair");
        }
    }

    #[test]
    fn bash_and_fish_install_under_home() {
        let home = fake_home();
        let bash = install_into(Shell::Bash, &home).expect("bash install");
        assert_eq!(
            bash,
            home.join(".local/share/bash-completion/completions/propbook")
        );
        let fish = install_into(Shell::Fish, &home).expect("fish install");
        assert!(fish.ends_with("fish/completions/propbook.fish"));
        assert!(std::fs::read_to_string(fish)
            .expect("fish script")
            .contains("propbook"));
        assert!(!home.join(".zshrc").exists());

        let _ = std::fs::remove_dir_all(home);
    }

    #[test]
    fn zsh_install_adds_fpath_once() {
        let home = fake_home();
        std::fs::write(home.join(".zshrc"), "export EDITOR=vim").expect("seed zshrc");

        let path = install_into(Shell::Zsh, &home).expect("zsh install");
        assert_eq!(path, home.join(".zfunc/_propbook"));
        install_into(Shell::Zsh, &home).expect("second zsh install");

        let rc = std::fs::read_to_string(home.join(".zshrc")).expect("zshrc");
        assert!(rc.starts_with("export EDITOR=vim\n"));
        assert_eq!(rc.matches(ZSH_FPATH_LINE).count(), 1);

        let _ = std::fs::remove_dir_all(home);
    }

    #[test]
    fn unsupported_install_targets_are_rejected() {
        let home = fake_home();
        let err = install_into(Shell::Elvish, &home).expect_err("no elvish install path");
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert!(script_path(Shell::PowerShell, &home).is_none());

        let _ = std::fs::remove_dir_all(home);
    }
}
