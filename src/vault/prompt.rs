//! PIN entry for the terminal.
//!
//! PINs are read without echo (termios on unix), validated to exactly four
//! digits, and handed out as `SecretString`. The raw digits never hit stdout
//! and are never persisted; they exist only between the prompt and the KDF.

use secrecy::SecretString;
use std::io::IsTerminal;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("io error")]
    Io(#[from] io::Error),

    #[error("PIN must be exactly 4 digits")]
    NotFourDigits,

    #[error("PINs do not match")]
    Mismatch,
}

/// Prompt for an existing PIN.
pub fn prompt_pin(label: &str) -> Result<SecretString, PromptError> {
    let pin = read_secret_line(label)?;
    validate_pin(&pin)?;
    Ok(SecretString::new(pin.into_boxed_str()))
}

/// Prompt for a new PIN, with confirmation.
pub fn prompt_new_pin(label: &str, confirm_label: &str) -> Result<SecretString, PromptError> {
    let first = read_secret_line(label)?;
    validate_pin(&first)?;
    let confirm = read_secret_line(confirm_label)?;
    if first != confirm {
        return Err(PromptError::Mismatch);
    }
    Ok(SecretString::new(first.into_boxed_str()))
}

fn validate_pin(pin: &str) -> Result<(), PromptError> {
    if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(PromptError::NotFourDigits);
    }
    Ok(())
}

fn read_secret_line(prompt: &str) -> Result<String, PromptError> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    if io::stdin().is_terminal() {
        #[cfg(unix)]
        {
            return read_line_no_echo_unix();
        }
    }

    read_line_plain()
}

fn read_line_plain() -> Result<String, PromptError> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(trim_line_endings(&line))
}

#[cfg(unix)]
fn read_line_no_echo_unix() -> Result<String, PromptError> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let stdin = io::stdin();
    let fd = stdin.as_raw_fd();

    unsafe {
        let mut original = MaybeUninit::<libc::termios>::uninit();
        if libc::tcgetattr(fd, original.as_mut_ptr()) != 0 {
            return read_line_plain();
        }
        let original = original.assume_init();

        let mut modified = original;
        modified.c_lflag &= !(libc::ECHO | libc::ECHONL);
        let _guard = TermiosGuard {
            fd,
            original,
            active: libc::tcsetattr(fd, libc::TCSANOW, &modified) == 0,
        };

        let line = read_line_plain()?;
        eprintln!();
        Ok(line)
    }
}

#[cfg(unix)]
struct TermiosGuard {
    fd: i32,
    original: libc::termios,
    active: bool,
}

#[cfg(unix)]
impl Drop for TermiosGuard {
    fn drop(&mut self) {
        if self.active {
            unsafe {
                let _ = libc::tcsetattr(self.fd, libc::TCSANOW, &self.original);
            }
        }
    }
}

fn trim_line_endings(s: &str) -> String {
    s.trim_end_matches(&['\n', '\r'][..]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_four_digits_only() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("0000").is_ok());
        for bad in ["", "123", "12345", "12a4", "12.4", " 123"] {
            assert!(
                matches!(validate_pin(bad), Err(PromptError::NotFourDigits)),
                "{bad:?}"
            );
        }
    }
}
