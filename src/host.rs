//! Host Environment Seam
//!
//! The interpreter core is a pure "source in, value or error out" pipeline;
//! everything that touches the outside world goes through the [`Host`] trait.
//! Built-ins like `PRINT`, `INPUT` and `RUN` are written against this trait,
//! which is what lets the test suite substitute a scripted host and assert on
//! captured output instead of driving a terminal.

use std::io::{self, BufRead, Write};
use std::process::Command;

/// The interpreter's window on the outside world.
pub trait Host {
    /// Writes one line of program output.
    fn print_line(&mut self, text: &str);

    /// Reads one line of input, without its trailing newline.
    fn read_line(&mut self) -> io::Result<String>;

    /// Clears the terminal, if there is one.
    fn clear_screen(&mut self);

    /// Loads the source of a script for the `RUN` built-in.
    fn load_script(&mut self, path: &str) -> io::Result<String>;
}

/// The standard host: stdout, stdin, the real terminal and the file system.
#[derive(Debug, Default)]
pub struct StdHost;

impl Host for StdHost {
    fn print_line(&mut self, text: &str) {
        println!("{}", text);
        let _ = io::stdout().flush();
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn clear_screen(&mut self) {
        let status = if cfg!(windows) {
            Command::new("cmd").args(["/C", "cls"]).status()
        } else {
            Command::new("clear").status()
        };
        if let Err(error) = status {
            log::warn!("could not clear the terminal: {}", error);
        }
    }

    fn load_script(&mut self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
