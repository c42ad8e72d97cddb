use std::io::{self, BufRead as _, Write};

use anyhow::Context as _;
use console::Term;

#[derive(Debug)]
enum Inner {
    Term(Term),
    Buf {
        input: io::BufReader<io::Cursor<String>>,
        output: Vec<u8>,
    },
    Sink(io::Sink),
}

/// Config for console.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ConsoleConfig {
    /// If true, assumes yes and skips any confirmation.
    pub assume_yes: bool,
}

/// Human-facing output of the command line tool.
///
/// Everything written here goes to stderr so that stdout only carries the
/// command outcome.
#[derive(Debug)]
pub struct Console {
    inner: Inner,
    conf: ConsoleConfig,
}

impl Console {
    pub fn term(conf: ConsoleConfig) -> Self {
        Self {
            inner: Inner::Term(Term::stderr()),
            conf,
        }
    }

    pub fn buf(conf: ConsoleConfig) -> Self {
        Self {
            inner: Inner::Buf {
                input: io::BufReader::new(io::Cursor::new(String::new())),
                output: Vec::new(),
            },
            conf,
        }
    }

    pub fn sink(conf: ConsoleConfig) -> Self {
        Self {
            inner: Inner::Sink(io::sink()),
            conf,
        }
    }

    #[cfg(test)]
    fn write_input(&mut self, s: &str) {
        if let Inner::Buf { ref mut input, .. } = self.inner {
            input.get_mut().get_mut().push_str(s)
        }
    }

    fn take_buf(self) -> Option<Vec<u8>> {
        match self.inner {
            Inner::Buf { output: buf, .. } => Some(buf),
            _ => None,
        }
    }

    pub fn take_output(self) -> crate::Result<String> {
        self.take_buf()
            .context("Could not take buf from console")
            .and_then(|buf| Ok(String::from_utf8(buf)?))
    }

    #[inline]
    fn as_mut_write(&mut self) -> &mut dyn Write {
        match self.inner {
            Inner::Term(ref mut w) => w,
            Inner::Buf {
                output: ref mut w, ..
            } => w,
            Inner::Sink(ref mut w) => w,
        }
    }

    pub fn confirm(&mut self, message: &str, default: bool) -> io::Result<bool> {
        if self.conf.assume_yes {
            return Ok(true);
        }

        let prompt = format!("{} ({}) ", message, if default { "Y/n" } else { "y/N" });
        self.prompt(&prompt)?;
        let input = self.read_user()?;
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            _ => Ok(default),
        }
    }

    fn read_user(&mut self) -> io::Result<String> {
        match self.inner {
            Inner::Term(ref term) => term.read_line(),
            Inner::Buf { ref mut input, .. } => {
                let mut buf = String::new();
                input.read_line(&mut buf)?;
                Ok(buf)
            }
            Inner::Sink(_) => Ok(String::from("")),
        }
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        write!(self, "{}", prompt)?;
        self.flush()
    }
}

impl Write for Console {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.as_mut_write().write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.as_mut_write().flush()
    }
}

macro_rules! def_color {
    ($name:ident, $name_upper:ident, $style:expr) => {
        ::lazy_static::lazy_static! {
            static ref $name_upper: ::console::Style = {
                use ::console::Style;
                $style
            };
        }

        pub fn $name<D>(val: D) -> ::console::StyledObject<D> {
            $name_upper.apply_to(val)
        }
    };
}

pub use color_defs::*;

mod color_defs {
    def_color!(sty_g, STY_G, Style::new().green());
    def_color!(sty_dim, STY_DIM, Style::new().dim());
}
