//! The console collaborator: the kernel's output surface.
//!
//! The simulator core does not own a terminal; it writes through the
//! [`Console`] trait. Two implementations are provided:
//! 1. **[`StdoutConsole`]:** line-oriented output to the host's stdout.
//! 2. **[`BufferConsole`]:** captures output in a shared string buffer, for
//!    tests and embedders that want to inspect what programs printed.

use std::cell::RefCell;
use std::fmt::Debug;
use std::io::{self, Write};
use std::rc::Rc;

/// Output surface for program syscalls and kernel messages.
///
/// Implementors track a cursor column so the kernel can reason about where
/// the next character lands.
pub trait Console: Debug {
    /// Writes text at the cursor without a trailing newline.
    fn put_text(&mut self, text: &str);

    /// Moves the cursor to the start of the next line.
    fn advance_line(&mut self);

    /// Erases all output.
    fn clear_screen(&mut self);

    /// Returns the cursor to the top-left corner.
    fn reset_xy(&mut self);

    /// Current cursor column.
    fn current_x(&self) -> usize;
}

/// Console writing straight to the host's stdout.
#[derive(Debug, Default)]
pub struct StdoutConsole {
    x: usize,
}

impl StdoutConsole {
    /// Creates a stdout console with the cursor at column zero.
    pub const fn new() -> Self {
        Self { x: 0 }
    }
}

impl Console for StdoutConsole {
    fn put_text(&mut self, text: &str) {
        print!("{text}");
        let _ = io::stdout().flush();
        self.x += text.chars().count();
    }

    fn advance_line(&mut self) {
        println!();
        self.x = 0;
    }

    fn clear_screen(&mut self) {
        // ANSI clear + home; a real terminal is the only consumer here.
        print!("\x1B[2J\x1B[H");
        let _ = io::stdout().flush();
        self.x = 0;
    }

    fn reset_xy(&mut self) {
        self.x = 0;
    }

    fn current_x(&self) -> usize {
        self.x
    }
}

/// Console capturing output into a shared buffer.
///
/// Cloning the handle before handing the console to the kernel lets a test
/// read everything the machine printed:
///
/// ```
/// use osim_core::kernel::console::{BufferConsole, Console};
///
/// let console = BufferConsole::new();
/// let output = console.handle();
/// let mut console = console;
/// console.put_text("42");
/// assert_eq!(output.borrow().as_str(), "42");
/// ```
#[derive(Debug, Default)]
pub struct BufferConsole {
    buf: Rc<RefCell<String>>,
    x: usize,
}

impl BufferConsole {
    /// Creates an empty buffer console.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the captured output.
    pub fn handle(&self) -> Rc<RefCell<String>> {
        Rc::clone(&self.buf)
    }
}

impl Console for BufferConsole {
    fn put_text(&mut self, text: &str) {
        self.buf.borrow_mut().push_str(text);
        self.x += text.chars().count();
    }

    fn advance_line(&mut self) {
        self.buf.borrow_mut().push('\n');
        self.x = 0;
    }

    fn clear_screen(&mut self) {
        self.buf.borrow_mut().clear();
        self.x = 0;
    }

    fn reset_xy(&mut self) {
        self.x = 0;
    }

    fn current_x(&self) -> usize {
        self.x
    }
}
